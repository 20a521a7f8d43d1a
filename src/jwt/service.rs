use crate::config::{EngineConfig, DEFAULT_ISSUER, DEFAULT_VALIDITY_PERIOD};
use crate::error::Error;
use crate::keys::{resolve_signing_key, JwsAlgorithm, KeyProvider, PublicKey, ResolvedKey};
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::claims::{unix_time_now, validate_claims};
use super::codec::{
    base64_url_encode, decode_jwt_header, decode_jwt_payload, encode_signing_input, split_jwt,
    Claims,
};
use super::jwk::{jwk_to_public_key, public_key_to_jwk, Jwk, JwkSet};
use super::jwks::{fetch_jwks, select_jwk, DEFAULT_JWKS_TIMEOUT};
use super::sign::{sign, verify};

/// Mints signed JWTs.
pub trait TokenSigner {
    /// Returns the token and its `iat`. An empty issuer or a non-positive
    /// validity period falls back to the engine defaults.
    fn generate_jwt(
        &self,
        sub: &str,
        aud: &str,
        iss: &str,
        validity_period: i64,
        claims: &Claims,
    ) -> Result<(String, i64), Error>;
}

/// Verifies JWTs signed with the engine's own key.
pub trait TokenVerifier {
    fn verify_jwt(&self, token: &str, expected_aud: &str, expected_iss: &str) -> Result<(), Error>;

    fn verify_jwt_signature(&self, token: &str) -> Result<(), Error>;
}

/// Token engine bound to a single signing key. Immutable after construction
/// and safe to share between threads.
#[derive(Debug, Clone)]
pub struct JwtService {
    key: ResolvedKey,
    public_key: PublicKey,
    published: Vec<Jwk>,
    issuer: String,
    validity_period: i64,
    jwks_timeout: Duration,
}

impl JwtService {
    /// Resolves the configured preferred key from `provider`. Fails when the
    /// key cannot be resolved; such failures are fatal at startup.
    pub fn new(provider: &dyn KeyProvider, config: &EngineConfig) -> Result<Self, Error> {
        let key_id = config.jwt.preferred_key_id.as_str();
        let key = resolve_signing_key(provider, key_id)?;
        let public_key = key.public_key();
        let published = published_jwks(provider, key_id, &key.kid, &public_key);
        debug!(
            "jwt service ready; key_id={}, kid={}, alg={}",
            key_id, key.kid, key.jws_alg
        );
        Ok(Self {
            key,
            public_key,
            published,
            issuer: non_empty_or(&config.jwt.issuer, DEFAULT_ISSUER),
            validity_period: positive_or(config.jwt.validity_period, DEFAULT_VALIDITY_PERIOD),
            jwks_timeout: match config.jwks.timeout_secs {
                0 => DEFAULT_JWKS_TIMEOUT,
                _ => config.jwks.timeout(),
            },
        })
    }

    pub fn with_jwks_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_timeout = timeout;
        self
    }

    pub fn kid(&self) -> &str {
        &self.key.kid
    }

    pub fn algorithm(&self) -> JwsAlgorithm {
        self.key.jws_alg
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn validity_period(&self) -> i64 {
        self.validity_period
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The signing key's JWK.
    pub fn public_jwk(&self) -> Jwk {
        self.published[0].clone()
    }

    /// Every key the provider holds, signing key first, so tokens signed
    /// before a rotation still find their key.
    pub fn public_jwks(&self) -> JwkSet {
        JwkSet {
            keys: self.published.clone(),
        }
    }

    pub fn generate_jwt(
        &self,
        sub: &str,
        aud: &str,
        iss: &str,
        validity_period: i64,
        claims: &Claims,
    ) -> Result<(String, i64), Error> {
        self.generate_jwt_at(sub, aud, iss, validity_period, claims, unix_time_now())
    }

    pub(crate) fn generate_jwt_at(
        &self,
        sub: &str,
        aud: &str,
        iss: &str,
        validity_period: i64,
        claims: &Claims,
        now: i64,
    ) -> Result<(String, i64), Error> {
        let iss = if iss.is_empty() { self.issuer.as_str() } else { iss };
        let validity_period = positive_or(validity_period, self.validity_period);
        let exp = now.checked_add(validity_period).ok_or_else(|| {
            Error::Config(format!(
                "validity period {validity_period} overflows the token expiry"
            ))
        })?;

        let mut header = Claims::new();
        header.insert("alg".to_string(), Value::from(self.key.jws_alg.as_str()));
        header.insert("typ".to_string(), Value::from("JWT"));
        header.insert("kid".to_string(), Value::from(self.key.kid.as_str()));

        let mut payload = Claims::new();
        payload.insert("sub".to_string(), Value::from(sub));
        payload.insert("iss".to_string(), Value::from(iss));
        payload.insert("aud".to_string(), Value::from(aud));
        payload.insert("exp".to_string(), Value::from(exp));
        payload.insert("iat".to_string(), Value::from(now));
        payload.insert("nbf".to_string(), Value::from(now));
        payload.insert("jti".to_string(), Value::from(Uuid::new_v4().to_string()));
        // Caller claims win over the standard ones.
        for (name, value) in claims {
            payload.insert(name.clone(), value.clone());
        }

        let signing_input = encode_signing_input(&header, &payload)?;
        let signature = sign(
            signing_input.as_bytes(),
            self.key.sign_alg,
            self.key.private_key(),
        )?;
        let token = format!("{}.{}", signing_input, base64_url_encode(&signature));
        Ok((token, now))
    }

    /// Signature check against the engine's own key followed by claim
    /// validation. Signature-phase failures other than a malformed token
    /// surface as [`Error::InvalidTokenSignature`].
    pub fn verify_jwt(&self, token: &str, expected_aud: &str, expected_iss: &str) -> Result<(), Error> {
        self.verify_jwt_signature(token)
            .map_err(collapse_signature_error)?;
        let payload = decode_jwt_payload(token)?;
        validate_claims(&payload, expected_aud, expected_iss)
    }

    pub fn verify_jwt_with_public_key(
        &self,
        token: &str,
        public_key: &PublicKey,
        expected_aud: &str,
        expected_iss: &str,
    ) -> Result<(), Error> {
        self.verify_jwt_signature_with_public_key(token, public_key)
            .map_err(collapse_signature_error)?;
        let payload = decode_jwt_payload(token)?;
        validate_claims(&payload, expected_aud, expected_iss)
    }

    pub fn verify_jwt_with_jwks(
        &self,
        token: &str,
        jwks_url: &str,
        expected_aud: &str,
        expected_iss: &str,
    ) -> Result<(), Error> {
        self.verify_jwt_signature_with_jwks(token, jwks_url)
            .map_err(collapse_signature_error)?;
        let payload = decode_jwt_payload(token)?;
        validate_claims(&payload, expected_aud, expected_iss)
    }

    /// Verifies with the engine's own key and algorithm without looking at
    /// the token header.
    pub fn verify_jwt_signature(&self, token: &str) -> Result<(), Error> {
        let parts = split_jwt(token)?;
        let signature = parts.signature_bytes()?;
        verify(
            parts.signing_input().as_bytes(),
            &signature,
            self.key.sign_alg,
            &self.public_key,
        )
    }

    /// Verifies against a caller-supplied key using the header `alg`.
    pub fn verify_jwt_signature_with_public_key(
        &self,
        token: &str,
        public_key: &PublicKey,
    ) -> Result<(), Error> {
        verify_with_header_alg(token, public_key)
    }

    /// Fetches `jwks_url`, selects the key named by the header `kid` and
    /// verifies against it. JWKS failures keep their distinct errors.
    pub fn verify_jwt_signature_with_jwks(&self, token: &str, jwks_url: &str) -> Result<(), Error> {
        let kid = header_kid(token)?;
        let keys = fetch_jwks(jwks_url, self.jwks_timeout)?;
        let jwk = select_jwk(&keys, &kid)?;
        let public_key = jwk_to_public_key(jwk)?;
        verify_with_header_alg(token, &public_key)
    }

    #[cfg(feature = "async-validate")]
    pub async fn verify_jwt_signature_with_jwks_async(
        &self,
        token: &str,
        jwks_url: &str,
    ) -> Result<(), Error> {
        let kid = header_kid(token)?;
        let keys = super::jwks::fetch_jwks_async(jwks_url, self.jwks_timeout).await?;
        let jwk = select_jwk(&keys, &kid)?;
        let public_key = jwk_to_public_key(jwk)?;
        verify_with_header_alg(token, &public_key)
    }

    #[cfg(feature = "async-validate")]
    pub async fn verify_jwt_with_jwks_async(
        &self,
        token: &str,
        jwks_url: &str,
        expected_aud: &str,
        expected_iss: &str,
    ) -> Result<(), Error> {
        self.verify_jwt_signature_with_jwks_async(token, jwks_url)
            .await
            .map_err(collapse_signature_error)?;
        let payload = decode_jwt_payload(token)?;
        validate_claims(&payload, expected_aud, expected_iss)
    }
}

fn published_jwks(
    provider: &dyn KeyProvider,
    signing_key_id: &str,
    signing_kid: &str,
    signing_public_key: &PublicKey,
) -> Vec<Jwk> {
    let mut jwks = vec![certified_jwk(
        public_key_to_jwk(signing_public_key, signing_kid),
        provider.certificate_der(signing_key_id),
    )];
    for key_id in provider.key_ids() {
        if key_id == signing_key_id {
            continue;
        }
        let key = match provider.private_key(&key_id) {
            Ok(key) => key,
            Err(err) => {
                warn!("key left out of the published set; key_id={}: {}", key_id, err);
                continue;
            }
        };
        let kid = provider.cert_thumbprint(&key_id);
        jwks.push(certified_jwk(
            public_key_to_jwk(&key.public_key(), &kid),
            provider.certificate_der(&key_id),
        ));
    }
    jwks
}

fn certified_jwk(jwk: Jwk, certificate: Option<Vec<u8>>) -> Jwk {
    match certificate {
        Some(der) => jwk.with_certificate(&der),
        None => jwk,
    }
}

fn verify_with_header_alg(token: &str, public_key: &PublicKey) -> Result<(), Error> {
    let parts = split_jwt(token)?;
    let header = decode_jwt_header(token)?;
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::UnsupportedAlgorithm(String::new()))?;
    let alg = JwsAlgorithm::from_label(alg)?;
    let signature = parts.signature_bytes()?;
    verify(
        parts.signing_input().as_bytes(),
        &signature,
        alg.sign_algorithm(),
        public_key,
    )
}

fn header_kid(token: &str) -> Result<String, Error> {
    let header = decode_jwt_header(token)?;
    header
        .get("kid")
        .and_then(Value::as_str)
        .filter(|kid| !kid.is_empty())
        .map(str::to_string)
        .ok_or(Error::MissingKeyId)
}

fn collapse_signature_error(err: Error) -> Error {
    match err {
        Error::InvalidJwtFormat => Error::InvalidJwtFormat,
        other => {
            debug!("token signature verification failed: {}", other);
            Error::InvalidTokenSignature
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn positive_or(value: i64, fallback: i64) -> i64 {
    if value > 0 {
        value
    } else {
        fallback
    }
}

impl TokenSigner for JwtService {
    fn generate_jwt(
        &self,
        sub: &str,
        aud: &str,
        iss: &str,
        validity_period: i64,
        claims: &Claims,
    ) -> Result<(String, i64), Error> {
        JwtService::generate_jwt(self, sub, aud, iss, validity_period, claims)
    }
}

impl TokenVerifier for JwtService {
    fn verify_jwt(&self, token: &str, expected_aud: &str, expected_iss: &str) -> Result<(), Error> {
        JwtService::verify_jwt(self, token, expected_aud, expected_iss)
    }

    fn verify_jwt_signature(&self, token: &str) -> Result<(), Error> {
        JwtService::verify_jwt_signature(self, token)
    }
}

impl<T: TokenSigner + ?Sized> TokenSigner for Arc<T> {
    fn generate_jwt(
        &self,
        sub: &str,
        aud: &str,
        iss: &str,
        validity_period: i64,
        claims: &Claims,
    ) -> Result<(String, i64), Error> {
        (**self).generate_jwt(sub, aud, iss, validity_period, claims)
    }
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for Arc<T> {
    fn verify_jwt(&self, token: &str, expected_aud: &str, expected_iss: &str) -> Result<(), Error> {
        (**self).verify_jwt(token, expected_aud, expected_iss)
    }

    fn verify_jwt_signature(&self, token: &str) -> Result<(), Error> {
        (**self).verify_jwt_signature(token)
    }
}

impl<T: TokenSigner + ?Sized> TokenSigner for &T {
    fn generate_jwt(
        &self,
        sub: &str,
        aud: &str,
        iss: &str,
        validity_period: i64,
        claims: &Claims,
    ) -> Result<(String, i64), Error> {
        (**self).generate_jwt(sub, aud, iss, validity_period, claims)
    }
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for &T {
    fn verify_jwt(&self, token: &str, expected_aud: &str, expected_iss: &str) -> Result<(), Error> {
        (**self).verify_jwt(token, expected_aud, expected_iss)
    }

    fn verify_jwt_signature(&self, token: &str) -> Result<(), Error> {
        (**self).verify_jwt_signature(token)
    }
}
