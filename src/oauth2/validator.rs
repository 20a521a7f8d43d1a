use log::debug;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::jwt::{decode_jwt_payload, unix_time_now, Claims, TokenVerifier};

use super::constants::{
    CLAIM_ACCESS_TOKEN_AUD, CLAIM_ACCESS_TOKEN_SUB, CLAIM_ACCESS_TOKEN_USER_ATTRIBUTES,
    CLAIM_ACT, CLAIM_AUD, CLAIM_EXP, CLAIM_GRANT_TYPE, CLAIM_IAT, CLAIM_ISS, CLAIM_NBF, CLAIM_SUB,
};
use super::model::{OAuthAppConfig, RefreshTokenClaims, SubjectTokenClaims, TokenDefaults};
use super::utils::{
    extract_i64_claim, extract_scopes_from_claims, extract_string_claim, extract_user_attributes,
    trusted_issuers,
};

/// Validates tokens presented back to the engine: token-exchange subject
/// tokens and refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenValidator<V> {
    verifier: V,
    defaults: TokenDefaults,
}

/// A subject token whose payload was read but whose signature was not
/// checked. The only way forward is [`UnverifiedToken::trust`].
struct UnverifiedToken<'t> {
    token: &'t str,
    claims: Claims,
    issuer: String,
}

/// A subject token from a trusted issuer, ready for signature verification.
struct TrustedToken<'t> {
    token: &'t str,
    claims: Claims,
    issuer: String,
}

fn peek_issuer(token: &str) -> Result<UnverifiedToken<'_>, Error> {
    let claims = decode_jwt_payload(token)?;
    let issuer =
        extract_string_claim(&claims, CLAIM_ISS).map_err(|_| Error::MissingClaim(CLAIM_ISS.to_string()))?;
    Ok(UnverifiedToken {
        token,
        claims,
        issuer,
    })
}

impl<'t> UnverifiedToken<'t> {
    fn trust(self, trusted: &BTreeSet<String>) -> Result<TrustedToken<'t>, Error> {
        if !trusted.contains(&self.issuer) {
            debug!("subject token rejected; untrusted iss={}", self.issuer);
            return Err(Error::IssuerNotSupported(self.issuer));
        }
        Ok(TrustedToken {
            token: self.token,
            claims: self.claims,
            issuer: self.issuer,
        })
    }
}

impl TrustedToken<'_> {
    fn verify_if_trusted<V: TokenVerifier>(self, verifier: &V) -> Result<(Claims, String), Error> {
        verifier
            .verify_jwt_signature(self.token)
            .map_err(|err| Error::InvalidSubjectTokenSignature(Box::new(err)))?;
        Ok((self.claims, self.issuer))
    }
}

impl<V: TokenVerifier> TokenValidator<V> {
    pub fn new(verifier: V, defaults: TokenDefaults) -> Self {
        Self { verifier, defaults }
    }

    /// Validates a token-exchange subject or actor token. The issuer must be
    /// one the engine signs for; any other issuer fails before the signature
    /// is looked at.
    pub fn validate_subject_token(
        &self,
        token: &str,
        app: Option<&OAuthAppConfig>,
    ) -> Result<SubjectTokenClaims, Error> {
        let trusted = trusted_issuers(app, &self.defaults);
        let (claims, iss) = peek_issuer(token)?
            .trust(&trusted)?
            .verify_if_trusted(&self.verifier)?;

        let sub = extract_string_claim(&claims, CLAIM_SUB)?;
        if sub.is_empty() {
            return Err(Error::MissingClaim(CLAIM_SUB.to_string()));
        }
        validate_subject_time_claims(&claims, unix_time_now())?;

        let scopes = extract_scopes_from_claims(&claims, true);
        let user_attributes = extract_user_attributes(&claims);
        let aud = extract_string_claim(&claims, CLAIM_AUD).unwrap_or_default();
        let nested_act = claims.get(CLAIM_ACT).and_then(Value::as_object).cloned();

        Ok(SubjectTokenClaims {
            sub,
            iss,
            aud,
            scopes,
            user_attributes,
            nested_act,
        })
    }

    /// Validates a refresh token presented by `client_id` and returns what it
    /// carries over from the original access token.
    pub fn validate_refresh_token(
        &self,
        token: &str,
        client_id: &str,
    ) -> Result<RefreshTokenClaims, Error> {
        self.verifier
            .verify_jwt(token, "", "")
            .map_err(|err| Error::InvalidRefreshToken(Box::new(err)))?;
        let claims = decode_jwt_payload(token)?;

        let sub = extract_string_claim(&claims, CLAIM_SUB)?;
        if sub != client_id {
            debug!(
                "refresh token presented by another client; sub={}, client_id={}",
                sub, client_id
            );
            return Err(Error::RefreshTokenClientMismatch);
        }
        let access_token_sub = extract_string_claim(&claims, CLAIM_ACCESS_TOKEN_SUB)?;
        let access_token_aud = extract_string_claim(&claims, CLAIM_ACCESS_TOKEN_AUD)?;
        let grant_type = extract_string_claim(&claims, CLAIM_GRANT_TYPE)?;

        Ok(RefreshTokenClaims {
            sub: access_token_sub,
            aud: access_token_aud,
            grant_type,
            scopes: extract_scopes_from_claims(&claims, false),
            user_attributes: claims
                .get(CLAIM_ACCESS_TOKEN_USER_ATTRIBUTES)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            iat: extract_i64_claim(&claims, CLAIM_IAT).unwrap_or(0),
        })
    }
}

/// `exp` is mandatory and exclusive; `nbf` is honoured only when numeric.
pub(crate) fn validate_subject_time_claims(claims: &Claims, now: i64) -> Result<(), Error> {
    let exp = extract_i64_claim(claims, CLAIM_EXP)?;
    if now >= exp {
        return Err(Error::TokenExpired);
    }
    if let Ok(nbf) = extract_i64_claim(claims, CLAIM_NBF) {
        if now < nbf {
            return Err(Error::TokenNotYetValid);
        }
    }
    Ok(())
}
