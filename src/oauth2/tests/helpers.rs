use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::EngineConfig;
use crate::error::Error;
use crate::jwt::{encode_signing_input, sign, Claims, JwtService, TokenSigner, TokenVerifier};
use crate::keys::PrivateKey;
use crate::oauth2::{OAuthAppConfig, TokenDefaults, UserProvider, UserRecord};
use crate::test_support::{random_ec_and_ed_keys, single_key_provider};

pub(super) const ISSUER: &str = "https://idp.example.com";

pub(super) fn defaults() -> TokenDefaults {
    TokenDefaults {
        issuer: ISSUER.to_string(),
        validity_period: 3600,
        refresh_validity_period: 86400,
    }
}

pub(super) struct Engine {
    pub(super) key: PrivateKey,
    pub(super) service: JwtService,
}

pub(super) fn engine() -> Engine {
    let key = random_ec_and_ed_keys().remove(0);
    let mut config = EngineConfig::default();
    config.jwt.issuer = ISSUER.to_string();
    let provider = single_key_provider(&config.jwt.preferred_key_id, key.clone());
    let service = JwtService::new(&provider, &config).expect("service");
    Engine { key, service }
}

impl Engine {
    /// Signs `payload` verbatim with the engine key.
    pub(super) fn sign_raw(&self, payload: Value) -> String {
        let header = claims(json!({
            "alg": self.service.algorithm().as_str(),
            "typ": "JWT",
            "kid": self.service.kid(),
        }));
        let signing_input =
            encode_signing_input(&header, &claims(payload)).expect("signing input");
        let signature =
            sign(signing_input.as_bytes(), self.key.sign_algorithm(), &self.key).expect("sign");
        format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
    }
}

pub(super) fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        other => panic!("claims must be an object: {other}"),
    }
}

pub(super) fn payload_of(token: &str) -> Claims {
    crate::jwt::decode_jwt_payload(token).expect("payload")
}

pub(super) fn app(value: Value) -> OAuthAppConfig {
    serde_json::from_value(value).expect("app config")
}

/// Counts verifier calls made through the trait.
pub(super) struct CountingVerifier<'a> {
    pub(super) inner: &'a JwtService,
    pub(super) verify_calls: AtomicUsize,
    pub(super) signature_calls: AtomicUsize,
}

impl<'a> CountingVerifier<'a> {
    pub(super) fn new(inner: &'a JwtService) -> Self {
        Self {
            inner,
            verify_calls: AtomicUsize::new(0),
            signature_calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst) + self.signature_calls.load(Ordering::SeqCst)
    }
}

impl TokenVerifier for CountingVerifier<'_> {
    fn verify_jwt(&self, token: &str, expected_aud: &str, expected_iss: &str) -> Result<(), Error> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify_jwt(token, expected_aud, expected_iss)
    }

    fn verify_jwt_signature(&self, token: &str) -> Result<(), Error> {
        self.signature_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify_jwt_signature(token)
    }
}

pub(super) struct FailingSigner;

impl TokenSigner for FailingSigner {
    fn generate_jwt(
        &self,
        _sub: &str,
        _aud: &str,
        _iss: &str,
        _validity_period: i64,
        _claims: &Claims,
    ) -> Result<(String, i64), Error> {
        Err(Error::Signing("hsm unavailable".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MockUsers {
    pub(super) attributes: Option<Value>,
    pub(super) groups: Vec<String>,
    pub(super) fail_user: bool,
    pub(super) fail_groups: bool,
    pub(super) group_requests: Mutex<Vec<(String, usize, usize)>>,
    pub(super) user_requests: AtomicUsize,
}

impl MockUsers {
    pub(super) fn with_attributes(attributes: Value) -> Self {
        Self {
            attributes: Some(attributes),
            ..Self::default()
        }
    }
}

impl UserProvider for MockUsers {
    fn get_user(&self, user_id: &str) -> Result<UserRecord, Error> {
        self.user_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_user {
            return Err(Error::UserLookup(format!("user {user_id} not found")));
        }
        Ok(UserRecord {
            id: user_id.to_string(),
            attributes: self
                .attributes
                .as_ref()
                .map(|value| serde_json::to_vec(value).expect("attributes json")),
        })
    }

    fn get_user_groups(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<String>, Error> {
        self.group_requests
            .lock()
            .expect("lock")
            .push((user_id.to_string(), limit, offset));
        if self.fail_groups {
            return Err(Error::UserLookup("group store offline".to_string()));
        }
        Ok(self.groups.clone())
    }
}
