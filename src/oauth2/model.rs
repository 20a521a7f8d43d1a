use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::config::{EngineConfig, DEFAULT_ISSUER, DEFAULT_VALIDITY_PERIOD};
use crate::jwt::Claims;

use super::constants::{CLAIM_OU_HANDLE, CLAIM_OU_ID, CLAIM_OU_NAME, CLAIM_USER_TYPE};

/// Per-application token settings, owned by the application store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthAppConfig {
    pub app_id: String,
    pub client_id: String,
    pub token: Option<OAuthTokenConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthTokenConfig {
    /// Issuer for every token type minted for the application.
    pub issuer: String,
    pub access_token: Option<AccessTokenConfig>,
    pub id_token: Option<IdTokenConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessTokenConfig {
    /// Overrides [`OAuthTokenConfig::issuer`] for access tokens.
    pub issuer: String,
    pub validity_period: i64,
    /// Allow-list of user attributes. Empty passes every attribute through.
    pub user_attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdTokenConfig {
    pub validity_period: i64,
    /// Allow-list of user attributes. Empty discloses nothing.
    pub user_attributes: Vec<String>,
    /// Scope to claim-name overrides, consulted before the standard table.
    pub scope_claims: HashMap<String, Vec<String>>,
}

impl OAuthAppConfig {
    pub fn token_issuer(&self) -> Option<&str> {
        self.token
            .as_ref()
            .map(|token| token.issuer.as_str())
            .filter(|issuer| !issuer.is_empty())
    }

    pub fn access_token_config(&self) -> Option<&AccessTokenConfig> {
        self.token.as_ref().and_then(|token| token.access_token.as_ref())
    }

    pub fn id_token_config(&self) -> Option<&IdTokenConfig> {
        self.token.as_ref().and_then(|token| token.id_token.as_ref())
    }

    pub fn access_token_user_attributes(&self) -> &[String] {
        self.access_token_config()
            .map(|config| config.user_attributes.as_slice())
            .unwrap_or_default()
    }

    pub fn id_token_user_attributes(&self) -> &[String] {
        self.id_token_config()
            .map(|config| config.user_attributes.as_slice())
            .unwrap_or_default()
    }
}

/// User type and organization unit of the token subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityStamp {
    pub user_type: String,
    pub ou_id: String,
    pub ou_name: String,
    pub ou_handle: String,
}

impl IdentityStamp {
    pub fn is_empty(&self) -> bool {
        self.user_type.is_empty()
            && self.ou_id.is_empty()
            && self.ou_name.is_empty()
            && self.ou_handle.is_empty()
    }

    /// Writes the non-empty fields under their claim names.
    pub(crate) fn stamp(&self, claims: &mut Claims) {
        let fields = [
            (CLAIM_USER_TYPE, &self.user_type),
            (CLAIM_OU_ID, &self.ou_id),
            (CLAIM_OU_NAME, &self.ou_name),
            (CLAIM_OU_HANDLE, &self.ou_handle),
        ];
        for (name, value) in fields {
            if !value.is_empty() {
                claims.insert(name.to_string(), Value::from(value.as_str()));
            }
        }
    }
}

/// A minted token and the facts a grant handler needs to answer with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenDto {
    pub token: String,
    /// `Bearer` for access tokens, empty otherwise.
    pub token_type: String,
    pub issued_at: i64,
    pub expires_in: i64,
    pub scopes: Vec<String>,
    pub client_id: String,
    pub subject: String,
    pub audience: String,
    pub user_attributes: Claims,
    pub identity: IdentityStamp,
}

#[derive(Debug, Clone, Default)]
pub struct AccessTokenBuildContext<'a> {
    pub subject: String,
    pub audience: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub user_attributes: Claims,
    pub user_groups: Vec<String>,
    pub grant_type: String,
    pub oauth_app: Option<&'a OAuthAppConfig>,
    /// Subject token of a token exchange; becomes the `act` claim.
    pub actor_claims: Option<&'a SubjectTokenClaims>,
    pub identity: IdentityStamp,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshTokenBuildContext<'a> {
    pub client_id: String,
    pub scopes: Vec<String>,
    pub grant_type: String,
    pub access_token_subject: String,
    pub access_token_audience: String,
    pub access_token_user_attributes: Claims,
    pub oauth_app: Option<&'a OAuthAppConfig>,
    pub identity: IdentityStamp,
}

#[derive(Debug, Clone, Default)]
pub struct IdTokenBuildContext<'a> {
    pub subject: String,
    pub audience: String,
    pub scopes: Vec<String>,
    pub user_attributes: Claims,
    /// Unix time of the end-user authentication; omitted when not positive.
    pub auth_time: i64,
    pub oauth_app: Option<&'a OAuthAppConfig>,
    pub identity: IdentityStamp,
}

/// Claims of a validated token-exchange subject (or actor) token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectTokenClaims {
    pub sub: String,
    pub iss: String,
    /// Empty when the token carries no string `aud`.
    pub aud: String,
    pub scopes: Vec<String>,
    pub user_attributes: Claims,
    pub nested_act: Option<Claims>,
}

/// What a refresh token carries over from the access token it accompanied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub aud: String,
    pub grant_type: String,
    pub scopes: Vec<String>,
    pub user_attributes: Claims,
    /// Zero when the token has no `iat`.
    pub iat: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
    Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub issuer: String,
    pub validity_period: i64,
}

/// Engine-wide fallbacks used when an application does not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDefaults {
    pub issuer: String,
    pub validity_period: i64,
    pub refresh_validity_period: i64,
}

impl TokenDefaults {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            issuer: if config.jwt.issuer.is_empty() {
                DEFAULT_ISSUER.to_string()
            } else {
                config.jwt.issuer.clone()
            },
            validity_period: if config.jwt.validity_period > 0 {
                config.jwt.validity_period
            } else {
                DEFAULT_VALIDITY_PERIOD
            },
            refresh_validity_period: config.oauth.refresh_token.validity_period,
        }
    }
}

impl Default for TokenDefaults {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
