use log::debug;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::jwt::{numeric_value, Claims};

use super::constants::{
    standard_oidc_scope, CLAIM_AUTHORIZED_PERMISSIONS, CLAIM_SCOPE, DEFAULT_GROUP_LIST_LIMIT,
    STANDARD_JWT_CLAIMS,
};
use super::model::{OAuthAppConfig, TokenConfig, TokenDefaults, TokenType};
use super::providers::UserProvider;

/// Splits a space separated scope string, dropping empty entries.
pub fn parse_scopes(scope: &str) -> Vec<String> {
    scope
        .trim()
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_scopes(scopes: &[String]) -> String {
    scopes.join(" ")
}

/// Issuer and validity for `token_type`, with application overrides applied
/// over `defaults`.
pub fn resolve_token_config(
    app: Option<&OAuthAppConfig>,
    token_type: TokenType,
    defaults: &TokenDefaults,
) -> TokenConfig {
    let mut config = TokenConfig {
        issuer: defaults.issuer.clone(),
        validity_period: defaults.validity_period,
    };
    if let Some(issuer) = app.and_then(OAuthAppConfig::token_issuer) {
        config.issuer = issuer.to_string();
    }

    match token_type {
        TokenType::Access => {
            if let Some(access) = app.and_then(OAuthAppConfig::access_token_config) {
                if !access.issuer.is_empty() {
                    config.issuer = access.issuer.clone();
                }
                if access.validity_period > 0 {
                    config.validity_period = access.validity_period;
                }
            }
        }
        TokenType::Id => {
            if let Some(id_token) = app.and_then(OAuthAppConfig::id_token_config) {
                if id_token.validity_period > 0 {
                    config.validity_period = id_token.validity_period;
                }
            }
        }
        TokenType::Refresh => {
            if defaults.refresh_validity_period > 0 {
                config.validity_period = defaults.refresh_validity_period;
            }
        }
    }
    config
}

/// Issuers whose tokens the engine signed itself: the access token issuer
/// resolved for `app` and the application (or global) issuer.
pub fn trusted_issuers(app: Option<&OAuthAppConfig>, defaults: &TokenDefaults) -> BTreeSet<String> {
    let mut issuers = BTreeSet::new();
    issuers.insert(resolve_token_config(app, TokenType::Access, defaults).issuer);
    issuers.insert(resolve_token_config(app, TokenType::Id, defaults).issuer);
    issuers
}

pub fn extract_string_claim(claims: &Claims, name: &str) -> Result<String, Error> {
    match claims.get(name) {
        None => Err(Error::MissingClaim(name.to_string())),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(Error::InvalidClaimType(name.to_string())),
    }
}

pub fn extract_i64_claim(claims: &Claims, name: &str) -> Result<i64, Error> {
    let value = claims
        .get(name)
        .ok_or_else(|| Error::MissingClaim(name.to_string()))?;
    numeric_value(value).ok_or_else(|| Error::InvalidClaimType(name.to_string()))
}

/// Scopes from `scope`, or from `authorized_permissions` for auth
/// assertions that carry no usable `scope`.
pub fn extract_scopes_from_claims(claims: &Claims, is_auth_assertion: bool) -> Vec<String> {
    let non_empty = |name: &str| {
        claims
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(parse_scopes)
    };
    if let Some(scopes) = non_empty(CLAIM_SCOPE) {
        return scopes;
    }
    if is_auth_assertion {
        if let Some(scopes) = non_empty(CLAIM_AUTHORIZED_PERMISSIONS) {
            return scopes;
        }
    }
    Vec::new()
}

/// First non-empty of the requested audience, the resource indicator, the
/// subject token audience and the default.
pub fn determine_audience<'a>(
    audience: &'a str,
    resource: &'a str,
    token_aud: &'a str,
    default_audience: &'a str,
) -> &'a str {
    [audience, resource, token_aud]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(default_audience)
}

/// Every claim that is not a registered JWT claim.
pub fn extract_user_attributes(claims: &Claims) -> Claims {
    claims
        .iter()
        .filter(|(name, _)| !STANDARD_JWT_CLAIMS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Claims disclosed for `scopes`. A claim is included only when the scope
/// maps to it (application override first, then the standard OIDC table),
/// the application's ID token allow-list names it, and the user has a
/// non-null value for it.
pub fn build_oidc_claims_from_scopes(
    scopes: &[String],
    user_attributes: &Claims,
    app: Option<&OAuthAppConfig>,
) -> Claims {
    let mut claims = Claims::new();
    let Some(id_token) = app.and_then(OAuthAppConfig::id_token_config) else {
        return claims;
    };
    let allowed = &id_token.user_attributes;
    if allowed.is_empty() || user_attributes.is_empty() || scopes.is_empty() {
        return claims;
    }

    for scope in scopes {
        let scope_claims: Vec<&str> = match id_token.scope_claims.get(scope) {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => standard_oidc_scope(scope)
                .map(|standard| standard.claims.to_vec())
                .unwrap_or_default(),
        };
        for name in scope_claims {
            if !allowed.iter().any(|allowed| allowed == name) {
                continue;
            }
            match user_attributes.get(name) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    claims.insert(name.to_string(), value.clone());
                }
            }
        }
    }
    claims
}

/// Loads the user's attribute document and, when asked, the first page of
/// group names.
pub fn fetch_user_attributes_and_groups<U: UserProvider + ?Sized>(
    users: &U,
    user_id: &str,
    include_groups: bool,
) -> Result<(Claims, Vec<String>), Error> {
    let user = users
        .get_user(user_id)
        .map_err(|err| Error::UserLookup(format!("failed to fetch user: {err}")))?;

    let attributes = match user.attributes.as_deref() {
        // A JSON `null` document means no attributes.
        Some(raw) => serde_json::from_slice::<Option<Claims>>(raw)
            .map_err(|err| {
                Error::UserLookup(format!("failed to unmarshal user attributes: {err}"))
            })?
            .unwrap_or_default(),
        None => Claims::new(),
    };

    if !include_groups {
        return Ok((attributes, Vec::new()));
    }

    let groups = users
        .get_user_groups(user_id, DEFAULT_GROUP_LIST_LIMIT, 0)
        .map_err(|err| Error::UserLookup(format!("failed to fetch user groups: {err}")))?;
    debug!(
        "loaded user attributes; user_id={}, attributes={}, groups={}",
        user_id,
        attributes.len(),
        groups.len()
    );
    Ok((attributes, groups))
}
