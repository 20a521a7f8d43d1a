use log::{debug, error};
use serde_json::Value;

use crate::error::Error;
use crate::jwt::{decode_jwt_payload, Claims, TokenVerifier};

use super::constants::{
    GrantType, CLAIM_CLIENT_ID, CLAIM_GRANT_TYPE, CLAIM_SCOPE, CLAIM_SUB, USER_ATTRIBUTE_GROUPS,
};
use super::model::OAuthAppConfig;
use super::providers::{ApplicationProvider, UserProvider};
use super::utils::{build_oidc_claims_from_scopes, fetch_user_attributes_and_groups, parse_scopes};

/// Backs the OIDC UserInfo endpoint.
#[derive(Debug, Clone)]
pub struct UserInfoService<V, A, U> {
    verifier: V,
    applications: A,
    users: U,
}

impl<V, A, U> UserInfoService<V, A, U>
where
    V: TokenVerifier,
    A: ApplicationProvider,
    U: UserProvider,
{
    pub fn new(verifier: V, applications: A, users: U) -> Self {
        Self {
            verifier,
            applications,
            users,
        }
    }

    /// Returns `sub` plus the claims the access token's scopes disclose.
    pub fn get_user_info(&self, access_token: &str) -> Result<Claims, Error> {
        if access_token.is_empty() {
            return Err(Error::InvalidAccessToken);
        }
        if let Err(err) = self.verifier.verify_jwt(access_token, "", "") {
            debug!("userinfo access token rejected: {}", err);
            return Err(Error::InvalidAccessToken);
        }
        let claims = decode_jwt_payload(access_token).map_err(|err| {
            debug!("userinfo access token undecodable: {}", err);
            Error::InvalidAccessToken
        })?;

        let sub = match claims.get(CLAIM_SUB).and_then(Value::as_str) {
            Some(sub) if !sub.is_empty() => sub.to_string(),
            _ => return Err(Error::MissingClaim(CLAIM_SUB.to_string())),
        };
        let grant_type = claims.get(CLAIM_GRANT_TYPE).and_then(Value::as_str);
        if grant_type.and_then(GrantType::parse) == Some(GrantType::ClientCredentials) {
            debug!("userinfo called with a client_credentials token; sub={}", sub);
            return Err(Error::ClientCredentialsToken);
        }

        let scopes = claims
            .get(CLAIM_SCOPE)
            .and_then(Value::as_str)
            .map(parse_scopes)
            .unwrap_or_default();
        let mut response = Claims::new();
        response.insert(CLAIM_SUB.to_string(), Value::from(sub.as_str()));
        if scopes.is_empty() {
            return Ok(response);
        }

        let app = self.oauth_app(&claims);
        let include_groups = app.as_ref().is_some_and(|app| {
            app.id_token_user_attributes()
                .iter()
                .any(|name| name == USER_ATTRIBUTE_GROUPS)
        });
        let (mut attributes, groups) =
            fetch_user_attributes_and_groups(&self.users, &sub, include_groups).map_err(|err| {
                error!("failed to fetch user attributes; user_id={}: {}", sub, err);
                err
            })?;
        if include_groups && !groups.is_empty() {
            attributes.insert(USER_ATTRIBUTE_GROUPS.to_string(), Value::from(groups));
        }

        for (name, value) in build_oidc_claims_from_scopes(&scopes, &attributes, app.as_ref()) {
            response.insert(name, value);
        }
        Ok(response)
    }

    fn oauth_app(&self, claims: &Claims) -> Option<OAuthAppConfig> {
        let client_id = claims
            .get(CLAIM_CLIENT_ID)
            .and_then(Value::as_str)
            .filter(|client_id| !client_id.is_empty())?;
        match self.applications.get_oauth_app(client_id) {
            Ok(app) => Some(app),
            Err(err) => {
                debug!("userinfo without application config; client_id={}: {}", client_id, err);
                None
            }
        }
    }
}
