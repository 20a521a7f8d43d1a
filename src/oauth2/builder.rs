use log::debug;
use serde_json::Value;

use crate::error::Error;
use crate::jwt::{Claims, TokenSigner};

use super::constants::{
    CLAIM_ACCESS_TOKEN_AUD, CLAIM_ACCESS_TOKEN_SUB, CLAIM_ACCESS_TOKEN_USER_ATTRIBUTES,
    CLAIM_ACT, CLAIM_AUTH_TIME, CLAIM_CLIENT_ID, CLAIM_GRANT_TYPE, CLAIM_ISS, CLAIM_SCOPE,
    CLAIM_SUB, TOKEN_TYPE_BEARER, USER_ATTRIBUTE_GROUPS,
};
use super::model::{
    AccessTokenBuildContext, IdTokenBuildContext, OAuthAppConfig, RefreshTokenBuildContext,
    SubjectTokenClaims, TokenDefaults, TokenDto, TokenType,
};
use super::utils::{build_oidc_claims_from_scopes, join_scopes, resolve_token_config};

/// Assembles and signs OAuth2 access, refresh and ID tokens.
#[derive(Debug, Clone)]
pub struct TokenBuilder<S> {
    signer: S,
    defaults: TokenDefaults,
}

impl<S: TokenSigner> TokenBuilder<S> {
    pub fn new(signer: S, defaults: TokenDefaults) -> Self {
        Self { signer, defaults }
    }

    pub fn defaults(&self) -> &TokenDefaults {
        &self.defaults
    }

    pub fn build_access_token(&self, ctx: &AccessTokenBuildContext<'_>) -> Result<TokenDto, Error> {
        let config = resolve_token_config(ctx.oauth_app, TokenType::Access, &self.defaults);
        let user_attributes =
            access_token_user_attributes(&ctx.user_attributes, &ctx.user_groups, ctx.oauth_app);

        let mut claims = Claims::new();
        if !ctx.scopes.is_empty() {
            claims.insert(CLAIM_SCOPE.to_string(), Value::from(join_scopes(&ctx.scopes)));
        }
        if !ctx.client_id.is_empty() {
            claims.insert(CLAIM_CLIENT_ID.to_string(), Value::from(ctx.client_id.as_str()));
        }
        if !ctx.grant_type.is_empty() {
            claims.insert(CLAIM_GRANT_TYPE.to_string(), Value::from(ctx.grant_type.as_str()));
        }
        for (name, value) in &user_attributes {
            claims.insert(name.clone(), value.clone());
        }
        if let Some(actor) = ctx.actor_claims {
            claims.insert(CLAIM_ACT.to_string(), Value::Object(actor_claim(actor)));
        }
        ctx.identity.stamp(&mut claims);

        let (token, issued_at) = self.sign(
            "access",
            &ctx.subject,
            &ctx.audience,
            &config.issuer,
            config.validity_period,
            &claims,
        )?;
        Ok(TokenDto {
            token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            issued_at,
            expires_in: config.validity_period,
            scopes: ctx.scopes.clone(),
            client_id: ctx.client_id.clone(),
            subject: ctx.subject.clone(),
            audience: ctx.audience.clone(),
            user_attributes,
            identity: ctx.identity.clone(),
        })
    }

    /// Refresh tokens are bound to the client: `sub` and `aud` are both the
    /// client id.
    pub fn build_refresh_token(
        &self,
        ctx: &RefreshTokenBuildContext<'_>,
    ) -> Result<TokenDto, Error> {
        let config = resolve_token_config(ctx.oauth_app, TokenType::Refresh, &self.defaults);

        let mut claims = Claims::new();
        if !ctx.scopes.is_empty() {
            claims.insert(CLAIM_SCOPE.to_string(), Value::from(join_scopes(&ctx.scopes)));
        }
        claims.insert(
            CLAIM_ACCESS_TOKEN_SUB.to_string(),
            Value::from(ctx.access_token_subject.as_str()),
        );
        claims.insert(
            CLAIM_ACCESS_TOKEN_AUD.to_string(),
            Value::from(ctx.access_token_audience.as_str()),
        );
        claims.insert(CLAIM_GRANT_TYPE.to_string(), Value::from(ctx.grant_type.as_str()));
        let filtered = ctx
            .oauth_app
            .is_some_and(|app| !app.access_token_user_attributes().is_empty());
        if filtered && !ctx.access_token_user_attributes.is_empty() {
            claims.insert(
                CLAIM_ACCESS_TOKEN_USER_ATTRIBUTES.to_string(),
                Value::Object(ctx.access_token_user_attributes.clone()),
            );
        }
        ctx.identity.stamp(&mut claims);

        let (token, issued_at) = self.sign(
            "refresh",
            &ctx.client_id,
            &ctx.client_id,
            &config.issuer,
            config.validity_period,
            &claims,
        )?;
        Ok(TokenDto {
            token,
            issued_at,
            expires_in: config.validity_period,
            scopes: ctx.scopes.clone(),
            client_id: ctx.client_id.clone(),
            subject: ctx.access_token_subject.clone(),
            audience: ctx.access_token_audience.clone(),
            identity: ctx.identity.clone(),
            ..TokenDto::default()
        })
    }

    pub fn build_id_token(&self, ctx: &IdTokenBuildContext<'_>) -> Result<TokenDto, Error> {
        let config = resolve_token_config(ctx.oauth_app, TokenType::Id, &self.defaults);

        let mut claims = Claims::new();
        if ctx.auth_time > 0 {
            claims.insert(CLAIM_AUTH_TIME.to_string(), Value::from(ctx.auth_time));
        }
        let disclosed = build_oidc_claims_from_scopes(&ctx.scopes, &ctx.user_attributes, ctx.oauth_app);
        for (name, value) in disclosed {
            claims.insert(name, value);
        }
        ctx.identity.stamp(&mut claims);

        let (token, issued_at) = self.sign(
            "ID",
            &ctx.subject,
            &ctx.audience,
            &config.issuer,
            config.validity_period,
            &claims,
        )?;
        Ok(TokenDto {
            token,
            issued_at,
            expires_in: config.validity_period,
            scopes: ctx.scopes.clone(),
            client_id: ctx.audience.clone(),
            subject: ctx.subject.clone(),
            audience: ctx.audience.clone(),
            identity: ctx.identity.clone(),
            ..TokenDto::default()
        })
    }

    fn sign(
        &self,
        kind: &'static str,
        sub: &str,
        aud: &str,
        iss: &str,
        validity_period: i64,
        claims: &Claims,
    ) -> Result<(String, i64), Error> {
        self.signer
            .generate_jwt(sub, aud, iss, validity_period, claims)
            .map_err(|err| {
                debug!("token generation failed; type={}, sub={}: {}", kind, sub, err);
                Error::TokenGeneration {
                    token: kind,
                    source: Box::new(err),
                }
            })
    }
}

/// Attributes exposed in an access token. Without an allow-list every
/// attribute passes; `groups` needs an explicit allow-list entry.
fn access_token_user_attributes(
    attributes: &Claims,
    groups: &[String],
    app: Option<&OAuthAppConfig>,
) -> Claims {
    let allowed = app
        .map(OAuthAppConfig::access_token_user_attributes)
        .unwrap_or_default();

    let mut filtered = if allowed.is_empty() {
        attributes.clone()
    } else {
        allowed
            .iter()
            .filter_map(|name| {
                attributes
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    };

    if !groups.is_empty() && allowed.iter().any(|name| name == USER_ATTRIBUTE_GROUPS) {
        filtered.insert(USER_ATTRIBUTE_GROUPS.to_string(), Value::from(groups.to_vec()));
    }
    filtered
}

/// `{sub, iss?, act?}`, nesting the actor's own delegation chain.
fn actor_claim(actor: &SubjectTokenClaims) -> Claims {
    let mut act = Claims::new();
    act.insert(CLAIM_SUB.to_string(), Value::from(actor.sub.as_str()));
    if !actor.iss.is_empty() {
        act.insert(CLAIM_ISS.to_string(), Value::from(actor.iss.as_str()));
    }
    if let Some(nested) = actor.nested_act.as_ref().filter(|nested| !nested.is_empty()) {
        act.insert(CLAIM_ACT.to_string(), Value::Object(nested.clone()));
    }
    act
}
