mod builder;
mod constants;
mod model;
mod providers;
mod userinfo;
mod utils;
mod validator;

#[cfg(test)]
mod tests;

pub use builder::TokenBuilder;
pub use constants::{
    standard_oidc_scope, GrantType, OidcScope, DEFAULT_GROUP_LIST_LIMIT, STANDARD_OIDC_SCOPES,
    TOKEN_TYPE_BEARER, USER_ATTRIBUTE_GROUPS,
};
pub use model::{
    AccessTokenBuildContext, AccessTokenConfig, IdTokenBuildContext, IdTokenConfig,
    IdentityStamp, OAuthAppConfig, OAuthTokenConfig, RefreshTokenBuildContext,
    RefreshTokenClaims, SubjectTokenClaims, TokenConfig, TokenDefaults, TokenDto, TokenType,
};
pub use providers::{ApplicationProvider, UserProvider, UserRecord};
pub use userinfo::UserInfoService;
pub use utils::{
    build_oidc_claims_from_scopes, determine_audience, extract_i64_claim,
    extract_scopes_from_claims, extract_string_claim, extract_user_attributes,
    fetch_user_attributes_and_groups, join_scopes, parse_scopes, resolve_token_config,
    trusted_issuers,
};
pub use validator::TokenValidator;
