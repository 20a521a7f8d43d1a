#![forbid(unsafe_code)]

mod config;
mod error;
mod jwt;
mod keys;
mod oauth2;
#[cfg(test)]
mod test_support;

pub use config::{EngineConfig, JwksConfig, JwtConfig, KeyConfig, OAuthConfig, RefreshTokenConfig};
pub use error::{Error, ErrorKind};

pub use keys::{
    resolve_signing_key, EcCurve, JwsAlgorithm, KeyProvider, PemKeyProvider,
    PemKeyProviderBuilder, PrivateKey, PublicKey, ResolvedKey, SignAlgorithm,
};

pub use jwt::{
    decode_jwt, decode_jwt_header, decode_jwt_payload, encode_signing_input, jwk_to_public_key,
    public_key_to_jwk, sign, validate_claims, verify, Claims, Jwk, JwkObject, JwkSet, JwtService,
    TokenSigner, TokenVerifier,
};

pub use oauth2::{
    build_oidc_claims_from_scopes, determine_audience, extract_i64_claim,
    extract_scopes_from_claims, extract_string_claim, extract_user_attributes,
    fetch_user_attributes_and_groups, join_scopes, parse_scopes, resolve_token_config,
    standard_oidc_scope, trusted_issuers, AccessTokenBuildContext, AccessTokenConfig,
    ApplicationProvider, GrantType, IdTokenBuildContext, IdTokenConfig, IdentityStamp,
    OAuthAppConfig, OAuthTokenConfig, OidcScope, RefreshTokenBuildContext, RefreshTokenClaims,
    SubjectTokenClaims, TokenBuilder, TokenConfig, TokenDefaults, TokenDto, TokenType,
    TokenValidator, UserInfoService, UserProvider, UserRecord, DEFAULT_GROUP_LIST_LIMIT,
    STANDARD_OIDC_SCOPES, TOKEN_TYPE_BEARER, USER_ATTRIBUTE_GROUPS,
};
