use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub const CLAIM_SUB: &str = "sub";
pub const CLAIM_ISS: &str = "iss";
pub const CLAIM_AUD: &str = "aud";
pub const CLAIM_EXP: &str = "exp";
pub const CLAIM_NBF: &str = "nbf";
pub const CLAIM_IAT: &str = "iat";
pub const CLAIM_JTI: &str = "jti";
pub const CLAIM_SCOPE: &str = "scope";
pub const CLAIM_CLIENT_ID: &str = "client_id";
pub const CLAIM_GRANT_TYPE: &str = "grant_type";
pub const CLAIM_ACT: &str = "act";
pub const CLAIM_AUTH_TIME: &str = "auth_time";
pub const CLAIM_AUTHORIZED_PERMISSIONS: &str = "authorized_permissions";
pub const CLAIM_ACCESS_TOKEN_SUB: &str = "access_token_sub";
pub const CLAIM_ACCESS_TOKEN_AUD: &str = "access_token_aud";
pub const CLAIM_ACCESS_TOKEN_USER_ATTRIBUTES: &str = "access_token_user_attributes";
pub const CLAIM_USER_TYPE: &str = "userType";
pub const CLAIM_OU_ID: &str = "ouId";
pub const CLAIM_OU_NAME: &str = "ouName";
pub const CLAIM_OU_HANDLE: &str = "ouHandle";

pub const TOKEN_TYPE_BEARER: &str = "Bearer";
pub const USER_ATTRIBUTE_GROUPS: &str = "groups";
pub const DEFAULT_GROUP_LIST_LIMIT: usize = 20;

/// Registered claims that never count as user attributes.
pub(crate) const STANDARD_JWT_CLAIMS: &[&str] = &[
    CLAIM_SUB,
    CLAIM_ISS,
    CLAIM_AUD,
    CLAIM_EXP,
    CLAIM_NBF,
    CLAIM_IAT,
    CLAIM_JTI,
    CLAIM_SCOPE,
    CLAIM_CLIENT_ID,
    CLAIM_ACT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OidcScope {
    pub name: &'static str,
    pub description: &'static str,
    pub claims: &'static [&'static str],
}

pub const STANDARD_OIDC_SCOPES: &[OidcScope] = &[
    OidcScope {
        name: "openid",
        description: "Standard OpenID Connect scope",
        claims: &["sub"],
    },
    OidcScope {
        name: "profile",
        description: "Access to the end user's default profile claims",
        claims: &[
            "name",
            "family_name",
            "given_name",
            "middle_name",
            "nickname",
            "preferred_username",
            "profile",
            "picture",
            "website",
            "gender",
            "birthdate",
            "zoneinfo",
            "locale",
            "updated_at",
        ],
    },
    OidcScope {
        name: "email",
        description: "Access to the email and email_verified claims",
        claims: &["email", "email_verified"],
    },
    OidcScope {
        name: "phone",
        description: "Access to the phone_number and phone_number_verified claims",
        claims: &["phone_number", "phone_number_verified"],
    },
    OidcScope {
        name: "address",
        description: "Access to the address claim",
        claims: &["address"],
    },
];

pub fn standard_oidc_scope(name: &str) -> Option<&'static OidcScope> {
    STANDARD_OIDC_SCOPES.iter().find(|scope| scope.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
    TokenExchange,
}

impl GrantType {
    pub const ALL: [GrantType; 4] = [
        GrantType::AuthorizationCode,
        GrantType::ClientCredentials,
        GrantType::RefreshToken,
        GrantType::TokenExchange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::RefreshToken => "refresh_token",
            GrantType::TokenExchange => "urn:ietf:params:oauth:grant-type:token-exchange",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|grant| grant.as_str() == value)
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| Error::UnsupportedGrantType(value.to_string()))
    }
}
