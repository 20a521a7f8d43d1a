use std::fmt;

/// Coarse classification of [`Error`] used by callers to map failures onto
/// their own response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or unusable key material and configuration. Fatal at startup.
    Configuration,
    /// Malformed token structure, base64 or JSON.
    Format,
    /// Signature mismatch, unsupported algorithm or unusable public key.
    Cryptographic,
    /// Expired or not yet valid tokens.
    Temporal,
    /// Untrusted issuer, audience/issuer mismatch or client binding mismatch.
    Trust,
    /// JWKS fetch failures.
    Transport,
    /// Failures of collaborators or of the engine itself.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Format => "format",
            ErrorKind::Cryptographic => "cryptographic",
            ErrorKind::Temporal => "temporal",
            ErrorKind::Trust => "trust",
            ErrorKind::Transport => "transport",
            ErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("private key not found for key id: {0}")]
    PrivateKeyNotFound(String),
    #[error("invalid key material: {0}")]
    KeyMaterial(String),
    #[error("unsupported private key type")]
    UnsupportedKeyType,
    #[error("unsupported EC curve: {0}")]
    UnsupportedEcCurve(String),

    #[error("invalid JWT format")]
    InvalidJwtFormat,
    #[error("failed to decode JWT header: {0}")]
    DecodeHeader(String),
    #[error("failed to decode JWT payload: {0}")]
    DecodePayload(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing claim: {0}")]
    MissingClaim(String),
    #[error("claim {0} has an unexpected type")]
    InvalidClaimType(String),
    #[error("JWT header is missing the kid parameter")]
    MissingKeyId,

    #[error("unsupported JWS algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("key type does not match algorithm {0}")]
    KeyAlgorithmMismatch(&'static str),
    #[error("invalid token signature")]
    InvalidTokenSignature,
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("JWK is missing the kty parameter")]
    MissingJwkKty,
    #[error("unsupported JWK kty: {0}")]
    UnsupportedJwkKty(String),
    #[error("JWK is missing RSA modulus or exponent")]
    MissingRsaParameters,
    #[error("JWK is missing EC crv, x or y")]
    MissingEcParameters,
    #[error("JWK is missing OKP crv or x")]
    MissingOkpParameters,
    #[error("failed to decode JWK {field}: {reason}")]
    JwkDecode { field: &'static str, reason: String },
    #[error("RSA exponent must be a positive integer")]
    InvalidRsaExponent,
    #[error("unsupported JWK curve: {0}")]
    UnsupportedJwkCurve(String),
    #[error("invalid EC coordinate length")]
    InvalidEcCoordinateLength,
    #[error("EC point not on curve")]
    EcPointNotOnCurve,
    #[error("invalid Ed25519 public key length: {0}")]
    InvalidEd25519KeyLength(usize),
    #[error("invalid JWK: {0}")]
    InvalidJwk(String),
    #[error("no matching JWK found for kid: {0}")]
    NoMatchingJwk(String),

    #[error("token has expired")]
    TokenExpired,
    #[error("token is not yet valid")]
    TokenNotYetValid,

    #[error("invalid audience")]
    InvalidAudience,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("token issuer '{0}' is not supported")]
    IssuerNotSupported(String),
    #[error("refresh token does not belong to the requesting client")]
    RefreshTokenClientMismatch,
    #[error("token was not issued to an end user")]
    ClientCredentialsToken,
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),
    #[error("failed to parse JWKS: {0}")]
    JwksParse(String),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to generate {token} token: {source}")]
    TokenGeneration {
        token: &'static str,
        #[source]
        source: Box<Error>,
    },
    #[error("invalid refresh token: {0}")]
    InvalidRefreshToken(#[source] Box<Error>),
    #[error("invalid subject token signature: {0}")]
    InvalidSubjectTokenSignature(#[source] Box<Error>),
    #[error("no OAuth application registered for client id: {0}")]
    ApplicationNotFound(String),
    #[error("user lookup failed: {0}")]
    UserLookup(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_)
            | Error::Io(_)
            | Error::PrivateKeyNotFound(_)
            | Error::KeyMaterial(_)
            | Error::UnsupportedKeyType
            | Error::UnsupportedEcCurve(_) => ErrorKind::Configuration,

            Error::InvalidJwtFormat
            | Error::DecodeHeader(_)
            | Error::DecodePayload(_)
            | Error::Json(_)
            | Error::MissingClaim(_)
            | Error::InvalidClaimType(_)
            | Error::MissingKeyId
            | Error::UnsupportedGrantType(_) => ErrorKind::Format,

            Error::UnsupportedAlgorithm(_)
            | Error::KeyAlgorithmMismatch(_)
            | Error::InvalidTokenSignature
            | Error::MissingJwkKty
            | Error::UnsupportedJwkKty(_)
            | Error::MissingRsaParameters
            | Error::MissingEcParameters
            | Error::MissingOkpParameters
            | Error::JwkDecode { .. }
            | Error::InvalidRsaExponent
            | Error::UnsupportedJwkCurve(_)
            | Error::InvalidEcCoordinateLength
            | Error::EcPointNotOnCurve
            | Error::InvalidEd25519KeyLength(_)
            | Error::InvalidJwk(_)
            | Error::NoMatchingJwk(_)
            | Error::InvalidSubjectTokenSignature(_) => ErrorKind::Cryptographic,

            Error::TokenExpired | Error::TokenNotYetValid => ErrorKind::Temporal,

            Error::InvalidAudience
            | Error::InvalidIssuer
            | Error::IssuerNotSupported(_)
            | Error::RefreshTokenClientMismatch
            | Error::ClientCredentialsToken
            | Error::InvalidAccessToken => ErrorKind::Trust,

            Error::JwksFetch(_) | Error::JwksParse(_) | Error::Url(_) | Error::Http(_) => {
                ErrorKind::Transport
            }

            Error::InvalidRefreshToken(source) => source.kind(),

            Error::Signing(_)
            | Error::TokenGeneration { .. }
            | Error::ApplicationNotFound(_)
            | Error::UserLookup(_) => ErrorKind::Internal,
        }
    }

    /// True for failures caused by the presented token rather than by the
    /// engine or its collaborators.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::Internal
        )
    }
}
