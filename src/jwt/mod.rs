mod claims;
mod codec;
mod jwk;
mod jwks;
mod service;
mod sign;

#[cfg(test)]
mod tests;

pub use claims::validate_claims;
pub use codec::{decode_jwt, decode_jwt_header, decode_jwt_payload, encode_signing_input, Claims};
pub use jwk::{jwk_to_public_key, public_key_to_jwk, Jwk, JwkObject, JwkSet};
pub use service::{JwtService, TokenSigner, TokenVerifier};
pub use sign::{sign, verify};

pub(crate) use claims::{numeric_value, unix_time_now};
