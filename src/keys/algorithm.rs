use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Internal signature algorithm, derived from the key variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignAlgorithm {
    RsaSha256,
    RsaSha512,
    EcdsaSha256,
    EcdsaSha384,
    EcdsaSha512,
    Ed25519,
}

/// Wire `alg` label carried in the JWT header.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwsAlgorithm {
    RS256,
    RS512,
    ES256,
    ES384,
    ES512,
    EdDSA,
}

// Row order matches the declaration order of both enums, so each enum's
// discriminant is its row index.
pub(crate) const ALGORITHM_TABLE: &[(SignAlgorithm, JwsAlgorithm, &str)] = &[
    (SignAlgorithm::RsaSha256, JwsAlgorithm::RS256, "RS256"),
    (SignAlgorithm::RsaSha512, JwsAlgorithm::RS512, "RS512"),
    (SignAlgorithm::EcdsaSha256, JwsAlgorithm::ES256, "ES256"),
    (SignAlgorithm::EcdsaSha384, JwsAlgorithm::ES384, "ES384"),
    (SignAlgorithm::EcdsaSha512, JwsAlgorithm::ES512, "ES512"),
    (SignAlgorithm::Ed25519, JwsAlgorithm::EdDSA, "EdDSA"),
];

impl SignAlgorithm {
    pub fn jws_algorithm(self) -> JwsAlgorithm {
        ALGORITHM_TABLE[self as usize].1
    }
}

impl JwsAlgorithm {
    pub fn sign_algorithm(self) -> SignAlgorithm {
        ALGORITHM_TABLE[self as usize].0
    }

    pub fn as_str(self) -> &'static str {
        ALGORITHM_TABLE[self as usize].2
    }

    /// Maps a header `alg` label back to the algorithm. Labels outside the
    /// table (including `none` and HMAC variants) are rejected.
    pub fn from_label(label: &str) -> Result<Self, Error> {
        ALGORITHM_TABLE
            .iter()
            .find(|(_, _, name)| *name == label)
            .map(|(_, jws, _)| *jws)
            .ok_or_else(|| Error::UnsupportedAlgorithm(label.to_string()))
    }
}

impl FromStr for JwsAlgorithm {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::from_label(label)
    }
}

impl fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SignAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignAlgorithm::RsaSha256 => "RSA-SHA256",
            SignAlgorithm::RsaSha512 => "RSA-SHA512",
            SignAlgorithm::EcdsaSha256 => "ECDSA-SHA256",
            SignAlgorithm::EcdsaSha384 => "ECDSA-SHA384",
            SignAlgorithm::EcdsaSha512 => "ECDSA-SHA512",
            SignAlgorithm::Ed25519 => "Ed25519",
        };
        f.write_str(name)
    }
}
