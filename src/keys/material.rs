use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use p521::ecdsa::{SigningKey as P521SigningKey, VerifyingKey as P521VerifyingKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;

use super::algorithm::SignAlgorithm;

/// Private signing key. Only the NIST curves P-256, P-384 and P-521 are
/// representable for ECDSA.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    P256(P256SigningKey),
    P384(P384SigningKey),
    P521(P521SigningKey),
    Ed25519(Ed25519SigningKey),
}

#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    P256(P256VerifyingKey),
    P384(P384VerifyingKey),
    P521(P521VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    pub fn name(self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
            EcCurve::P521 => "P-521",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "P-256" => Some(EcCurve::P256),
            "P-384" => Some(EcCurve::P384),
            "P-521" => Some(EcCurve::P521),
            _ => None,
        }
    }

    /// Byte length of one affine coordinate (and of one half of a raw signature).
    pub fn coordinate_size(self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

impl PrivateKey {
    pub fn sign_algorithm(&self) -> SignAlgorithm {
        match self {
            PrivateKey::Rsa(_) => SignAlgorithm::RsaSha256,
            PrivateKey::P256(_) => SignAlgorithm::EcdsaSha256,
            PrivateKey::P384(_) => SignAlgorithm::EcdsaSha384,
            PrivateKey::P521(_) => SignAlgorithm::EcdsaSha512,
            PrivateKey::Ed25519(_) => SignAlgorithm::Ed25519,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(key) => PublicKey::Rsa(RsaPublicKey::from(key)),
            PrivateKey::P256(key) => PublicKey::P256(P256VerifyingKey::from(key)),
            PrivateKey::P384(key) => PublicKey::P384(P384VerifyingKey::from(key)),
            PrivateKey::P521(key) => PublicKey::P521(P521VerifyingKey::from(key)),
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
        }
    }

    pub fn key_type(&self) -> &'static str {
        key_type_name(self.curve(), matches!(self, PrivateKey::Rsa(_)))
    }

    pub fn curve(&self) -> Option<EcCurve> {
        match self {
            PrivateKey::P256(_) => Some(EcCurve::P256),
            PrivateKey::P384(_) => Some(EcCurve::P384),
            PrivateKey::P521(_) => Some(EcCurve::P521),
            PrivateKey::Rsa(_) | PrivateKey::Ed25519(_) => None,
        }
    }
}

impl PublicKey {
    pub fn key_type(&self) -> &'static str {
        key_type_name(self.curve(), matches!(self, PublicKey::Rsa(_)))
    }

    pub fn curve(&self) -> Option<EcCurve> {
        match self {
            PublicKey::P256(_) => Some(EcCurve::P256),
            PublicKey::P384(_) => Some(EcCurve::P384),
            PublicKey::P521(_) => Some(EcCurve::P521),
            PublicKey::Rsa(_) | PublicKey::Ed25519(_) => None,
        }
    }
}

fn key_type_name(curve: Option<EcCurve>, rsa: bool) -> &'static str {
    match (curve, rsa) {
        (Some(EcCurve::P256), _) => "ECDSA-P256",
        (Some(EcCurve::P384), _) => "ECDSA-P384",
        (Some(EcCurve::P521), _) => "ECDSA-P521",
        (None, true) => "RSA",
        (None, false) => "Ed25519",
    }
}

// Key material never reaches logs.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&self.key_type()).finish()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.key_type()).finish()
    }
}
