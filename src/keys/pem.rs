use crate::error::Error;
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use p521::ecdsa::{SigningKey as P521SigningKey, VerifyingKey as P521VerifyingKey};
use p521::elliptic_curve::sec1::ToEncodedPoint;
use pem::parse_many;
use pkcs8::{DecodePrivateKey, DecodePublicKey, ObjectIdentifier, PrivateKeyInfo};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use super::material::{PrivateKey, PublicKey};

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

const KNOWN_UNSUPPORTED_CURVES: &[(&str, &str)] = &[
    ("1.3.132.0.33", "P-224"),
    ("1.2.840.10045.3.1.1", "P-192"),
    ("1.3.132.0.10", "secp256k1"),
    ("1.3.36.3.3.2.8.1.1.7", "brainpoolP256r1"),
];

pub(crate) fn load_private_key(pem_bytes: &[u8]) -> Result<PrivateKey, Error> {
    let blocks =
        parse_many(pem_bytes).map_err(|e| Error::KeyMaterial(format!("pem parse error: {e}")))?;
    for block in blocks {
        match block.tag() {
            "RSA PRIVATE KEY" => return parse_rsa_private_pkcs1(block.contents()),
            "PRIVATE KEY" => return parse_private_pkcs8(block.contents()),
            "EC PRIVATE KEY" => return parse_ec_private_sec1(block.contents()),
            _ => {}
        }
    }
    Err(Error::UnsupportedKeyType)
}

pub(crate) fn load_public_key(pem_bytes: &[u8]) -> Result<PublicKey, Error> {
    let blocks =
        parse_many(pem_bytes).map_err(|e| Error::KeyMaterial(format!("pem parse error: {e}")))?;
    for block in blocks {
        match block.tag() {
            "RSA PUBLIC KEY" => {
                let key = RsaPublicKey::from_pkcs1_der(block.contents())
                    .map_err(|e| Error::KeyMaterial(format!("rsa pkcs1 public key error: {e}")))?;
                return Ok(PublicKey::Rsa(key));
            }
            "PUBLIC KEY" => return parse_public_spki(block.contents()),
            "CERTIFICATE" => {
                return Err(Error::KeyMaterial(
                    "certificates are not accepted as public keys".to_string(),
                ))
            }
            _ => {}
        }
    }
    Err(Error::UnsupportedKeyType)
}

/// DER of the first `CERTIFICATE` block, if any.
pub(crate) fn load_certificate_der(pem_bytes: &[u8]) -> Result<Option<Vec<u8>>, Error> {
    let blocks =
        parse_many(pem_bytes).map_err(|e| Error::KeyMaterial(format!("pem parse error: {e}")))?;
    Ok(blocks
        .into_iter()
        .find(|block| block.tag() == "CERTIFICATE")
        .map(|block| block.into_contents()))
}

fn parse_rsa_private_pkcs1(der: &[u8]) -> Result<PrivateKey, Error> {
    let key = RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| Error::KeyMaterial(format!("rsa pkcs1 private key error: {e}")))?;
    Ok(PrivateKey::Rsa(key))
}

fn parse_private_pkcs8(der: &[u8]) -> Result<PrivateKey, Error> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| Error::KeyMaterial(format!("pkcs8 private key error: {e}")))?;
    let algorithm = info.algorithm.oid;
    if algorithm == RSA_ENCRYPTION {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| Error::KeyMaterial(format!("rsa pkcs8 private key error: {e}")))?;
        return Ok(PrivateKey::Rsa(key));
    }
    if algorithm == ID_ED25519 {
        let key = Ed25519SigningKey::from_pkcs8_der(der)
            .map_err(|e| Error::KeyMaterial(format!("ed25519 pkcs8 private key error: {e}")))?;
        return Ok(PrivateKey::Ed25519(key));
    }
    if algorithm == ID_EC_PUBLIC_KEY {
        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|e| Error::KeyMaterial(format!("ec pkcs8 curve parameters error: {e}")))?;
        return parse_ec_private_pkcs8(der, curve);
    }
    Err(Error::UnsupportedKeyType)
}

fn parse_ec_private_pkcs8(der: &[u8], curve: ObjectIdentifier) -> Result<PrivateKey, Error> {
    if curve == SECP256R1 {
        let secret = p256::SecretKey::from_pkcs8_der(der)
            .map_err(|e| Error::KeyMaterial(format!("p256 private key error: {e}")))?;
        let key = P256SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::KeyMaterial(format!("p256 signing key error: {e}")))?;
        return Ok(PrivateKey::P256(key));
    }
    if curve == SECP384R1 {
        let secret = p384::SecretKey::from_pkcs8_der(der)
            .map_err(|e| Error::KeyMaterial(format!("p384 private key error: {e}")))?;
        let key = P384SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::KeyMaterial(format!("p384 signing key error: {e}")))?;
        return Ok(PrivateKey::P384(key));
    }
    if curve == SECP521R1 {
        let secret = p521::SecretKey::from_pkcs8_der(der)
            .map_err(|e| Error::KeyMaterial(format!("p521 private key error: {e}")))?;
        let key = P521SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::KeyMaterial(format!("p521 signing key error: {e}")))?;
        return Ok(PrivateKey::P521(key));
    }
    Err(Error::UnsupportedEcCurve(curve_name(curve)))
}

fn parse_ec_private_sec1(der: &[u8]) -> Result<PrivateKey, Error> {
    if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
        let key = P256SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::KeyMaterial(format!("p256 signing key error: {e}")))?;
        return Ok(PrivateKey::P256(key));
    }
    if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
        let key = P384SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::KeyMaterial(format!("p384 signing key error: {e}")))?;
        return Ok(PrivateKey::P384(key));
    }
    if let Ok(secret) = p521::SecretKey::from_sec1_der(der) {
        let key = P521SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::KeyMaterial(format!("p521 signing key error: {e}")))?;
        return Ok(PrivateKey::P521(key));
    }
    Err(Error::UnsupportedEcCurve("unrecognized SEC1 curve".to_string()))
}

fn parse_public_spki(der: &[u8]) -> Result<PublicKey, Error> {
    if let Ok(key) = RsaPublicKey::from_public_key_der(der) {
        return Ok(PublicKey::Rsa(key));
    }
    if let Ok(key) = P256VerifyingKey::from_public_key_der(der) {
        return Ok(PublicKey::P256(key));
    }
    if let Ok(key) = P384VerifyingKey::from_public_key_der(der) {
        return Ok(PublicKey::P384(key));
    }
    if let Ok(public_key) = p521::PublicKey::from_public_key_der(der) {
        let encoded = public_key.to_encoded_point(false);
        let key = P521VerifyingKey::from_encoded_point(&encoded)
            .map_err(|e| Error::KeyMaterial(format!("p521 public key error: {e}")))?;
        return Ok(PublicKey::P521(key));
    }
    if let Ok(key) = Ed25519VerifyingKey::from_public_key_der(der) {
        return Ok(PublicKey::Ed25519(key));
    }
    Err(Error::UnsupportedKeyType)
}

fn curve_name(oid: ObjectIdentifier) -> String {
    let dotted = oid.to_string();
    KNOWN_UNSUPPORTED_CURVES
        .iter()
        .find(|(known, _)| *known == dotted)
        .map(|(_, name)| name.to_string())
        .unwrap_or(dotted)
}

impl PublicKey {
    /// Parses a PEM `PUBLIC KEY` (SPKI) or `RSA PUBLIC KEY` block.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, Error> {
        load_public_key(pem_bytes)
    }
}

impl PrivateKey {
    /// Parses PKCS#1 RSA, PKCS#8 (RSA, EC, Ed25519) or SEC1 EC private keys.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, Error> {
        load_private_key(pem_bytes)
    }
}
