use crate::error::Error;
use crate::keys::{EcCurve, PublicKey};
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use base64::Engine as _;
use ed25519_dalek::{VerifyingKey as Ed25519VerifyingKey, PUBLIC_KEY_LENGTH};
use p256::ecdsa::VerifyingKey as P256VerifyingKey;
use p384::ecdsa::VerifyingKey as P384VerifyingKey;
use p521::ecdsa::VerifyingKey as P521VerifyingKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::codec::{base64_url_decode, base64_url_encode};

/// A JWK as received from a remote key set. Entries stay untyped so one
/// malformed key does not invalidate the whole set.
pub type JwkObject = Map<String, Value>;

/// A JWK as published by this engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    #[serde(rename = "x5t#S256", skip_serializing_if = "Option::is_none")]
    pub x5t_s256: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl Jwk {
    /// Untyped view of this key, suitable for [`jwk_to_public_key`].
    pub fn to_object(&self) -> Result<JwkObject, Error> {
        match serde_json::to_value(self)? {
            Value::Object(object) => Ok(object),
            _ => Err(Error::InvalidJwk("JWK did not serialize to an object".to_string())),
        }
    }

    /// Attaches the DER certificate as `x5c` with its SHA-1 and SHA-256
    /// thumbprints.
    pub(crate) fn with_certificate(mut self, der: &[u8]) -> Self {
        self.x5c = Some(vec![BASE64_STD.encode(der)]);
        self.x5t = Some(base64_url_encode(&Sha1::digest(der)));
        self.x5t_s256 = Some(base64_url_encode(&Sha256::digest(der)));
        self
    }
}

pub fn jwk_to_public_key(jwk: &JwkObject) -> Result<PublicKey, Error> {
    let kty = string_field(jwk, "kty").ok_or(Error::MissingJwkKty)?;
    match kty {
        "RSA" => rsa_public_key(jwk),
        "EC" => ec_public_key(jwk),
        "OKP" => okp_public_key(jwk),
        other => Err(Error::UnsupportedJwkKty(other.to_string())),
    }
}

fn rsa_public_key(jwk: &JwkObject) -> Result<PublicKey, Error> {
    let (Some(n), Some(e)) = (string_field(jwk, "n"), string_field(jwk, "e")) else {
        return Err(Error::MissingRsaParameters);
    };
    let n = decode_field(n, "RSA modulus")?;
    let e = decode_field(e, "RSA exponent")?;
    if e.iter().all(|byte| *byte == 0) {
        return Err(Error::InvalidRsaExponent);
    }
    let key = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
        .map_err(|err| Error::InvalidJwk(format!("invalid RSA public key: {err}")))?;
    Ok(PublicKey::Rsa(key))
}

fn ec_public_key(jwk: &JwkObject) -> Result<PublicKey, Error> {
    let (Some(crv), Some(x), Some(y)) = (
        string_field(jwk, "crv"),
        string_field(jwk, "x"),
        string_field(jwk, "y"),
    ) else {
        return Err(Error::MissingEcParameters);
    };
    let curve = EcCurve::from_name(crv).ok_or_else(|| Error::UnsupportedJwkCurve(crv.to_string()))?;
    let x = decode_field(x, "EC x coordinate")?;
    let y = decode_field(y, "EC y coordinate")?;
    let size = curve.coordinate_size();
    if x.len() != size || y.len() != size {
        return Err(Error::InvalidEcCoordinateLength);
    }

    let mut sec1 = Vec::with_capacity(1 + size * 2);
    sec1.push(0x04);
    sec1.extend_from_slice(&x);
    sec1.extend_from_slice(&y);

    // from_sec1_bytes rejects points that are not on the curve.
    let key = match curve {
        EcCurve::P256 => P256VerifyingKey::from_sec1_bytes(&sec1).map(PublicKey::P256),
        EcCurve::P384 => P384VerifyingKey::from_sec1_bytes(&sec1).map(PublicKey::P384),
        EcCurve::P521 => P521VerifyingKey::from_sec1_bytes(&sec1).map(PublicKey::P521),
    };
    key.map_err(|_| Error::EcPointNotOnCurve)
}

fn okp_public_key(jwk: &JwkObject) -> Result<PublicKey, Error> {
    let (Some(crv), Some(x)) = (string_field(jwk, "crv"), string_field(jwk, "x")) else {
        return Err(Error::MissingOkpParameters);
    };
    if crv != "Ed25519" {
        return Err(Error::UnsupportedJwkCurve(crv.to_string()));
    }
    let x = decode_field(x, "Ed25519 public key")?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = x
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidEd25519KeyLength(x.len()))?;
    let key = Ed25519VerifyingKey::from_bytes(&bytes)
        .map_err(|err| Error::InvalidJwk(format!("invalid Ed25519 public key: {err}")))?;
    Ok(PublicKey::Ed25519(key))
}

fn string_field<'a>(jwk: &'a JwkObject, name: &str) -> Option<&'a str> {
    jwk.get(name).and_then(Value::as_str)
}

fn decode_field(value: &str, field: &'static str) -> Result<Vec<u8>, Error> {
    base64_url_decode(value).map_err(|err| Error::JwkDecode {
        field,
        reason: err.to_string(),
    })
}

/// Renders a public key as a signing JWK. EC coordinates are left-padded to
/// the curve size.
pub fn public_key_to_jwk(key: &PublicKey, kid: &str) -> Jwk {
    let mut jwk = Jwk {
        kid: Some(kid.to_string()).filter(|kid| !kid.is_empty()),
        key_use: Some("sig".to_string()),
        ..Jwk::default()
    };
    match key {
        PublicKey::Rsa(key) => {
            jwk.kty = "RSA".to_string();
            jwk.alg = Some("RS256".to_string());
            jwk.n = Some(base64_url_encode(&key.n().to_bytes_be()));
            jwk.e = Some(base64_url_encode(&key.e().to_bytes_be()));
        }
        PublicKey::P256(key) => {
            let point = key.to_encoded_point(false);
            set_ec_coordinates(&mut jwk, EcCurve::P256, "ES256", point.x(), point.y());
        }
        PublicKey::P384(key) => {
            let point = key.to_encoded_point(false);
            set_ec_coordinates(&mut jwk, EcCurve::P384, "ES384", point.x(), point.y());
        }
        PublicKey::P521(key) => {
            let point = key.to_encoded_point(false);
            set_ec_coordinates(&mut jwk, EcCurve::P521, "ES512", point.x(), point.y());
        }
        PublicKey::Ed25519(key) => {
            jwk.kty = "OKP".to_string();
            jwk.alg = Some("EdDSA".to_string());
            jwk.crv = Some("Ed25519".to_string());
            jwk.x = Some(base64_url_encode(key.as_bytes()));
        }
    }
    jwk
}

fn set_ec_coordinates<B: AsRef<[u8]>>(
    jwk: &mut Jwk,
    curve: EcCurve,
    alg: &str,
    x: Option<&B>,
    y: Option<&B>,
) {
    let size = curve.coordinate_size();
    jwk.kty = "EC".to_string();
    jwk.alg = Some(alg.to_string());
    jwk.crv = Some(curve.name().to_string());
    jwk.x = x.map(|x| base64_url_encode(&left_pad(x.as_ref(), size)));
    jwk.y = y.map(|y| base64_url_encode(&left_pad(y.as_ref(), size)));
}

fn left_pad(bytes: &[u8], size: usize) -> Vec<u8> {
    if bytes.len() >= size {
        return bytes.to_vec();
    }
    let mut padded = vec![0u8; size - bytes.len()];
    padded.extend_from_slice(bytes);
    padded
}
