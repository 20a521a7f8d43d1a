use crate::error::Error;
use crate::keys::{EcCurve, PrivateKey, PublicKey, SignAlgorithm};
use ed25519_dalek::Signature as Ed25519Signature;
use p256::ecdsa::{Signature as P256Signature, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{Signature as P384Signature, VerifyingKey as P384VerifyingKey};
use p521::ecdsa::{Signature as P521Signature, VerifyingKey as P521VerifyingKey};
use rsa::pkcs1v15::{
    Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey,
};
use sha2::{Sha256, Sha512};
use signature::{SignatureEncoding, Signer as _, Verifier as _};

/// Signs `message` with `key`. The algorithm must belong to the key's family;
/// ECDSA signatures are returned in the fixed-width `R || S` JWS form.
pub fn sign(message: &[u8], alg: SignAlgorithm, key: &PrivateKey) -> Result<Vec<u8>, Error> {
    let signature = match (alg, key) {
        (SignAlgorithm::RsaSha256, PrivateKey::Rsa(key)) => RsaSigningKey::<Sha256>::new(key.clone())
            .try_sign(message)
            .map(|sig| sig.to_vec()),
        (SignAlgorithm::RsaSha512, PrivateKey::Rsa(key)) => RsaSigningKey::<Sha512>::new(key.clone())
            .try_sign(message)
            .map(|sig| sig.to_vec()),
        (SignAlgorithm::EcdsaSha256, PrivateKey::P256(key)) => {
            let sig: Result<P256Signature, _> = key.try_sign(message);
            sig.map(|sig| sig.to_bytes().to_vec())
        }
        (SignAlgorithm::EcdsaSha384, PrivateKey::P384(key)) => {
            let sig: Result<P384Signature, _> = key.try_sign(message);
            sig.map(|sig| sig.to_bytes().to_vec())
        }
        (SignAlgorithm::EcdsaSha512, PrivateKey::P521(key)) => {
            let sig: Result<P521Signature, _> = key.try_sign(message);
            sig.map(|sig| sig.to_bytes().to_vec())
        }
        (SignAlgorithm::Ed25519, PrivateKey::Ed25519(key)) => {
            let sig: Result<Ed25519Signature, _> = key.try_sign(message);
            sig.map(|sig| sig.to_bytes().to_vec())
        }
        _ => return Err(Error::KeyAlgorithmMismatch(alg.jws_algorithm().as_str())),
    };
    signature.map_err(|err| Error::Signing(err.to_string()))
}

/// Verifies `signature` over `message`. Any failure, including a malformed
/// signature encoding, is reported as [`Error::InvalidTokenSignature`]; an
/// algorithm outside the key's family is [`Error::KeyAlgorithmMismatch`].
pub fn verify(
    message: &[u8],
    signature: &[u8],
    alg: SignAlgorithm,
    key: &PublicKey,
) -> Result<(), Error> {
    match (alg, key) {
        (SignAlgorithm::RsaSha256, PublicKey::Rsa(key)) => {
            let sig = rsa_signature(signature)?;
            RsaVerifyingKey::<Sha256>::new(key.clone())
                .verify(message, &sig)
                .map_err(|_| Error::InvalidTokenSignature)
        }
        (SignAlgorithm::RsaSha512, PublicKey::Rsa(key)) => {
            let sig = rsa_signature(signature)?;
            RsaVerifyingKey::<Sha512>::new(key.clone())
                .verify(message, &sig)
                .map_err(|_| Error::InvalidTokenSignature)
        }
        (SignAlgorithm::EcdsaSha256, PublicKey::P256(key)) => {
            verify_ecdsa(key, EcCurve::P256, message, signature)
        }
        (SignAlgorithm::EcdsaSha384, PublicKey::P384(key)) => {
            verify_ecdsa(key, EcCurve::P384, message, signature)
        }
        (SignAlgorithm::EcdsaSha512, PublicKey::P521(key)) => {
            verify_ecdsa(key, EcCurve::P521, message, signature)
        }
        (SignAlgorithm::Ed25519, PublicKey::Ed25519(key)) => {
            let sig = Ed25519Signature::from_slice(signature)
                .map_err(|_| Error::InvalidTokenSignature)?;
            key.verify(message, &sig)
                .map_err(|_| Error::InvalidTokenSignature)
        }
        _ => Err(Error::KeyAlgorithmMismatch(alg.jws_algorithm().as_str())),
    }
}

fn rsa_signature(signature: &[u8]) -> Result<RsaSignature, Error> {
    RsaSignature::try_from(signature).map_err(|_| Error::InvalidTokenSignature)
}

trait EcdsaVerifier {
    fn verify_fixed(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error>;
    fn verify_der(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error>;
}

impl EcdsaVerifier for P256VerifyingKey {
    fn verify_fixed(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error> {
        self.verify(message, &P256Signature::from_slice(signature)?)
    }

    fn verify_der(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error> {
        self.verify(message, &P256Signature::from_der(signature)?)
    }
}

impl EcdsaVerifier for P384VerifyingKey {
    fn verify_fixed(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error> {
        self.verify(message, &P384Signature::from_slice(signature)?)
    }

    fn verify_der(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error> {
        self.verify(message, &P384Signature::from_der(signature)?)
    }
}

impl EcdsaVerifier for P521VerifyingKey {
    fn verify_fixed(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error> {
        self.verify(message, &P521Signature::from_slice(signature)?)
    }

    fn verify_der(&self, message: &[u8], signature: &[u8]) -> Result<(), signature::Error> {
        self.verify(message, &P521Signature::from_der(signature)?)
    }
}

// JWS mandates fixed-width R || S; DER is accepted for tokens minted by
// libraries that emit ASN.1 signatures.
fn verify_ecdsa<K: EcdsaVerifier>(
    key: &K,
    curve: EcCurve,
    message: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    let result = if signature.len() == curve.coordinate_size() * 2 {
        key.verify_fixed(message, signature)
    } else {
        key.verify_der(message, signature)
    };
    result.map_err(|_| Error::InvalidTokenSignature)
}
