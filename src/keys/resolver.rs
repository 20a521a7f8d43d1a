use crate::error::Error;
use log::error;

use super::algorithm::{JwsAlgorithm, SignAlgorithm};
use super::material::{PrivateKey, PublicKey};
use super::provider::KeyProvider;

/// A signing key together with everything derived from it.
#[derive(Debug, Clone)]
pub struct ResolvedKey {
    pub(crate) key: PrivateKey,
    pub sign_alg: SignAlgorithm,
    pub jws_alg: JwsAlgorithm,
    pub kid: String,
}

impl ResolvedKey {
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        &self.key
    }
}

pub fn resolve_signing_key(provider: &dyn KeyProvider, key_id: &str) -> Result<ResolvedKey, Error> {
    let key = provider.private_key(key_id).map_err(|err| {
        error!("failed to resolve signing key; id={}: {}", key_id, err);
        err
    })?;
    let sign_alg = key.sign_algorithm();
    let jws_alg = sign_alg.jws_algorithm();
    let kid = provider.cert_thumbprint(key_id);
    Ok(ResolvedKey {
        key,
        sign_alg,
        jws_alg,
        kid,
    })
}
