use crate::config::KeyConfig;
use crate::error::Error;
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use base64::Engine as _;
use log::{debug, error};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::material::PrivateKey;
use super::pem::{load_certificate_der, load_private_key};

/// Source of the engine's signing keys.
pub trait KeyProvider: Send + Sync {
    fn private_key(&self, key_id: &str) -> Result<PrivateKey, Error>;

    /// Identifier published as the JWT `kid`. Empty when the key id is unknown.
    fn cert_thumbprint(&self, key_id: &str) -> String;

    fn certificate_der(&self, _key_id: &str) -> Option<Vec<u8>> {
        None
    }

    /// Every registered key id, in a stable order.
    fn key_ids(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct KeyEntry {
    key: PrivateKey,
    thumbprint: String,
    certificate: Option<Vec<u8>>,
}

/// In-memory key registry loaded from PEM material.
#[derive(Debug, Clone)]
pub struct PemKeyProvider {
    entries: HashMap<String, KeyEntry>,
}

#[derive(Debug, Default)]
pub struct PemKeyProviderBuilder {
    entries: HashMap<String, KeyEntry>,
}

impl PemKeyProvider {
    pub fn builder() -> PemKeyProviderBuilder {
        PemKeyProviderBuilder::default()
    }

    pub fn from_key_configs(configs: &[KeyConfig], home: impl AsRef<Path>) -> Result<Self, Error> {
        let home = home.as_ref();
        let mut builder = Self::builder();
        for config in configs {
            let key_path = KeyConfig::resolve(&config.key_file, home);
            let key_pem = fs::read(&key_path).map_err(|err| {
                error!(
                    "failed to read private key; id={}, path={}: {}",
                    config.id,
                    key_path.display(),
                    err
                );
                err
            })?;
            let cert_pem = match &config.cert_file {
                Some(cert_file) => {
                    let cert_path = KeyConfig::resolve(cert_file, home);
                    Some(fs::read(&cert_path).map_err(|err| {
                        error!(
                            "failed to read certificate; id={}, path={}: {}",
                            config.id,
                            cert_path.display(),
                            err
                        );
                        err
                    })?)
                }
                None => None,
            };
            builder = builder.add_pem(&config.id, &key_pem, cert_pem.as_deref())?;
        }
        builder.build()
    }
}

impl PemKeyProviderBuilder {
    pub fn add_pem(
        self,
        key_id: &str,
        key_pem: &[u8],
        cert_pem: Option<&[u8]>,
    ) -> Result<Self, Error> {
        let key = load_private_key(key_pem).map_err(|err| {
            error!("failed to load private key; id={}: {}", key_id, err);
            err
        })?;
        let certificate = match cert_pem {
            Some(cert_pem) => load_certificate_der(cert_pem)?,
            None => None,
        };
        self.add_key(key_id, key, certificate)
    }

    pub fn add_key(
        mut self,
        key_id: &str,
        key: PrivateKey,
        certificate_der: Option<Vec<u8>>,
    ) -> Result<Self, Error> {
        if key_id.trim().is_empty() {
            return Err(Error::Config("key id must not be empty".to_string()));
        }
        let thumbprint = match &certificate_der {
            Some(der) => certificate_thumbprint(der),
            None => key_id.to_string(),
        };
        debug!(
            "registered signing key; id={}, type={}",
            key_id,
            key.key_type()
        );
        self.entries.insert(
            key_id.to_string(),
            KeyEntry {
                key,
                thumbprint,
                certificate: certificate_der,
            },
        );
        Ok(self)
    }

    pub fn build(self) -> Result<PemKeyProvider, Error> {
        if self.entries.is_empty() {
            return Err(Error::Config("no signing keys configured".to_string()));
        }
        Ok(PemKeyProvider {
            entries: self.entries,
        })
    }
}

impl KeyProvider for PemKeyProvider {
    fn private_key(&self, key_id: &str) -> Result<PrivateKey, Error> {
        self.entries
            .get(key_id)
            .map(|entry| entry.key.clone())
            .ok_or_else(|| Error::PrivateKeyNotFound(key_id.to_string()))
    }

    fn cert_thumbprint(&self, key_id: &str) -> String {
        self.entries
            .get(key_id)
            .map(|entry| entry.thumbprint.clone())
            .unwrap_or_default()
    }

    fn certificate_der(&self, key_id: &str) -> Option<Vec<u8>> {
        self.entries
            .get(key_id)
            .and_then(|entry| entry.certificate.clone())
    }

    fn key_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Standard base64 of the SHA-256 digest of a DER certificate.
pub(crate) fn certificate_thumbprint(der: &[u8]) -> String {
    BASE64_STD.encode(Sha256::digest(der))
}
