use crate::error::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(crate) const DEFAULT_ISSUER: &str = "https://localhost:8090";
pub(crate) const DEFAULT_VALIDITY_PERIOD: i64 = 3600;
pub(crate) const DEFAULT_KEY_ID: &str = "default-key";
pub(crate) const DEFAULT_REFRESH_VALIDITY_PERIOD: i64 = 86400;
pub(crate) const DEFAULT_JWKS_TIMEOUT_SECS: u64 = 10;

/// Engine configuration. Every section falls back to its defaults when
/// absent, so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
    pub jwks: JwksConfig,
    pub keys: Vec<KeyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub issuer: String,
    pub validity_period: i64,
    pub preferred_key_id: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            validity_period: DEFAULT_VALIDITY_PERIOD,
            preferred_key_id: DEFAULT_KEY_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub refresh_token: RefreshTokenConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshTokenConfig {
    pub validity_period: i64,
}

impl Default for RefreshTokenConfig {
    fn default() -> Self {
        Self {
            validity_period: DEFAULT_REFRESH_VALIDITY_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwksConfig {
    pub timeout_secs: u64,
}

impl Default for JwksConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_JWKS_TIMEOUT_SECS,
        }
    }
}

impl JwksConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A signing key on disk. Relative paths resolve against the home directory
/// handed to [`crate::PemKeyProvider::from_key_configs`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyConfig {
    pub id: String,
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    pub key_file: PathBuf,
}

impl KeyConfig {
    pub(crate) fn resolve(path: &Path, home: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            home.join(path)
        }
    }
}

impl EngineConfig {
    pub fn from_json_slice(body: &[u8]) -> Result<Self, Error> {
        let config: Self = serde_json::from_slice(body)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.jwt.issuer.trim().is_empty() {
            return Err(Error::Config("jwt.issuer must not be empty".to_string()));
        }
        if self.jwt.validity_period <= 0 {
            return Err(Error::Config(
                "jwt.validity_period must be positive".to_string(),
            ));
        }
        if self.oauth.refresh_token.validity_period < 0 {
            return Err(Error::Config(
                "oauth.refresh_token.validity_period must not be negative".to_string(),
            ));
        }
        if self.jwks.timeout_secs == 0 {
            return Err(Error::Config("jwks.timeout_secs must be positive".to_string()));
        }
        if let Some(key) = self.keys.iter().find(|key| key.id.trim().is_empty()) {
            return Err(Error::Config(format!(
                "key entry for {} has an empty id",
                key.key_file.display()
            )));
        }
        Ok(())
    }
}
