//! delegate.toml configuration parser.
//!
//! The engine settings are read once at process start and handed to every
//! component constructor as an immutable [`EngineConfig`].

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DelegateError, DelegateResult};

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_BASE_PATH: &str = "/vmturbo/rest";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_USERNAME: &str = "administrator";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateConfig {
    pub engine: EngineConfig,
}

/// Connection settings for the external placement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `http` or `https`.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Host (and optional port) of the engine.
    pub address: String,
    /// Prefix of the engine's REST API.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Address the engine uses to identify this deployment inside
    /// datacenter and template identifiers.
    pub target_address: String,
    /// Per-request timeout applied to every engine call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub password: SecretString,
    /// Verify the engine's TLS certificate.
    #[serde(default)]
    pub verify_ssl: bool,
}

impl DelegateConfig {
    pub fn from_file(path: &Path) -> DelegateResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DelegateError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> DelegateResult<Self> {
        let config: DelegateConfig =
            toml::from_str(content).map_err(|e| DelegateError::Config(e.to_string()))?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Render back to delegate.toml form. The password is written in clear.
    pub fn to_toml_string(&self) -> DelegateResult<String> {
        toml::to_string_pretty(self).map_err(|e| DelegateError::Config(e.to_string()))
    }
}

impl EngineConfig {
    /// Build a config with defaults for everything but the addressing and
    /// credentials.
    pub fn new(
        address: impl Into<String>,
        target_address: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            protocol: default_protocol(),
            address: address.into(),
            base_path: default_base_path(),
            target_address: target_address.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            username: default_username(),
            password: SecretString::from(password.into()),
            verify_ssl: false,
        }
    }

    pub fn validate(&self) -> DelegateResult<()> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(DelegateError::Config(format!(
                "unsupported protocol: {}",
                self.protocol
            )));
        }
        if self.address.trim().is_empty() {
            return Err(DelegateError::Config("engine address is empty".to_string()));
        }
        if self.target_address.trim().is_empty() {
            return Err(DelegateError::Config("target address is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(DelegateError::Config("timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    /// Root of the engine's REST API, without a trailing slash.
    pub fn rest_endpoint(&self) -> String {
        let base_path = self.base_path.trim_matches('/');
        let address = self.address.trim_end_matches('/');
        if base_path.is_empty() {
            format!("{}://{address}", self.protocol)
        } else {
            format!("{}://{address}/{base_path}", self.protocol)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}
