use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tessera_mempool::DEFAULT_CAPACITY;

use crate::errors::ConfigError;

/// Default maximum message size: 50 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 50 * 1024 * 1024;

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:9400";

/// Ingestion server settings.
///
/// Every field has a default, so an empty TOML file is a valid config:
///
/// ```toml
/// listen = "0.0.0.0:9400"
/// max_message_size = 52428800
/// read_timeout_secs = 30
/// write_timeout_secs = 30
/// mempool_capacity = 100000
/// auth_token = "change-me"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Address to listen on.
    pub listen: String,
    /// Largest accepted payload, in bytes.
    pub max_message_size: usize,
    /// Time allowed to receive each message.
    pub read_timeout_secs: u64,
    /// Time allowed to send each response.
    pub write_timeout_secs: u64,
    /// Maximum mempool entries.
    pub mempool_capacity: usize,
    /// Shared token; when set, each connection must authenticate first.
    pub auth_token: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_timeout_secs: 30,
            write_timeout_secs: 30,
            mempool_capacity: DEFAULT_CAPACITY,
            auth_token: None,
        }
    }
}

impl IngestConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size == 0 || self.max_message_size > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "max_message_size must be between 1 and {}",
                u32::MAX
            )));
        }
        if self.read_timeout_secs == 0 || self.write_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.mempool_capacity == 0 {
            return Err(ConfigError::Invalid(
                "mempool_capacity must be at least 1".to_string(),
            ));
        }
        if matches!(&self.auth_token, Some(t) if t.is_empty()) {
            return Err(ConfigError::Invalid("auth_token must not be empty".to_string()));
        }
        Ok(())
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Write timeout as a [`Duration`].
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
