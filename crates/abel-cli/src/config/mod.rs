//! Configuration management for the Abel CLI
//!
//! Resolved from compiled-in defaults, then `config.toml` in the platform
//! config directory (or the file given with `--config`), then `ABEL_*`
//! environment variables such as `ABEL_API__BASE_URL`.

use crate::error::Result;
use abel_common::{ConfigLoader, ConfigurationError};
use abel_sdk::{AbelClient, ClientBuilder, DEFAULT_API_URL};
use etcetera::{choose_base_strategy, BaseStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// CLI configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CliConfig {
    /// API configuration
    pub api: ApiConfig,

    /// Credential storage configuration
    pub storage: StorageConfig,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the portal API
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Bound on one token refresh exchange in seconds
    pub refresh_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            refresh_timeout_secs: 15,
        }
    }
}

/// Credential storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Credentials file; defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
}

impl ConfigLoader for CliConfig {
    const ENV_PREFIX: &'static str = "ABEL_";
}

impl CliConfig {
    /// Platform config directory, e.g. `~/.config/abel`
    pub fn config_dir() -> Result<PathBuf> {
        let strategy = choose_base_strategy().map_err(|e| ConfigurationError::InvalidValue {
            key: "config_dir".to_string(),
            reason: format!("Failed to determine config directory: {e}"),
        })?;
        Ok(strategy.config_dir().join("abel"))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Resolve the effective configuration
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    debug!("Loading configuration from {}", default_path.display());
                    Self::load(Some(&default_path))?
                } else {
                    Self::load(None)?
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigurationError::InvalidValue {
                key: "api.base_url".to_string(),
                reason: format!("'{base_url}' is not an http(s) URL"),
            });
        }

        for (key, value) in [
            ("api.timeout_secs", self.api.timeout_secs),
            ("api.connect_timeout_secs", self.api.connect_timeout_secs),
            ("api.refresh_timeout_secs", self.api.refresh_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigurationError::InvalidValue {
                    key: key.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Client for the configured portal with persistent credentials
    pub fn build_client(&self) -> Result<AbelClient> {
        let builder = ClientBuilder::default()
            .base_url(self.api.base_url.trim())
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .connect_timeout(Duration::from_secs(self.api.connect_timeout_secs))
            .refresh_timeout(Duration::from_secs(self.api.refresh_timeout_secs));

        let builder = match &self.storage.credentials_path {
            Some(path) => builder.with_credentials_path(path),
            None => builder.with_file_storage(),
        };

        Ok(builder.build()?)
    }
}
