//! Layered configuration loading
//!
//! Every Abel tool resolves its configuration the same way: compiled-in
//! defaults, then an optional TOML file, then environment variables with a
//! tool-specific prefix (nested keys separated by `__`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Explicitly requested file does not exist
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Figment could not merge or extract the layers
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// A value was present but is not usable
    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Loader shared by every configuration struct
pub trait ConfigLoader: Serialize + DeserializeOwned + Default {
    /// Environment variable prefix, e.g. `ABEL_`
    const ENV_PREFIX: &'static str;

    /// Build the layered figment without extracting it
    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    /// Load from defaults, an optional file and the environment
    ///
    /// A missing file is not an error here; use [`ConfigLoader::load_from_file`]
    /// when the file is required.
    fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        Self::figment(path)
            .extract()
            .map_err(|e| ConfigurationError::ParseError {
                details: e.to_string(),
            })
    }

    /// Load from a file that must exist
    fn load_from_file(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            return Err(ConfigurationError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::load(Some(path))
    }

    /// Render the configuration as pretty TOML
    fn to_toml(&self) -> Result<String, ConfigurationError> {
        toml::to_string_pretty(self).map_err(|e| ConfigurationError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }
}
