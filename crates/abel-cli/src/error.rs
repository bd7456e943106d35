//! Error types for the Abel CLI

use color_eyre::eyre::Report;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file issues
    #[error("Configuration error: {0}")]
    Config(#[from] abel_common::ConfigurationError),

    /// API communication errors
    #[error("API error: {0}")]
    Api(#[from] abel_sdk::ApiError),

    /// Bad command-line input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Terminal or file IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl CliError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Hint shown under the error, if any
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Api(e) if e.requires_login() => {
                Some("Your session has ended. Run 'abel login' to sign in again.")
            }
            CliError::Api(e) if e.is_retryable() => {
                Some("Check that the portal API is reachable and try again.")
            }
            CliError::Config(_) => Some("Run 'abel config show' to inspect the effective configuration."),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::Api(abel_sdk::ApiError::Serialization(error))
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(error: dialoguer::Error) -> Self {
        CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, error))
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
