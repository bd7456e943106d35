//! Error types for the Abel SDK

use crate::auth::RefreshError;
use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for portal API calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received
    #[error("Network error: {message}")]
    Network { message: String },

    /// No response within the transport timeout
    #[error("Request timeout")]
    Timeout,

    /// Credential rejected, including after the single replay
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// The refresh exchange failed; the stored credentials were cleared
    #[error("Session expired: {0}")]
    RefreshExchange(#[from] RefreshError),

    /// Authenticated but not permitted
    #[error("Authorization error: {message}")]
    Authorization { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Request could not be built
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Bad request with message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Internal server error or unexpected status
    #[error("Internal server error: {message}")]
    Internal { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credential persistence error
    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Network(message) => ApiError::Network { message },
            TransportError::Timeout => ApiError::Timeout,
        }
    }
}

impl ApiError {
    /// Get error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Network { .. } => "ABEL_SDK_NETWORK_ERROR",
            ApiError::Timeout => "ABEL_SDK_TIMEOUT",
            ApiError::Authentication { .. } => "ABEL_SDK_AUTH_ERROR",
            ApiError::RefreshExchange(_) => "ABEL_SDK_REFRESH_FAILED",
            ApiError::Authorization { .. } => "ABEL_SDK_AUTHZ_ERROR",
            ApiError::RateLimitExceeded => "ABEL_SDK_RATE_LIMIT",
            ApiError::InvalidRequest { .. } => "ABEL_SDK_INVALID_REQUEST",
            ApiError::NotFound { .. } => "ABEL_SDK_NOT_FOUND",
            ApiError::BadRequest { .. } => "ABEL_SDK_BAD_REQUEST",
            ApiError::Internal { .. } => "ABEL_SDK_INTERNAL_ERROR",
            ApiError::Serialization(_) => "ABEL_SDK_SERIALIZATION_ERROR",
            ApiError::Storage(_) => "ABEL_SDK_STORAGE_ERROR",
        }
    }

    /// Check if error is retryable by the caller's own backoff policy
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network { .. } | ApiError::Timeout | ApiError::RateLimitExceeded
        )
    }

    /// Check if error is a client error
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::Authentication { .. }
                | ApiError::Authorization { .. }
                | ApiError::RateLimitExceeded
                | ApiError::InvalidRequest { .. }
                | ApiError::NotFound { .. }
                | ApiError::BadRequest { .. }
        )
    }

    /// The user has to log in again
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::Authentication { .. } | ApiError::RefreshExchange(_)
        )
    }
}

/// Error body returned by the portal API
///
/// `message` is either a single string or a list of validation messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default)]
    pub status_code: Option<u16>,

    #[serde(default)]
    pub message: Option<ErrorMessage>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub path: Option<String>,
}

/// `message` field of an [`ErrorResponse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl ErrorResponse {
    /// Human readable message, falling back to the error name
    pub fn describe(&self) -> Option<String> {
        match &self.message {
            Some(ErrorMessage::Single(message)) => Some(message.clone()),
            Some(ErrorMessage::Many(messages)) if !messages.is_empty() => {
                Some(messages.join("; "))
            }
            _ => self.error.clone(),
        }
    }
}
