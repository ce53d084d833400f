//! Error types for the ad server.

use thiserror::Error;

use crate::ads::StoreError;

/// Main error type for ad server operations.
#[derive(Error, Debug)]
pub enum AdServerError {
    /// Ad store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request input rejected before reaching the store
    #[error("{0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure surfaced by a repository implementation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdServerError {
    /// Whether this error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdServerError::Store(StoreError::NotFound { .. }))
    }
}

impl From<::config::ConfigError> for AdServerError {
    fn from(err: ::config::ConfigError) -> Self {
        AdServerError::Config(err.to_string())
    }
}

/// Result type alias for ad server operations.
pub type Result<T> = std::result::Result<T, AdServerError>;
