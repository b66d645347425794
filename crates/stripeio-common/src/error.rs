//! Error types for StripeIO
//!
//! This module defines the common error types used throughout the system.

use crate::types::PolicyError;
use thiserror::Error;

/// Common result type for StripeIO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for StripeIO
#[derive(Debug, Error)]
pub enum Error {
    // Translation errors
    #[error("invalid striping policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid byte range: {0}")]
    InvalidRange(String),

    #[error("fragment recovery failed: {0}")]
    Recovery(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PolicyError> for Error {
    fn from(e: PolicyError) -> Self {
        Self::InvalidPolicy(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Deserialization(e.to_string())
    }
}

impl Error {
    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this error was caused by caller-supplied input
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidPolicy(_) | Self::InvalidRange(_) | Self::Configuration(_)
        )
    }
}
