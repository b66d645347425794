//! Stripe translation error types

use stripeio_common::{Error as CommonError, ObjectNumber, PolicyError};
use thiserror::Error;

/// Errors specific to stripe translation
#[derive(Debug, Error)]
pub enum StripeError {
    /// No policy was supplied
    #[error("at least one striping policy is required")]
    EmptyPolicySet,

    /// A supplied policy has a zero stripe size or width
    #[error("invalid striping policy at index {index}: {reason}")]
    InvalidPolicy { index: usize, reason: PolicyError },

    /// The request cannot be addressed in a 64-bit signed file offset space
    #[error("invalid byte range: offset {offset}, size {size}")]
    InvalidRange { offset: i64, size: usize },

    /// A recovery backend could not rebuild a fragment
    #[error("recovery of object {object_number} failed: {reason}")]
    RecoveryFailed {
        object_number: ObjectNumber,
        reason: String,
    },
}

impl From<StripeError> for CommonError {
    fn from(e: StripeError) -> Self {
        match e {
            StripeError::EmptyPolicySet | StripeError::InvalidPolicy { .. } => {
                Self::InvalidPolicy(e.to_string())
            }
            StripeError::InvalidRange { .. } => Self::InvalidRange(e.to_string()),
            StripeError::RecoveryFailed { .. } => Self::Recovery(e.to_string()),
        }
    }
}

impl StripeError {
    /// Create a recovery failure for an object
    pub fn recovery_failed(object_number: ObjectNumber, reason: impl Into<String>) -> Self {
        Self::RecoveryFailed {
            object_number,
            reason: reason.into(),
        }
    }
}

/// Result type for stripe translation
pub type StripeResult<T> = Result<T, StripeError>;
