//! StripeIO Common - Shared types and utilities
//!
//! This crate provides the striping policy descriptor, error definitions,
//! and configuration types used across all StripeIO components.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, LoggingConfig, ReconciliationConfig, ReconciliationMode};
pub use error::{Error, Result};
pub use types::*;
