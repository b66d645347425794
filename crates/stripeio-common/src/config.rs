//! Configuration types for StripeIO
//!
//! Configuration is read from TOML:
//!
//! ```toml
//! [[policies]]
//! stripe_size = 128   # KiB
//! width = 4
//!
//! [reconciliation]
//! mode = "basic"
//! reconstruction = false
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use crate::types::StripingPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration for StripeIO
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Ordered striping policies; the first governs object boundaries
    #[serde(default = "default_policies")]
    pub policies: Vec<StripingPolicy>,
    /// Read reconciliation configuration
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policies: default_policies(),
            reconciliation: ReconciliationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_policies() -> Vec<StripingPolicy> {
    vec![StripingPolicy::DEFAULT]
}

impl Config {
    /// Parse a configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check that the policy set is usable for translation
    pub fn validate(&self) -> Result<()> {
        if self.policies.is_empty() {
            return Err(Error::configuration("at least one striping policy is required"));
        }
        for (index, policy) in self.policies.iter().enumerate() {
            policy
                .validate()
                .map_err(|e| Error::InvalidPolicy(format!("policy {index}: {e}")))?;
        }
        Ok(())
    }
}

/// Which reconciliation variant processes completed reads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationMode {
    /// Pass-through; callers inspect success markers themselves
    #[default]
    Basic,
    /// Failed fragments are handed to a recovery backend
    Redundant,
}

/// Read reconciliation configuration
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Reconciliation variant
    #[serde(default)]
    pub mode: ReconciliationMode,
    /// Attempt reconstruction of failed fragments
    #[serde(default)]
    pub reconstruction: bool,
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
