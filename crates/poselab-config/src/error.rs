//! # Design
//!
//! - Provide structured, constant-message errors for configuration loading.
//! - Capture the offending variable and value so failures are reproducible.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that failed to parse.
    #[error("invalid environment value")]
    InvalidValue {
        /// Name of the environment variable.
        name: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },
    /// A configuration field failed validation.
    #[error("invalid configuration")]
    InvalidConfig {
        /// Field name that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) fn invalid_value(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            value: value.into(),
        }
    }

    pub(crate) const fn invalid_config(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::InvalidConfig {
            field,
            reason,
            value,
        }
    }
}
