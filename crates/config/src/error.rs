//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
///
/// Validation errors always name the offending option so a bad
/// deployment fails fast with an actionable message.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A required option is absent or empty
    #[error("required option '{option}' is missing")]
    MissingOption {
        /// Dotted option path, e.g. `source.table`
        option: &'static str,
    },

    /// An option has a value outside its allowed range
    #[error("option '{option}' is invalid: {reason}")]
    InvalidOption {
        /// Dotted option path
        option: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create a MissingOption error
    pub fn missing(option: &'static str) -> Self {
        Self::MissingOption { option }
    }

    /// Create an InvalidOption error
    pub fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}
