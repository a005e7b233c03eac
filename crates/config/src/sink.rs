//! Object store (sink) configuration

use serde::Deserialize;
use sluice_protocol::OutputFormat;

use crate::error::{ConfigError, Result};

/// Settings for per-client output objects
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Bucket name prefix; client `c` writes to `{prefix}-{c}`
    /// (normalized). Default: "client-events"
    pub bucket_prefix: String,

    /// Serialization format for output objects
    /// Default: json
    pub output_format: OutputFormat,

    /// Server-side encryption directive forwarded on every put
    /// Default: "AES256"
    pub server_side_encryption: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            bucket_prefix: "client-events".into(),
            output_format: OutputFormat::Json,
            server_side_encryption: "AES256".into(),
        }
    }
}

impl SinkConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.bucket_prefix.is_empty() {
            return Err(ConfigError::invalid(
                "sink.bucket_prefix",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config: SinkConfig = toml::from_str("").unwrap();
        assert_eq!(config.bucket_prefix, "client-events");
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.server_side_encryption, "AES256");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn format_parses() {
        let config: SinkConfig = toml::from_str("output_format = \"csv\"").unwrap();
        assert_eq!(config.output_format, OutputFormat::Csv);
    }

    #[test]
    fn unknown_format_is_a_parse_error() {
        assert!(toml::from_str::<SinkConfig>("output_format = \"xml\"").is_err());
    }

    #[test]
    fn empty_prefix_fails() {
        let config: SinkConfig = toml::from_str("bucket_prefix = \"\"").unwrap();
        assert!(config.validate().is_err());
    }
}
