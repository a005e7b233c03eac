//! Sluice Configuration
//!
//! TOML-based configuration loading with sensible defaults. Only
//! `source.table` must be specified; everything else defaults to the
//! values a single-host hourly run wants.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use sluice_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[source]\ntable = \"events\"").unwrap();
//! assert_eq!(config.source.parallel_segments, 8);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [source]
//! table = "events"
//! parallel_segments = 8
//! read_throughput_fraction = 0.5
//! scan_batch_size = 1000
//!
//! [sink]
//! bucket_prefix = "client-events"
//! output_format = "json"
//! server_side_encryption = "AES256"
//!
//! [processing]
//! window_hours = 1
//! max_retries = 3
//! retry_base_delay_ms = 1000
//!
//! [performance]
//! max_concurrent_uploads = 5
//!
//! [log]
//! level = "info"
//! ```
//!
//! Credentials are never configuration; store backends read them from
//! the ambient environment.

mod error;
mod logging;
mod processing;
mod sink;
mod source;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogLevel};
pub use processing::{PerformanceConfig, ProcessingConfig};
pub use sink::SinkConfig;
pub use source::SourceConfig;

/// Main configuration structure
///
/// All sections are optional except the source table; validation runs
/// on every parse and fails fast naming the offending option.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event store scan settings
    pub source: SourceConfig,

    /// Output object settings
    pub sink: SinkConfig,

    /// Window, retry and memory settings
    pub processing: ProcessingConfig,

    /// Concurrency caps
    pub performance: PerformanceConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid
    /// TOML, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.sink.validate()?;
        self.processing.validate()?;
        self.performance.validate()?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_protocol::OutputFormat;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_str("[source]\ntable = \"events\"").unwrap();
        assert_eq!(config.source.table, "events");
        assert_eq!(config.source.parallel_segments, 8);
        assert_eq!(config.sink.output_format, OutputFormat::Json);
        assert_eq!(config.performance.max_concurrent_uploads, 5);
        assert_eq!(config.processing.window_hours, 1);
    }

    #[test]
    fn empty_config_is_rejected() {
        let err = Config::from_str("").unwrap_err();
        assert!(err.to_string().contains("source.table"));
    }

    #[test]
    fn full_config_parses() {
        let toml = r#"
[source]
table = "events"
parallel_segments = 16
read_throughput_fraction = 0.8
scan_batch_size = 500

[sink]
bucket_prefix = "acct-events"
output_format = "jsonl"
server_side_encryption = "aws:kms"

[processing]
window_hours = 2
max_retries = 5
retry_base_delay_ms = 250
buffer_high_water_bytes = 268435456

[performance]
max_concurrent_uploads = 12

[log]
level = "debug"
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.source.parallel_segments, 16);
        assert_eq!(config.sink.bucket_prefix, "acct-events");
        assert_eq!(config.sink.output_format, OutputFormat::Jsonl);
        assert_eq!(config.sink.server_side_encryption, "aws:kms");
        assert_eq!(config.processing.window_hours, 2);
        assert_eq!(config.processing.high_water_mark(), Some(268435456));
        assert_eq!(config.performance.max_concurrent_uploads, 12);
        assert_eq!(config.log.level, LogLevel::Debug);
    }

    #[test]
    fn validation_runs_on_parse() {
        let toml = r#"
[source]
table = "events"
read_throughput_fraction = 2.0
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("read_throughput_fraction"));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_str("invalid { toml"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
