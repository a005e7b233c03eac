//! Source store configuration

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Settings for the event store scan
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Logical name of the event store table (required)
    pub table: String,

    /// Number of parallel scan segments
    /// Default: 8
    pub parallel_segments: usize,

    /// Fraction of the store's provisioned read capacity this run may
    /// consume, in (0.0, 1.0]. Honored when the store reports a
    /// capacity budget, best-effort otherwise.
    /// Default: 0.5
    pub read_throughput_fraction: f64,

    /// Maximum records per scan round-trip
    /// Default: 1000
    pub scan_batch_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            parallel_segments: 8,
            read_throughput_fraction: 0.5,
            scan_batch_size: 1000,
        }
    }
}

impl SourceConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.table.is_empty() {
            return Err(ConfigError::missing("source.table"));
        }
        if self.parallel_segments == 0 {
            return Err(ConfigError::invalid(
                "source.parallel_segments",
                "must be a positive integer",
            ));
        }
        if !(self.read_throughput_fraction > 0.0 && self.read_throughput_fraction <= 1.0) {
            return Err(ConfigError::invalid(
                "source.read_throughput_fraction",
                format!(
                    "must be in (0.0, 1.0], got {}",
                    self.read_throughput_fraction
                ),
            ));
        }
        if self.scan_batch_size == 0 {
            return Err(ConfigError::invalid(
                "source.scan_batch_size",
                "must be a positive integer",
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
        let config: SourceConfig = toml::from_str("table = \"events\"").unwrap();
        assert_eq!(config.parallel_segments, 8);
        assert_eq!(config.read_throughput_fraction, 0.5);
        assert_eq!(config.scan_batch_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_table_fails() {
        let config = SourceConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source.table"));
    }

    #[test]
    fn zero_segments_fail() {
        let config: SourceConfig =
            toml::from_str("table = \"events\"\nparallel_segments = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn fraction_bounds() {
        for fraction in ["0.0", "-0.5", "1.5"] {
            let toml = format!("table = \"events\"\nread_throughput_fraction = {fraction}");
            let config: SourceConfig = toml::from_str(&toml).unwrap();
            assert!(config.validate().is_err(), "fraction {fraction} should fail");
        }

        let config: SourceConfig =
            toml::from_str("table = \"events\"\nread_throughput_fraction = 1.0").unwrap();
        assert!(config.validate().is_ok());
    }
}
