//! Processing and performance configuration

use std::time::Duration;

use serde::Deserialize;
use sluice_protocol::RetryPolicy;

use crate::error::{ConfigError, Result};

/// Window, retry and memory settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Width of the extraction window in whole hours
    /// Default: 1
    pub window_hours: u32,

    /// Retry attempts after the initial try, for source and sink alike
    /// Default: 3
    pub max_retries: u32,

    /// Base delay for exponential backoff with full jitter; delays are
    /// capped at `retry_base_delay_ms * 2^max_retries`
    /// Default: 1000
    pub retry_base_delay_ms: u64,

    /// High-water mark for aggregate buffered bytes; past it the
    /// largest client buffer is shipped early as a chunked object.
    /// 0 (the default) leaves buffering unbounded.
    pub buffer_high_water_bytes: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            window_hours: 1,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            buffer_high_water_bytes: 0,
        }
    }
}

impl ProcessingConfig {
    /// The shared retry policy built from the configured knobs
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    /// The high-water mark, if bounding is enabled
    pub fn high_water_mark(&self) -> Option<usize> {
        (self.buffer_high_water_bytes > 0).then_some(self.buffer_high_water_bytes as usize)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.window_hours == 0 {
            return Err(ConfigError::invalid(
                "processing.window_hours",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Concurrency caps
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Cap on simultaneous sink uploads
    /// Default: 5
    pub max_concurrent_uploads: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: 5,
        }
    }
}

impl PerformanceConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_concurrent_uploads == 0 {
            return Err(ConfigError::invalid(
                "performance.max_concurrent_uploads",
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
        let config: ProcessingConfig = toml::from_str("").unwrap();
        assert_eq!(config.window_hours, 1);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert_eq!(config.high_water_mark(), None);
    }

    #[test]
    fn retry_policy_reflects_knobs() {
        let config: ProcessingConfig =
            toml::from_str("max_retries = 2\nretry_base_delay_ms = 50").unwrap();
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries(), 2);
        assert_eq!(policy.cap(), Duration::from_millis(200));
    }

    #[test]
    fn high_water_mark_is_opt_in() {
        let config: ProcessingConfig =
            toml::from_str("buffer_high_water_bytes = 4096").unwrap();
        assert_eq!(config.high_water_mark(), Some(4096));
    }

    #[test]
    fn zero_window_fails() {
        let config: ProcessingConfig = toml::from_str("window_hours = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_uploads_fail() {
        let config: PerformanceConfig = toml::from_str("max_concurrent_uploads = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
