//! RetryPolicy - the shared backoff schedule
//!
//! Source retry, sink retry and throttle waits all use the same
//! exponential full-jitter schedule, so the knobs live in one value
//! instead of three code paths.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with full jitter
///
/// The delay before retry attempt `n` (zero-based) is drawn uniformly
/// from `[0, min(base * 2^n, cap)]`, where `cap = base * 2^max_retries`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Build a policy from the configured knobs
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Maximum retry attempts after the initial try
    #[inline]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound any single delay is capped to
    pub fn cap(&self) -> Duration {
        self.base_delay
            .saturating_mul(1u32.checked_shl(self.max_retries).unwrap_or(u32::MAX))
    }

    /// The jittered delay for a zero-based retry attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let ceiling = exp.min(self.cap());
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        let nanos = rand::rng().random_range(0..=ceiling.as_nanos());
        Duration::from_nanos(nanos.min(u128::from(u64::MAX)) as u64)
    }

    /// Sleep for the jittered delay of `attempt`
    pub async fn pause(&self, attempt: u32) {
        let delay = self.delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
