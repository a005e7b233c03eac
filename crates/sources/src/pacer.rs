//! Read-budget pacing
//!
//! When the store reports provisioned capacity, the worker pool keeps
//! its consumption under `fraction * provisioned_rate`, measured over a
//! sliding window, by pausing before requests whenever the window is
//! saturated.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Width of the sliding consumption window
const PACING_WINDOW: Duration = Duration::from_secs(10);

/// Minimum pause when the budget is exhausted
const MIN_PAUSE: Duration = Duration::from_millis(25);

/// Sliding-window governor for consumed read units
///
/// Shared by all segment workers; `record` after each page, `pace`
/// before each request.
#[derive(Debug)]
pub struct CapacityPacer {
    /// Allowed units per second
    budget_per_sec: f64,
    /// (instant, units) samples inside the window
    samples: Mutex<VecDeque<(Instant, f64)>>,
}

impl CapacityPacer {
    /// Create a pacer allowing `budget_per_sec` units per second
    pub fn new(budget_per_sec: f64) -> Self {
        Self {
            budget_per_sec,
            samples: Mutex::new(VecDeque::new()),
        }
    }

    /// Record units consumed by one scan page
    pub fn record(&self, units: f64) {
        if units <= 0.0 {
            return;
        }
        let now = Instant::now();
        let mut samples = self.samples.lock().unwrap();
        Self::prune(&mut samples, now);
        samples.push_back((now, units));
    }

    /// Wait until the sliding window has budget for another request
    pub async fn pace(&self) {
        loop {
            let wait = {
                let now = Instant::now();
                let mut samples = self.samples.lock().unwrap();
                Self::prune(&mut samples, now);

                let consumed: f64 = samples.iter().map(|(_, units)| units).sum();
                let allowance = self.budget_per_sec * PACING_WINDOW.as_secs_f64();
                if consumed < allowance {
                    None
                } else {
                    // Wait for the oldest sample to leave the window
                    samples
                        .front()
                        .map(|(at, _)| (*at + PACING_WINDOW).saturating_duration_since(now))
                }
            };

            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay.max(MIN_PAUSE)).await,
            }
        }
    }

    fn prune(samples: &mut VecDeque<(Instant, f64)>, now: Instant) {
        while let Some((at, _)) = samples.front() {
            if now.saturating_duration_since(*at) > PACING_WINDOW {
                samples.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn under_budget_does_not_pause() {
        let pacer = CapacityPacer::new(100.0);
        pacer.record(10.0);
        // Must return without any sleep; a generous timeout guards
        // against regressions.
        tokio::time::timeout(Duration::from_millis(50), pacer.pace())
            .await
            .expect("pace should not block under budget");
    }

    #[tokio::test(start_paused = true)]
    async fn over_budget_waits_for_the_window() {
        let pacer = CapacityPacer::new(1.0); // 10 units per window
        pacer.record(50.0);

        let before = Instant::now();
        pacer.pace().await;
        // The only sample must age out of the 10s window first.
        assert!(before.elapsed() >= Duration::from_secs(10) - Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn consumption_ages_out() {
        let pacer = CapacityPacer::new(1.0);
        pacer.record(50.0);
        tokio::time::sleep(Duration::from_secs(11)).await;

        let before = Instant::now();
        pacer.pace().await;
        assert!(before.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn zero_units_are_ignored() {
        let pacer = CapacityPacer::new(1.0);
        pacer.record(0.0);
        pacer.record(-5.0);
        assert!(pacer.samples.lock().unwrap().is_empty());
    }
}
