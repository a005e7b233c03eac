//! Window - the half-open UTC interval selecting events for one run

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// A half-open interval `[start, end)` of UTC instants
///
/// The default window for an invocation at instant `t` ends at the top
/// of `t`'s hour and spans the configured number of whole hours before
/// it. Because the window depends only on the invocation hour, retried
/// invocations within the same hour select the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    /// The window of `hours` whole hours preceding `now`'s hour
    ///
    /// `end` is `now` floored to the hour, `start` is `end - hours`.
    pub fn preceding(now: DateTime<Utc>, hours: u32) -> Self {
        // Truncating to a whole hour cannot fail for any representable
        // instant.
        let end = now
            .duration_trunc(TimeDelta::hours(1))
            .unwrap_or(now);
        let start = end - TimeDelta::hours(i64::from(hours.max(1)));
        Self { start, end }
    }

    /// A window with explicit bounds, for backfill runs
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `instant` falls inside the window
    ///
    /// `start` is included, `end` is excluded.
    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Inclusive lower bound
    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound
    #[inline]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The window start formatted for object keys: `YYYY-MM-DD-HH` in UTC
    pub fn key_stamp(&self) -> String {
        self.start.format("%Y-%m-%d-%H").to_string()
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.to_rfc3339(),
            self.end.to_rfc3339()
        )
    }
}
