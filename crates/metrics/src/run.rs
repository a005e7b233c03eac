//! Atomic counters for one invocation

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every pool during a run
///
/// All fields use atomics for lock-free updates from the reader and
/// writer tasks.
#[derive(Debug, Default)]
pub struct RunMetrics {
    /// Records seen by the scan, in-window or not
    pub events_scanned: AtomicU64,

    /// Events admitted into the window
    pub events_in_window: AtomicU64,

    /// Records rejected by validation
    pub events_rejected: AtomicU64,

    /// Objects committed to the sink
    pub objects_written: AtomicU64,

    /// Objects that failed to commit
    pub objects_failed: AtomicU64,

    /// Total payload bytes committed
    pub bytes_written: AtomicU64,

    /// Throttle responses observed while scanning
    pub source_throttles: AtomicU64,

    /// Upload attempts beyond the first
    pub upload_retries: AtomicU64,
}

impl RunMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            events_scanned: AtomicU64::new(0),
            events_in_window: AtomicU64::new(0),
            events_rejected: AtomicU64::new(0),
            objects_written: AtomicU64::new(0),
            objects_failed: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            source_throttles: AtomicU64::new(0),
            upload_retries: AtomicU64::new(0),
        }
    }

    /// Record records returned by one scan page
    #[inline]
    pub fn record_scanned(&self, count: u64) {
        self.events_scanned.fetch_add(count, Ordering::Relaxed);
    }

    /// Record an event admitted into the window
    #[inline]
    pub fn record_in_window(&self) {
        self.events_in_window.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected record
    #[inline]
    pub fn record_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed object
    #[inline]
    pub fn record_object_written(&self, bytes: u64) {
        self.objects_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed object
    #[inline]
    pub fn record_object_failed(&self) {
        self.objects_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a throttle response from the source
    #[inline]
    pub fn record_source_throttle(&self) {
        self.source_throttles.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upload retry
    #[inline]
    pub fn record_upload_retry(&self) {
        self.upload_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> RunMetricsSnapshot {
        RunMetricsSnapshot {
            events_scanned: self.events_scanned.load(Ordering::Relaxed),
            events_in_window: self.events_in_window.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            objects_written: self.objects_written.load(Ordering::Relaxed),
            objects_failed: self.objects_failed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            source_throttles: self.source_throttles.load(Ordering::Relaxed),
            upload_retries: self.upload_retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of run metrics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct RunMetricsSnapshot {
    pub events_scanned: u64,
    pub events_in_window: u64,
    pub events_rejected: u64,
    pub objects_written: u64,
    pub objects_failed: u64,
    pub bytes_written: u64,
    pub source_throttles: u64,
    pub upload_retries: u64,
}
