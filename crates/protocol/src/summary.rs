//! RunSummary - the per-invocation result document
//!
//! Returned to the caller and mirrored into telemetry. Per-item and
//! per-client failures are recovered locally and surface here as
//! counters plus a bounded list of error details.

use std::collections::BTreeMap;

use serde::Serialize;

/// Cap on the number of error details carried by a summary
pub const MAX_ERROR_DETAILS: usize = 32;

/// Run-level error taxonomy
///
/// Kinds, not types: each concrete error in the pipeline maps onto one
/// of these for reporting and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Configuration rejected before any work started
    ConfigInvalid,
    /// Source store signaled capacity exhaustion
    SourceThrottled,
    /// Source request failed transiently
    SourceTransient,
    /// A scan segment failed permanently
    SourceFatal,
    /// A record failed validation
    EventMalformed,
    /// Sink signaled capacity exhaustion
    SinkThrottled,
    /// Sink request failed transiently
    SinkTransient,
    /// The client's bucket does not exist
    BucketMissing,
    /// An upload failed permanently
    SinkFatal,
    /// The run budget expired before the work finished
    DeadlineApproaching,
}

impl ErrorKind {
    /// Stable name used in logs and telemetry
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigInvalid => "config_invalid",
            Self::SourceThrottled => "source_throttled",
            Self::SourceTransient => "source_transient",
            Self::SourceFatal => "source_fatal",
            Self::EventMalformed => "event_malformed",
            Self::SinkThrottled => "sink_throttled",
            Self::SinkTransient => "sink_transient",
            Self::BucketMissing => "bucket_missing",
            Self::SinkFatal => "sink_fatal",
            Self::DeadlineApproaching => "deadline_approaching",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recovered failure, scoped to the segment or client it hit
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Where the failure happened, e.g. `segment 3` or `client acme`
    pub scope: String,
    /// Taxonomy kind
    pub kind: ErrorKind,
    /// Human-readable cause
    pub message: String,
}

/// Per-invocation record of what the run did
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Records seen by the scan, in-window or not
    pub events_scanned: u64,
    /// Events admitted into the window
    pub events_in_window: u64,
    /// Records rejected by validation
    pub events_rejected: u64,
    /// Distinct clients observed
    pub clients_seen: u64,
    /// Admitted event count per client
    pub per_client: BTreeMap<String, u64>,
    /// Objects committed to the sink
    pub objects_written: u64,
    /// Objects that failed to commit
    pub objects_failed: u64,
    /// Total payload bytes committed
    pub bytes_written: u64,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// Whether any segment or client failed while others succeeded
    pub partial: bool,
    /// Bounded list of recovered failures
    pub errors: Vec<ErrorDetail>,
}

impl RunSummary {
    /// Record a recovered failure, dropping details past the cap
    ///
    /// The counters always reflect every failure; only the detail list
    /// is bounded.
    pub fn push_error(&mut self, scope: impl Into<String>, kind: ErrorKind, message: impl Into<String>) {
        if self.errors.len() < MAX_ERROR_DETAILS {
            self.errors.push(ErrorDetail {
                scope: scope.into(),
                kind,
                message: message.into(),
            });
        }
    }
}
