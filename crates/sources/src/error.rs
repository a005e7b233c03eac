//! Source error types

use sluice_protocol::ErrorKind;
use thiserror::Error;

/// Errors returned by an event store
#[derive(Debug, Error)]
pub enum SourceError {
    /// The store signaled capacity exhaustion; retried with backoff
    #[error("source throttled the request")]
    Throttled,

    /// A request failed transiently; retried with backoff
    #[error("transient source failure: {0}")]
    Transient(String),

    /// A request failed permanently; fatal for the segment
    #[error("fatal source failure: {0}")]
    Fatal(String),
}

impl SourceError {
    /// Create a transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Create a fatal error
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Whether the scanner should retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled | Self::Transient(_))
    }

    /// Taxonomy kind for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Throttled => ErrorKind::SourceThrottled,
            Self::Transient(_) => ErrorKind::SourceTransient,
            Self::Fatal(_) => ErrorKind::SourceFatal,
        }
    }
}

/// A segment that stopped before exhausting its keyspace
///
/// Other segments keep scanning; the run is flagged partial.
#[derive(Debug, Clone)]
pub struct SegmentFailure {
    /// Which segment failed
    pub segment: usize,
    /// Taxonomy kind of the terminal error
    pub kind: ErrorKind,
    /// Human-readable cause
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(SourceError::Throttled.is_retryable());
        assert!(SourceError::transient("socket reset").is_retryable());
        assert!(!SourceError::fatal("segment out of range").is_retryable());
    }

    #[test]
    fn kinds_map_to_the_taxonomy() {
        assert_eq!(SourceError::Throttled.kind(), ErrorKind::SourceThrottled);
        assert_eq!(
            SourceError::transient("x").kind(),
            ErrorKind::SourceTransient
        );
        assert_eq!(SourceError::fatal("x").kind(), ErrorKind::SourceFatal);
    }
}
