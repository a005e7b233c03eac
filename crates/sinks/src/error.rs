//! Sink error types

use sluice_protocol::ErrorKind;
use thiserror::Error;

/// Errors returned by an object store
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink signaled capacity exhaustion; retried with backoff
    #[error("sink throttled the request")]
    Throttled,

    /// A request failed transiently; retried with backoff
    #[error("transient sink failure: {0}")]
    Transient(String),

    /// The target bucket does not exist; fails the client, no creation
    #[error("bucket '{bucket}' does not exist")]
    BucketMissing {
        /// The probed bucket name
        bucket: String,
    },

    /// A request failed permanently; never retried
    #[error("fatal sink failure: {0}")]
    Fatal(String),
}

impl SinkError {
    /// Create a transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Create a bucket-missing error
    pub fn bucket_missing(bucket: impl Into<String>) -> Self {
        Self::BucketMissing {
            bucket: bucket.into(),
        }
    }

    /// Create a fatal error
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Whether the uploader should retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled | Self::Transient(_))
    }

    /// Taxonomy kind for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Throttled => ErrorKind::SinkThrottled,
            Self::Transient(_) => ErrorKind::SinkTransient,
            Self::BucketMissing { .. } => ErrorKind::BucketMissing,
            Self::Fatal(_) => ErrorKind::SinkFatal,
        }
    }
}
