//! The event store contract
//!
//! A store supports a parallel segmented scan: disjoint segments
//! identified by `(segment, total_segments)`, pagination through an
//! opaque continuation token, per-page consumed-capacity reporting and
//! a distinguishable throttle error. Backends bind the table name at
//! construction; the scanner only speaks segments.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;

/// One scan round-trip request
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Zero-based segment index
    pub segment: usize,
    /// Total number of disjoint segments
    pub total_segments: usize,
    /// Maximum records to return
    pub limit: usize,
    /// Continuation token from the previous page, if any
    pub exclusive_start: Option<String>,
}

/// One page of scan results
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Raw records; window filtering happens reader-side
    pub items: Vec<Value>,
    /// Token for the next page; `None` means the segment is exhausted
    pub next: Option<String>,
    /// Read capacity units this page consumed, when the store reports
    /// them
    pub consumed_read_units: Option<f64>,
}

/// A partitioned key-value store the reader can scan
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Fetch one page of the given segment
    async fn scan(&self, request: ScanRequest) -> Result<ScanPage, SourceError>;

    /// Provisioned read capacity in units per second
    ///
    /// `None` means the store reports no budget and the reader scans
    /// best-effort.
    async fn provisioned_read_units(&self) -> Option<f64> {
        None
    }
}
