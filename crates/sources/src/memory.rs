//! In-memory event store
//!
//! Deterministic backend used by tests and scripted failure scenarios:
//! record `i` belongs to segment `i % total_segments`, continuation
//! tokens are offsets into the segment, and errors can be queued per
//! segment to exercise throttle and failure paths.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;
use crate::store::{EventStore, ScanPage, ScanRequest};

/// Read units charged per record, mirroring an eventually-consistent
/// key-value read
const UNITS_PER_RECORD: f64 = 0.5;

/// In-memory [`EventStore`]
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    records: Vec<Value>,
    provisioned_read_units: Option<f64>,
    fail_plan: Mutex<HashMap<usize, VecDeque<SourceError>>>,
}

impl MemoryEventStore {
    /// Create a store over the given records
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            provisioned_read_units: None,
            fail_plan: Mutex::new(HashMap::new()),
        }
    }

    /// Report a provisioned read capacity, enabling budget pacing
    #[must_use]
    pub fn with_provisioned_read_units(mut self, units_per_sec: f64) -> Self {
        self.provisioned_read_units = Some(units_per_sec);
        self
    }

    /// Queue an error for the next scan call on `segment`
    ///
    /// Each scan pops at most one queued error before serving records,
    /// so queueing two throttles makes the segment throttle twice then
    /// succeed.
    pub fn inject_error(&self, segment: usize, error: SourceError) {
        self.fail_plan
            .lock()
            .unwrap()
            .entry(segment)
            .or_default()
            .push_back(error);
    }

    fn segment_records(&self, segment: usize, total_segments: usize) -> Vec<Value> {
        self.records
            .iter()
            .enumerate()
            .filter(|(i, _)| i % total_segments == segment)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn scan(&self, request: ScanRequest) -> Result<ScanPage, SourceError> {
        if request.total_segments == 0 || request.segment >= request.total_segments {
            return Err(SourceError::fatal(format!(
                "segment {} out of range for {} total segments",
                request.segment, request.total_segments
            )));
        }

        if let Some(error) = self
            .fail_plan
            .lock()
            .unwrap()
            .get_mut(&request.segment)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        let records = self.segment_records(request.segment, request.total_segments);
        let offset: usize = match &request.exclusive_start {
            Some(token) => token
                .parse()
                .map_err(|_| SourceError::fatal(format!("bad continuation token '{token}'")))?,
            None => 0,
        };

        let end = (offset + request.limit.max(1)).min(records.len());
        let items: Vec<Value> = records
            .get(offset..end)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        let consumed = items.len() as f64 * UNITS_PER_RECORD;
        let next = (end < records.len()).then(|| end.to_string());

        Ok(ScanPage {
            items,
            next,
            consumed_read_units: Some(consumed),
        })
    }

    async fn provisioned_read_units(&self) -> Option<f64> {
        self.provisioned_read_units
    }
}
