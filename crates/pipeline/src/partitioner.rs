//! Partitioner - per-client buffers with bounded-memory eviction

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sluice_metrics::RunMetrics;
use sluice_protocol::{Event, Window};

/// One client's accumulated events
#[derive(Debug, Default)]
struct PartitionBuffer {
    events: Vec<Event>,
    bytes: usize,
}

impl PartitionBuffer {
    fn push(&mut self, event: Event) {
        self.bytes += event.encoded_len();
        self.events.push(event);
    }
}

/// A buffer shipped early because the high-water mark was crossed
#[derive(Debug)]
pub struct EvictedBuffer {
    /// Owning client
    pub client_id: String,
    /// Events ordered by `(time, event_id)`
    pub events: Vec<Event>,
    /// Zero-based chunk index for the object key
    pub chunk: u32,
}

/// One client's final buffer at the end of a run
#[derive(Debug)]
pub struct FinalizedBuffer {
    /// Owning client
    pub client_id: String,
    /// Events ordered by `(time, event_id)`
    pub events: Vec<Event>,
    /// Chunk index when earlier buffers were evicted for this client;
    /// `None` means the client fits in a single unchunked object
    pub chunk: Option<u32>,
}

/// Everything the writer needs once the scan is drained
#[derive(Debug)]
pub struct Finalized {
    /// Non-empty buffers, ordered by client for deterministic dispatch
    pub buffers: Vec<FinalizedBuffer>,
    /// Admitted event count per client, evicted events included
    pub per_client: BTreeMap<String, u64>,
}

/// Groups in-window events by client
///
/// Owned by a single context; every mutation is serialized through it.
/// With a high-water mark configured, crossing it evicts the largest
/// buffer so aggregate buffered bytes stay bounded.
pub struct Partitioner {
    window: Window,
    high_water: Option<usize>,
    buffers: HashMap<String, PartitionBuffer>,
    admitted: HashMap<String, u64>,
    next_chunk: HashMap<String, u32>,
    buffered_bytes: usize,
    metrics: Arc<RunMetrics>,
}

impl Partitioner {
    /// Create a partitioner for one run
    pub fn new(window: Window, high_water: Option<usize>, metrics: Arc<RunMetrics>) -> Self {
        Self {
            window,
            high_water,
            buffers: HashMap::new(),
            admitted: HashMap::new(),
            next_chunk: HashMap::new(),
            buffered_bytes: 0,
            metrics,
        }
    }

    /// Admit one event into its client's buffer
    ///
    /// The window predicate is re-checked here even though the reader
    /// already filtered; an out-of-window event is rejected and
    /// counted. Returns a buffer to ship early when the high-water mark
    /// was crossed.
    pub fn admit(&mut self, event: Event) -> Option<EvictedBuffer> {
        if !self.window.contains(event.timestamp()) {
            self.metrics.record_rejected();
            tracing::debug!(
                client = event.client_id(),
                timestamp = %event.timestamp(),
                "rejected out-of-window event at admission"
            );
            return None;
        }

        let client_id = event.client_id().to_owned();
        self.buffered_bytes += event.encoded_len();
        *self.admitted.entry(client_id.clone()).or_insert(0) += 1;
        self.buffers.entry(client_id).or_default().push(event);

        match self.high_water {
            Some(mark) if self.buffered_bytes > mark => self.evict_largest(),
            _ => None,
        }
    }

    /// Distinct clients observed so far
    pub fn clients_seen(&self) -> u64 {
        self.admitted.len() as u64
    }

    /// Aggregate bytes currently buffered
    pub fn buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    /// Drain the largest buffer as the client's next chunk
    fn evict_largest(&mut self) -> Option<EvictedBuffer> {
        let client_id = self
            .buffers
            .iter()
            .max_by_key(|(_, buffer)| buffer.bytes)
            .map(|(client, _)| client.clone())?;

        let buffer = self.buffers.remove(&client_id)?;
        self.buffered_bytes -= buffer.bytes;

        let chunk_slot = self.next_chunk.entry(client_id.clone()).or_insert(0);
        let chunk = *chunk_slot;
        *chunk_slot += 1;

        tracing::debug!(
            client = %client_id,
            chunk,
            bytes = buffer.bytes,
            events = buffer.events.len(),
            "evicting buffer over high-water mark"
        );

        let mut events = buffer.events;
        sort_for_output(&mut events);
        Some(EvictedBuffer {
            client_id,
            events,
            chunk,
        })
    }

    /// Return all non-empty buffers and clear internal state
    pub fn finalize(self) -> Finalized {
        let Self {
            buffers,
            admitted,
            mut next_chunk,
            ..
        } = self;

        let mut finalized: Vec<FinalizedBuffer> = buffers
            .into_iter()
            .filter(|(_, buffer)| !buffer.events.is_empty())
            .map(|(client_id, buffer)| {
                let chunk = next_chunk.remove(&client_id);
                let mut events = buffer.events;
                sort_for_output(&mut events);
                FinalizedBuffer {
                    client_id,
                    events,
                    chunk,
                }
            })
            .collect();
        finalized.sort_by(|a, b| a.client_id.cmp(&b.client_id));

        let per_client = admitted.into_iter().collect();
        Finalized {
            buffers: finalized,
            per_client,
        }
    }
}

/// Deterministic per-object event order
///
/// Sorted by instant, tie-broken by event id, so a re-run against a
/// frozen source writes byte-identical objects no matter how the
/// parallel scan interleaved.
fn sort_for_output(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.event_id().cmp(&b.event_id()))
    });
}

#[cfg(test)]
#[path = "partitioner_test.rs"]
mod partitioner_test;
