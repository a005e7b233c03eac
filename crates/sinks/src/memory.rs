//! In-memory object store
//!
//! Test backend with scriptable failures and bookkeeping for probe and
//! concurrency assertions.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SinkError;
use crate::store::{ObjectStore, PutRequest};

/// One committed object
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Payload bytes
    pub body: Bytes,
    /// Content type supplied at put time
    pub content_type: String,
    /// Encryption directive supplied at put time
    pub server_side_encryption: String,
    /// Metadata supplied at put time
    pub metadata: BTreeMap<String, String>,
}

/// In-memory [`ObjectStore`]
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, StoredObject>>>,
    put_fail_plan: Mutex<HashMap<String, VecDeque<SinkError>>>,
    probe_counts: Mutex<HashMap<String, u64>>,
    put_delay: Option<Duration>,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

impl MemoryObjectStore {
    /// Create an empty store with no buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Slow every put down, for concurrency and deadline tests
    #[must_use]
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = Some(delay);
        self
    }

    /// Create a bucket
    pub fn create_bucket(&self, name: impl Into<String>) {
        self.buckets
            .lock()
            .unwrap()
            .entry(name.into())
            .or_default();
    }

    /// Queue an error for the next put into `bucket`
    pub fn inject_put_error(&self, bucket: impl Into<String>, error: SinkError) {
        self.put_fail_plan
            .lock()
            .unwrap()
            .entry(bucket.into())
            .or_default()
            .push_back(error);
    }

    /// The object at `(bucket, key)`, if committed
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets.lock().unwrap().get(bucket)?.get(key).cloned()
    }

    /// Keys committed to `bucket`, in order
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total committed objects across all buckets
    pub fn object_count(&self) -> usize {
        self.buckets
            .lock()
            .unwrap()
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    /// Total probes across all buckets
    pub fn total_probes(&self) -> u64 {
        self.probe_counts.lock().unwrap().values().sum()
    }

    /// How many times `bucket` was probed
    pub fn probe_count(&self, bucket: &str) -> u64 {
        self.probe_counts
            .lock()
            .unwrap()
            .get(bucket)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of puts observed in flight at once
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, SinkError> {
        *self
            .probe_counts
            .lock()
            .unwrap()
            .entry(bucket.to_owned())
            .or_insert(0) += 1;
        Ok(self.buckets.lock().unwrap().contains_key(bucket))
    }

    async fn put_object(&self, request: PutRequest) -> Result<(), SinkError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = self.put_inner(request).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MemoryObjectStore {
    async fn put_inner(&self, request: PutRequest) -> Result<(), SinkError> {
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self
            .put_fail_plan
            .lock()
            .unwrap()
            .get_mut(&request.bucket)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        let mut buckets = self.buckets.lock().unwrap();
        let Some(objects) = buckets.get_mut(&request.bucket) else {
            return Err(SinkError::bucket_missing(request.bucket));
        };

        // Last writer wins
        objects.insert(
            request.key,
            StoredObject {
                body: request.body,
                content_type: request.content_type.to_owned(),
                server_side_encryption: request.server_side_encryption,
                metadata: request.metadata,
            },
        );
        Ok(())
    }
}
