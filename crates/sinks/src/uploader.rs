//! Uploader - concurrency-capped, retrying object publisher

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::Utc;
use sluice_metrics::RunMetrics;
use sluice_protocol::{ErrorKind, RetryPolicy};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::SinkError;
use crate::store::{ObjectStore, PutRequest};

/// One buffer ready to ship
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// Owning client, for reporting
    pub client_id: String,
    /// Resolved bucket name
    pub bucket: String,
    /// Resolved object key
    pub key: String,
    /// Serialized payload
    pub body: Bytes,
    /// Content type matching the payload format
    pub content_type: &'static str,
    /// Events in the payload, recorded as object metadata
    pub event_count: u64,
}

/// Why an upload failed
#[derive(Debug, Clone)]
pub struct UploadFailure {
    /// Taxonomy kind
    pub kind: ErrorKind,
    /// Human-readable cause
    pub message: String,
}

/// The outcome of one upload job
#[derive(Debug)]
pub struct UploadOutcome {
    /// Owning client
    pub client_id: String,
    /// Target bucket
    pub bucket: String,
    /// Target key
    pub key: String,
    /// Payload size in bytes
    pub bytes: u64,
    /// Success, or the terminal failure
    pub result: Result<(), UploadFailure>,
}

/// Publishes upload jobs under a concurrency cap
///
/// Bucket existence is probed once per bucket per run and cached.
/// Throttled and transient put failures retry on the shared backoff
/// schedule; everything else fails the client immediately. Jobs
/// observed after cancellation fail with `DeadlineApproaching` while
/// in-flight puts run to completion.
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
    semaphore: Arc<Semaphore>,
    server_side_encryption: String,
    probed: Mutex<HashMap<String, bool>>,
    metrics: Arc<RunMetrics>,
}

impl Uploader {
    /// Create an uploader publishing to `store`
    pub fn new(
        store: Arc<dyn ObjectStore>,
        retry: RetryPolicy,
        max_concurrent_uploads: usize,
        server_side_encryption: String,
        metrics: Arc<RunMetrics>,
    ) -> Self {
        Self {
            store,
            retry,
            semaphore: Arc::new(Semaphore::new(max_concurrent_uploads.max(1))),
            server_side_encryption,
            probed: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// Publish one job, waiting for a concurrency slot first
    pub async fn upload(&self, job: UploadJob, cancel: CancellationToken) -> UploadOutcome {
        let bytes = job.body.len() as u64;

        if cancel.is_cancelled() {
            return self.fail(
                job,
                bytes,
                ErrorKind::DeadlineApproaching,
                "run budget exhausted before dispatch",
            );
        }

        // Closing never happens while the uploader is alive
        let Ok(_permit) = self.semaphore.acquire().await else {
            return self.fail(job, bytes, ErrorKind::SinkFatal, "upload pool closed");
        };

        // Re-check after the wait: the deadline may have fired while
        // this job was queued behind the semaphore.
        if cancel.is_cancelled() {
            return self.fail(
                job,
                bytes,
                ErrorKind::DeadlineApproaching,
                "run budget exhausted while queued",
            );
        }

        match self.bucket_ready(&job.bucket, &cancel).await {
            Ok(true) => {}
            Ok(false) => {
                let message = format!("bucket '{}' does not exist", job.bucket);
                return self.fail(job, bytes, ErrorKind::BucketMissing, message);
            }
            Err(error) => {
                let kind = error.kind();
                return self.fail(job, bytes, kind, error.to_string());
            }
        }

        let mut attempt: u32 = 0;
        loop {
            let request = PutRequest {
                bucket: job.bucket.clone(),
                key: job.key.clone(),
                body: job.body.clone(),
                content_type: job.content_type,
                server_side_encryption: self.server_side_encryption.clone(),
                metadata: object_metadata(job.event_count),
            };

            match self.store.put_object(request).await {
                Ok(()) => {
                    self.metrics.record_object_written(bytes);
                    tracing::info!(
                        client = %job.client_id,
                        bucket = %job.bucket,
                        key = %job.key,
                        bytes,
                        events = job.event_count,
                        "object written"
                    );
                    return UploadOutcome {
                        client_id: job.client_id,
                        bucket: job.bucket,
                        key: job.key,
                        bytes,
                        result: Ok(()),
                    };
                }
                Err(error) if error.is_retryable() && attempt < self.retry.max_retries() => {
                    self.metrics.record_upload_retry();
                    tracing::warn!(
                        client = %job.client_id,
                        bucket = %job.bucket,
                        attempt,
                        %error,
                        "upload backing off"
                    );
                    tokio::select! {
                        _ = self.retry.pause(attempt) => {}
                        _ = cancel.cancelled() => {
                            return self.fail(
                                job,
                                bytes,
                                ErrorKind::DeadlineApproaching,
                                "run budget exhausted during retry backoff",
                            );
                        }
                    }
                    attempt += 1;
                }
                Err(error) => {
                    let kind = error.kind();
                    let message = if attempt > 0 {
                        format!("{error} (after {attempt} retries)")
                    } else {
                        error.to_string()
                    };
                    return self.fail(job, bytes, kind, message);
                }
            }
        }
    }

    /// Probe the bucket, caching the answer for the rest of the run
    async fn bucket_ready(
        &self,
        bucket: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, SinkError> {
        if let Some(known) = self.probed.lock().unwrap().get(bucket) {
            return Ok(*known);
        }

        let mut attempt: u32 = 0;
        let exists = loop {
            match self.store.bucket_exists(bucket).await {
                Ok(exists) => break exists,
                Err(error) if error.is_retryable() && attempt < self.retry.max_retries() => {
                    tokio::select! {
                        _ = self.retry.pause(attempt) => {}
                        _ = cancel.cancelled() => return Err(error),
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        };

        self.probed
            .lock()
            .unwrap()
            .insert(bucket.to_owned(), exists);
        Ok(exists)
    }

    /// Record and build a failed outcome
    fn fail(
        &self,
        job: UploadJob,
        bytes: u64,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> UploadOutcome {
        let message = message.into();
        self.metrics.record_object_failed();
        tracing::warn!(
            client = %job.client_id,
            bucket = %job.bucket,
            key = %job.key,
            %kind,
            %message,
            "upload failed"
        );
        UploadOutcome {
            client_id: job.client_id,
            bucket: job.bucket,
            key: job.key,
            bytes,
            result: Err(UploadFailure { kind, message }),
        }
    }
}

/// Metadata attached to every committed object
fn object_metadata(event_count: u64) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("processing-timestamp".to_owned(), Utc::now().to_rfc3339()),
        ("event-count".to_owned(), event_count.to_string()),
    ])
}

#[cfg(test)]
#[path = "uploader_test.rs"]
mod uploader_test;
