//! Scanner - parallel segmented scan feeding the partitioner
//!
//! One worker per segment paginates through the store, filters by the
//! run window and publishes admitted events into a bounded channel.
//! Throttles and transient failures back off on the shared retry
//! schedule; a segment that exhausts its retries or hits a fatal error
//! is reported as failed while the other segments keep going.

use std::sync::Arc;

use sluice_metrics::RunMetrics;
use sluice_protocol::{Event, RetryPolicy, Window};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{SegmentFailure, SourceError};
use crate::pacer::CapacityPacer;
use crate::store::{EventStore, ScanRequest};

/// Scan fan-out and budget settings
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Number of disjoint segments scanned concurrently
    pub parallel_segments: usize,
    /// Maximum records per round-trip
    pub scan_batch_size: usize,
    /// Fraction of the store's provisioned read capacity to consume
    pub read_throughput_fraction: f64,
}

/// Parallel segmented reader
pub struct Scanner {
    store: Arc<dyn EventStore>,
    config: ScannerConfig,
    retry: RetryPolicy,
    metrics: Arc<RunMetrics>,
}

impl Scanner {
    /// Create a scanner over `store`
    pub fn new(
        store: Arc<dyn EventStore>,
        config: ScannerConfig,
        retry: RetryPolicy,
        metrics: Arc<RunMetrics>,
    ) -> Self {
        Self {
            store,
            config,
            retry,
            metrics,
        }
    }

    /// Channel capacity giving every worker one page of headroom
    pub fn channel_capacity(&self) -> usize {
        (self.config.parallel_segments * self.config.scan_batch_size).max(1)
    }

    /// Scan the whole keyspace for `window`, publishing into `tx`
    ///
    /// Resolves once every segment finished or failed; dropping the
    /// last sender closes the channel, which is how the consumer learns
    /// the scan is over. Cancellation stops workers from requesting new
    /// pages; records already fetched are still delivered.
    pub async fn run(
        self,
        window: Window,
        tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) -> Vec<SegmentFailure> {
        let total_segments = self.config.parallel_segments;
        let pacer = self.build_pacer().await;

        tracing::info!(
            segments = total_segments,
            batch_size = self.config.scan_batch_size,
            paced = pacer.is_some(),
            %window,
            "scan starting"
        );

        let mut workers = JoinSet::new();
        for segment in 0..total_segments {
            let worker = SegmentWorker {
                store: Arc::clone(&self.store),
                segment,
                total_segments,
                limit: self.config.scan_batch_size,
                window,
                retry: self.retry,
                pacer: pacer.clone(),
                metrics: Arc::clone(&self.metrics),
                tx: tx.clone(),
                cancel: cancel.clone(),
            };
            workers.spawn(worker.run());
        }
        // Workers hold the remaining senders
        drop(tx);

        let mut failures = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => {
                    tracing::error!(
                        segment = failure.segment,
                        kind = %failure.kind,
                        message = %failure.message,
                        "segment failed"
                    );
                    failures.push(failure);
                }
                Err(join_error) => {
                    // A panicked worker is a fatal segment outcome too
                    failures.push(SegmentFailure {
                        segment: total_segments,
                        kind: sluice_protocol::ErrorKind::SourceFatal,
                        message: format!("scan worker aborted: {join_error}"),
                    });
                }
            }
        }

        tracing::info!(
            failed_segments = failures.len(),
            events_in_window = self
                .metrics
                .events_in_window
                .load(std::sync::atomic::Ordering::Relaxed),
            "scan finished"
        );
        failures
    }

    /// Build the capacity pacer when the store reports a budget
    async fn build_pacer(&self) -> Option<Arc<CapacityPacer>> {
        let provisioned = self.store.provisioned_read_units().await?;
        if provisioned <= 0.0 {
            return None;
        }
        let budget = provisioned * self.config.read_throughput_fraction;
        Some(Arc::new(CapacityPacer::new(budget)))
    }
}

/// One segment's pagination loop
struct SegmentWorker {
    store: Arc<dyn EventStore>,
    segment: usize,
    total_segments: usize,
    limit: usize,
    window: Window,
    retry: RetryPolicy,
    pacer: Option<Arc<CapacityPacer>>,
    metrics: Arc<RunMetrics>,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

impl SegmentWorker {
    async fn run(self) -> Result<(), SegmentFailure> {
        let mut exclusive_start: Option<String> = None;
        // Consecutive retryable failures; reset by any success
        let mut attempt: u32 = 0;
        let mut delivered: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!(segment = self.segment, "scan cancelled");
                return Ok(());
            }

            if let Some(pacer) = &self.pacer {
                pacer.pace().await;
            }

            let request = ScanRequest {
                segment: self.segment,
                total_segments: self.total_segments,
                limit: self.limit,
                exclusive_start: exclusive_start.clone(),
            };

            match self.store.scan(request).await {
                Ok(page) => {
                    attempt = 0;

                    if let (Some(pacer), Some(units)) = (&self.pacer, page.consumed_read_units) {
                        pacer.record(units);
                    }
                    self.metrics.record_scanned(page.items.len() as u64);

                    for item in page.items {
                        match Event::parse(item) {
                            Ok(event) if self.window.contains(event.timestamp()) => {
                                self.metrics.record_in_window();
                                delivered += 1;
                                if self.tx.send(event).await.is_err() {
                                    // Consumer went away; nothing left to do
                                    return Ok(());
                                }
                            }
                            Ok(_) => {} // out of window: scanned, not forwarded
                            Err(error) => {
                                self.metrics.record_rejected();
                                tracing::debug!(
                                    segment = self.segment,
                                    %error,
                                    "rejected malformed record"
                                );
                            }
                        }
                    }

                    match page.next {
                        Some(token) => exclusive_start = Some(token),
                        None => break,
                    }
                }
                Err(error) if error.is_retryable() => {
                    if matches!(error, SourceError::Throttled) {
                        self.metrics.record_source_throttle();
                    }
                    if attempt >= self.retry.max_retries() {
                        return Err(SegmentFailure {
                            segment: self.segment,
                            kind: error.kind(),
                            message: format!(
                                "giving up after {} consecutive failures: {error}",
                                attempt + 1
                            ),
                        });
                    }
                    tracing::warn!(
                        segment = self.segment,
                        attempt,
                        %error,
                        "scan backing off"
                    );
                    tokio::select! {
                        _ = self.retry.pause(attempt) => {}
                        _ = self.cancel.cancelled() => return Ok(()),
                    }
                    attempt += 1;
                }
                Err(error) => {
                    return Err(SegmentFailure {
                        segment: self.segment,
                        kind: error.kind(),
                        message: error.to_string(),
                    });
                }
            }
        }

        tracing::debug!(segment = self.segment, delivered, "segment complete");
        Ok(())
    }
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod scanner_test;
