//! Orchestrator - window, fan-out, fan-in, summary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sluice_metrics::{run_measurements, RunMetrics};
use sluice_pipeline::{serialize, Partitioner};
use sluice_protocol::{ErrorKind, Event, RunSummary, Window};
use sluice_sinks::{bucket_name, object_key, UploadJob, UploadOutcome, Uploader};
use sluice_sources::{Scanner, ScannerConfig, SegmentFailure};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::context::RunContext;

/// Slack between the host deadline and the run budget
pub const DEADLINE_SAFETY_MARGIN: Duration = Duration::from_secs(30);

/// Entry point for scheduled invocations
///
/// The payload is opaque and ignored; the window is derived from the
/// current UTC wall clock, which makes retried invocations within the
/// same hour idempotent. `deadline` is the host's hard stop; the run
/// budgets itself [`DEADLINE_SAFETY_MARGIN`] short of it.
pub async fn handle(
    ctx: &RunContext,
    payload: serde_json::Value,
    deadline: Option<Instant>,
) -> RunSummary {
    tracing::info!(%payload, "invocation received");
    let window = Window::preceding(Utc::now(), ctx.config.processing.window_hours);
    run_window(ctx, window, deadline).await
}

/// Run one explicit window
///
/// The backfill entry: re-running a historical window against a frozen
/// source reproduces its outputs byte for byte.
pub async fn run_window(
    ctx: &RunContext,
    window: Window,
    deadline: Option<Instant>,
) -> RunSummary {
    let started = Instant::now();
    let metrics = Arc::new(RunMetrics::new());
    // Readers and writers cancel separately: a budget that expires
    // while reading stops the scan but still writes what was buffered;
    // one that expires while writing also refuses pending uploads.
    let read_cancel = CancellationToken::new();
    let write_cancel = CancellationToken::new();
    let draining = Arc::new(AtomicBool::new(false));
    let deadline_hit = Arc::new(AtomicBool::new(false));

    tracing::info!(%window, table = %ctx.config.source.table, "run starting");

    let watchdog = deadline.map(|deadline| {
        let read_cancel = read_cancel.clone();
        let write_cancel = write_cancel.clone();
        let draining = Arc::clone(&draining);
        let deadline_hit = Arc::clone(&deadline_hit);
        tokio::spawn(async move {
            let budget_end = deadline
                .checked_sub(DEADLINE_SAFETY_MARGIN)
                .unwrap_or_else(Instant::now);
            tokio::time::sleep_until(budget_end).await;
            deadline_hit.store(true, Ordering::SeqCst);
            read_cancel.cancel();
            if draining.load(Ordering::SeqCst) {
                tracing::warn!("run budget exhausted while writing; cancelling pending uploads");
                write_cancel.cancel();
            } else {
                tracing::warn!("run budget exhausted while reading; draining buffered events");
            }
        })
    });

    let retry = ctx.config.processing.retry_policy();

    let scanner = Scanner::new(
        Arc::clone(&ctx.source),
        ScannerConfig {
            parallel_segments: ctx.config.source.parallel_segments,
            scan_batch_size: ctx.config.source.scan_batch_size,
            read_throughput_fraction: ctx.config.source.read_throughput_fraction,
        },
        retry,
        Arc::clone(&metrics),
    );
    let uploader = Arc::new(Uploader::new(
        Arc::clone(&ctx.sink),
        retry,
        ctx.config.performance.max_concurrent_uploads,
        ctx.config.sink.server_side_encryption.clone(),
        Arc::clone(&metrics),
    ));
    let mut partitioner = Partitioner::new(
        window,
        ctx.config.processing.high_water_mark(),
        Arc::clone(&metrics),
    );

    // Readers publish into a channel sized for one page per worker
    let (tx, mut rx) = mpsc::channel::<Event>(scanner.channel_capacity());
    let scan = tokio::spawn(scanner.run(window, tx, read_cancel.clone()));

    let mut uploads: JoinSet<UploadOutcome> = JoinSet::new();
    let mut serialize_failures: Vec<(String, String)> = Vec::new();

    while let Some(event) = rx.recv().await {
        if let Some(evicted) = partitioner.admit(event) {
            dispatch(
                ctx,
                &uploader,
                &metrics,
                &mut uploads,
                &mut serialize_failures,
                &window,
                evicted.client_id,
                &evicted.events,
                Some(evicted.chunk),
                write_cancel.clone(),
            );
        }
    }
    draining.store(true, Ordering::SeqCst);

    let segment_failures: Vec<SegmentFailure> = match scan.await {
        Ok(failures) => failures,
        Err(join_error) => vec![SegmentFailure {
            segment: ctx.config.source.parallel_segments,
            kind: ErrorKind::SourceFatal,
            message: format!("scan task aborted: {join_error}"),
        }],
    };

    let clients_seen = partitioner.clients_seen();
    let finalized = partitioner.finalize();
    for buffer in &finalized.buffers {
        dispatch(
            ctx,
            &uploader,
            &metrics,
            &mut uploads,
            &mut serialize_failures,
            &window,
            buffer.client_id.clone(),
            &buffer.events,
            buffer.chunk,
            write_cancel.clone(),
        );
    }

    let mut upload_failures: Vec<UploadOutcome> = Vec::new();
    while let Some(joined) = uploads.join_next().await {
        match joined {
            Ok(outcome) if outcome.result.is_ok() => {}
            Ok(outcome) => upload_failures.push(outcome),
            Err(join_error) => {
                metrics.record_object_failed();
                tracing::error!(%join_error, "upload task aborted");
            }
        }
    }

    if let Some(watchdog) = watchdog {
        watchdog.abort();
    }

    let deadline_hit = deadline_hit.load(Ordering::SeqCst);
    let snapshot = metrics.snapshot();
    let mut summary = RunSummary {
        events_scanned: snapshot.events_scanned,
        events_in_window: snapshot.events_in_window,
        events_rejected: snapshot.events_rejected,
        clients_seen,
        per_client: finalized.per_client,
        objects_written: snapshot.objects_written,
        objects_failed: snapshot.objects_failed,
        bytes_written: snapshot.bytes_written,
        duration_ms: started.elapsed().as_millis() as u64,
        partial: !segment_failures.is_empty() || snapshot.objects_failed > 0 || deadline_hit,
        errors: Vec::new(),
    };

    for failure in &segment_failures {
        summary.push_error(
            format!("segment {}", failure.segment),
            failure.kind,
            failure.message.clone(),
        );
    }
    for (client, message) in &serialize_failures {
        summary.push_error(format!("client {client}"), ErrorKind::SinkFatal, message.clone());
    }
    for outcome in &upload_failures {
        if let Err(failure) = &outcome.result {
            summary.push_error(
                format!("client {}", outcome.client_id),
                failure.kind,
                failure.message.clone(),
            );
        }
    }
    if deadline_hit {
        summary.push_error(
            "run",
            ErrorKind::DeadlineApproaching,
            "run budget expired before all work completed",
        );
    }

    emit_telemetry(ctx, &summary).await;

    tracing::info!(
        events_scanned = summary.events_scanned,
        events_in_window = summary.events_in_window,
        events_rejected = summary.events_rejected,
        clients_seen = summary.clients_seen,
        objects_written = summary.objects_written,
        objects_failed = summary.objects_failed,
        bytes_written = summary.bytes_written,
        duration_ms = summary.duration_ms,
        partial = summary.partial,
        "run finished"
    );

    summary
}

/// Serialize one buffer and queue its upload
#[allow(clippy::too_many_arguments)]
fn dispatch(
    ctx: &RunContext,
    uploader: &Arc<Uploader>,
    metrics: &Arc<RunMetrics>,
    uploads: &mut JoinSet<UploadOutcome>,
    serialize_failures: &mut Vec<(String, String)>,
    window: &Window,
    client_id: String,
    events: &[Event],
    chunk: Option<u32>,
    cancel: CancellationToken,
) {
    let format = ctx.config.sink.output_format;
    let body = match serialize(events, format) {
        Ok(body) => body,
        Err(error) => {
            // A buffer that cannot encode fails like a fatal upload
            metrics.record_object_failed();
            tracing::error!(client = %client_id, %error, "failed to serialize buffer");
            serialize_failures.push((client_id, error.to_string()));
            return;
        }
    };

    let job = UploadJob {
        bucket: bucket_name(&ctx.config.sink.bucket_prefix, &client_id),
        key: object_key(window, format, chunk),
        body,
        content_type: format.content_type(),
        event_count: events.len() as u64,
        client_id,
    };

    let uploader = Arc::clone(uploader);
    uploads.spawn(async move { uploader.upload(job, cancel).await });
}

/// Deliver measurements; failure is logged, never fatal
async fn emit_telemetry(ctx: &RunContext, summary: &RunSummary) {
    let measurements = run_measurements(summary);
    if let Err(error) = ctx.telemetry.emit(&measurements).await {
        tracing::warn!(%error, "failed to emit run telemetry");
    }
}
