//! Sluice Metrics
//!
//! Lock-free run counters shared by the reader, partitioner and writer
//! pools, plus the end-of-run telemetry sink contract.
//!
//! # Design
//!
//! - Counters use atomics; every pool holds the same `Arc<RunMetrics>`
//!   and updates are `Relaxed` fetch-adds
//! - `snapshot()` returns a `Copy` struct safe to serialize or log
//! - Telemetry delivery failures are the caller's to log; they never
//!   fail a run

mod run;
mod telemetry;

pub use run::{RunMetrics, RunMetricsSnapshot};
pub use telemetry::{
    run_measurements, LogTelemetry, Measurement, MemoryTelemetry, TelemetryError, TelemetrySink,
};
