//! Telemetry sink contract
//!
//! At end-of-run the orchestrator converts the RunSummary into named
//! measurements and hands them to whatever sink the context carries.
//! Emission failures are reported back so the caller can log them; they
//! never fail the run.

use async_trait::async_trait;
use sluice_protocol::RunSummary;
use thiserror::Error;

/// One named measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Stable measurement name
    pub name: &'static str,
    /// Value; counters are whole numbers, durations are milliseconds
    pub value: f64,
}

impl Measurement {
    /// Create a measurement
    pub fn new(name: &'static str, value: f64) -> Self {
        Self { name, value }
    }
}

/// Errors delivering measurements to an external sink
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The sink rejected the batch
    #[error("telemetry sink rejected measurements: {0}")]
    Rejected(String),

    /// The sink was unreachable
    #[error("telemetry sink unreachable: {0}")]
    Unreachable(String),
}

/// Destination for end-of-run measurements
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Deliver one run's measurements
    async fn emit(&self, measurements: &[Measurement]) -> Result<(), TelemetryError>;
}

/// The per-run measurement set
pub fn run_measurements(summary: &RunSummary) -> Vec<Measurement> {
    vec![
        Measurement::new("events_scanned", summary.events_scanned as f64),
        Measurement::new("events_in_window", summary.events_in_window as f64),
        Measurement::new("events_rejected", summary.events_rejected as f64),
        Measurement::new("clients_seen", summary.clients_seen as f64),
        Measurement::new("objects_written", summary.objects_written as f64),
        Measurement::new("objects_failed", summary.objects_failed as f64),
        Measurement::new("bytes_written", summary.bytes_written as f64),
        Measurement::new("duration_ms", summary.duration_ms as f64),
        Measurement::new("partial_run", if summary.partial { 1.0 } else { 0.0 }),
    ]
}

/// Telemetry sink that logs measurements through tracing
///
/// The default sink for local runs; an external counter service
/// implements `TelemetrySink` instead.
#[derive(Debug, Default)]
pub struct LogTelemetry;

#[async_trait]
impl TelemetrySink for LogTelemetry {
    async fn emit(&self, measurements: &[Measurement]) -> Result<(), TelemetryError> {
        for m in measurements {
            tracing::info!(measurement = m.name, value = m.value, "run measurement");
        }
        Ok(())
    }
}

/// Telemetry sink that captures measurements in memory, for tests
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    batches: std::sync::Mutex<Vec<Vec<Measurement>>>,
}

impl MemoryTelemetry {
    /// Create an empty capture sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches emitted so far
    pub fn batches(&self) -> Vec<Vec<Measurement>> {
        self.batches.lock().unwrap().clone()
    }

    /// The value of `name` in the most recent batch, if any
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.batches
            .lock()
            .unwrap()
            .last()?
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value)
    }
}

#[async_trait]
impl TelemetrySink for MemoryTelemetry {
    async fn emit(&self, measurements: &[Measurement]) -> Result<(), TelemetryError> {
        self.batches.lock().unwrap().push(measurements.to_vec());
        Ok(())
    }
}
