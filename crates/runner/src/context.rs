//! RunContext - everything a run needs, passed explicitly

use std::sync::Arc;

use sluice_config::Config;
use sluice_metrics::TelemetrySink;
use sluice_sinks::ObjectStore;
use sluice_sources::EventStore;

/// The collaborators of one run
///
/// Immutable after construction and freely shared; the orchestrator
/// threads it through every stage instead of reaching for globals.
#[derive(Clone)]
pub struct RunContext {
    /// Validated configuration
    pub config: Arc<Config>,
    /// Event store to scan
    pub source: Arc<dyn EventStore>,
    /// Object store to publish to
    pub sink: Arc<dyn ObjectStore>,
    /// Destination for end-of-run measurements
    pub telemetry: Arc<dyn TelemetrySink>,
}

impl RunContext {
    /// Assemble a context
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn EventStore>,
        sink: Arc<dyn ObjectStore>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            telemetry,
        }
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("table", &self.config.source.table)
            .field("bucket_prefix", &self.config.sink.bucket_prefix)
            .finish_non_exhaustive()
    }
}
