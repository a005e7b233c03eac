//! Sluice Runner - one invocation, end to end
//!
//! The orchestrator wires the scanner, the partitioner and the uploader
//! together for a single run: compute the window, drain the scan into
//! per-client buffers, ship every non-empty buffer, aggregate the
//! outcome into a [`sluice_protocol::RunSummary`] and emit telemetry.
//!
//! All collaborators arrive through an explicit [`RunContext`]; there
//! is no process-level state.

mod context;
mod orchestrator;

pub use context::RunContext;
pub use orchestrator::{handle, run_window, DEADLINE_SAFETY_MARGIN};
