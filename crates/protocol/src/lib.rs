//! Sluice Protocol - Core types shared across the pipeline
//!
//! This crate provides the types that flow between the reader, the
//! partitioner, the writer and the orchestrator:
//! - `Event` - one source record with its extracted partition key and instant
//! - `Window` - the half-open UTC interval selecting events for one run
//! - `RunSummary` - the per-invocation result document
//! - `ErrorKind` - the run-level error taxonomy
//! - `RetryPolicy` - the single backoff schedule shared by every retry path

mod event;
mod format;
mod retry;
mod summary;
mod window;

pub use event::{Event, EventError};
pub use format::OutputFormat;
pub use retry::RetryPolicy;
pub use summary::{ErrorDetail, ErrorKind, RunSummary, MAX_ERROR_DETAILS};
pub use window::Window;
