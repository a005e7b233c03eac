//! Sluice Pipeline - grouping events by client
//!
//! The partitioner is the memory ceiling of the pipeline: it owns every
//! in-flight event between the scan and the upload. It runs in a single
//! owner context, is CPU-bound only, and supports a bounded mode where
//! crossing a high-water mark ships the largest client buffer early as
//! a chunked object.
//!
//! Serialization is separate from buffering: [`serialize`] turns an
//! ordered event slice into the payload bytes for any supported format.

mod partitioner;
mod serialize;

pub use partitioner::{EvictedBuffer, Finalized, FinalizedBuffer, Partitioner};
pub use serialize::{serialize, SerializeError};
