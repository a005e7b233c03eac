//! Sluice Sources - reading the event store
//!
//! The reader is a partitioned parallel scan: the keyspace is divided
//! into N segments and one worker per segment paginates through the
//! store's cursor protocol, filters records by the run's window, and
//! publishes admitted events into a bounded channel.
//!
//! The store itself sits behind the [`EventStore`] trait so the scanner
//! never knows which backend it is draining. Two backends ship in-tree:
//! [`MemoryEventStore`] for tests and scripted failure scenarios, and
//! [`FsEventStore`] for local directories of jsonl files.

mod error;
mod fs;
mod memory;
mod pacer;
mod scanner;
mod store;

pub use error::{SegmentFailure, SourceError};
pub use fs::{FsEventStore, FsSourceError};
pub use memory::MemoryEventStore;
pub use pacer::CapacityPacer;
pub use scanner::{Scanner, ScannerConfig};
pub use store::{EventStore, ScanPage, ScanRequest};
