//! Sluice Sinks - shipping per-client objects
//!
//! Each non-empty partition buffer becomes one object in the owning
//! client's bucket. The writer verifies bucket existence once per
//! bucket per run, uploads under a concurrency cap, and retries
//! transient failures on the shared backoff schedule. A missing bucket
//! fails that client only; other clients keep uploading.
//!
//! The object store sits behind the [`ObjectStore`] trait. Two backends
//! ship in-tree: [`MemoryObjectStore`] for tests and
//! [`FsObjectStore`] for local directory-per-bucket runs.

mod error;
mod fs;
mod memory;
mod naming;
mod store;
mod uploader;

pub use error::SinkError;
pub use fs::FsObjectStore;
pub use memory::{MemoryObjectStore, StoredObject};
pub use naming::{bucket_name, object_key, MAX_BUCKET_LEN};
pub use store::{ObjectStore, PutRequest};
pub use uploader::{UploadFailure, UploadJob, UploadOutcome, Uploader};
