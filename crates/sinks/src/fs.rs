//! Filesystem object store
//!
//! One directory per bucket under a root; objects are plain files.
//! The existence probe is a directory check and puts are atomic via a
//! temp-file rename, giving the same last-writer-wins semantics the
//! contract demands. Buckets are never created here; provisioning them
//! is the operator's job, exactly like the real sink.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::store::{ObjectStore, PutRequest};

/// [`ObjectStore`] over a local directory tree
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`
    ///
    /// The root itself must exist; buckets are subdirectories.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, SinkError> {
        let path = self.bucket_path(bucket);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SinkError::transient(format!(
                "probing '{}': {e}",
                path.display()
            ))),
        }
    }

    async fn put_object(&self, request: PutRequest) -> Result<(), SinkError> {
        let bucket_dir = self.bucket_path(&request.bucket);
        if !bucket_dir.is_dir() {
            return Err(SinkError::bucket_missing(request.bucket));
        }

        let target = bucket_dir.join(&request.key);
        let staging = bucket_dir.join(format!("{}.tmp", request.key));

        tokio::fs::write(&staging, &request.body)
            .await
            .map_err(|e| SinkError::fatal(format!("writing '{}': {e}", staging.display())))?;
        tokio::fs::rename(&staging, &target)
            .await
            .map_err(|e| SinkError::fatal(format!("committing '{}': {e}", target.display())))?;

        Ok(())
    }
}
