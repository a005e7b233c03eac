//! The object store contract
//!
//! An object store supports a lightweight bucket existence probe and an
//! atomic last-writer-wins put with a server-side encryption directive,
//! a content type and free-form metadata. Credentials come from the
//! ambient environment; nothing here carries them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SinkError;

/// One object upload
#[derive(Debug, Clone)]
pub struct PutRequest {
    /// Target bucket
    pub bucket: String,
    /// Object key within the bucket
    pub key: String,
    /// Fully serialized payload
    pub body: Bytes,
    /// Content type matching the payload format
    pub content_type: &'static str,
    /// Encryption directive forwarded verbatim
    pub server_side_encryption: String,
    /// Free-form object metadata
    pub metadata: BTreeMap<String, String>,
}

/// An object store the writer can publish to
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether `bucket` exists
    ///
    /// A metadata probe; must not create anything.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, SinkError>;

    /// Commit one object, overwriting any previous object at the key
    async fn put_object(&self, request: PutRequest) -> Result<(), SinkError>;
}
