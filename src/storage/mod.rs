//! Object storage layer.
//!
//! The store holds two kinds of objects: originals (addressed by the raw
//! source reference) and derived thumbnails (addressed by a
//! [`CacheKey`](crate::resolve::CacheKey)). The service only needs whole
//! object reads and writes, so the trait is a plain get/put.

mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

pub use s3::{create_s3_client, S3ObjectStore, S3Settings};

/// An object read back from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Content type recorded when the object was written, if any
    pub content_type: Option<String>,

    /// Full object body
    pub body: Bytes,
}

/// Key-value access to the durable object store.
///
/// Implementations must be thread-safe; one instance is shared by every
/// request and by the write-back worker.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read a whole object.
    ///
    /// A missing key must be reported as [`StorageError::NotFound`] so callers
    /// can tell a cache miss apart from a broken backend.
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Write a whole object, replacing any previous version.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Identifier for log lines (e.g. `s3://bucket`).
    fn describe(&self) -> String;
}
