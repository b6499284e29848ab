//! Storage backend trait definition.
//!
//! [`StorageBackend`] is the staging contract for the dispatch engine: a
//! table blob is written once with [`put`](StorageBackend::put) and then
//! range-read concurrently by workers with
//! [`get_range`](StorageBackend::get_range). Ranges are half-open
//! `[start, end)`; adapters whose native protocol is end-inclusive convert
//! internally.

use async_trait::async_trait;

use crate::error;

/// Acknowledgement of a completed `put`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutAck {
    /// Number of bytes written.
    pub bytes: u64,
    /// Backend entity tag for the written object, when the store provides one.
    pub etag: Option<String>,
}

/// Byte-addressable blob storage.
///
/// Implementations must be `Send + Sync` for use behind
/// `Arc<dyn StorageBackend>`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a whole blob under `bucket`/`key`, overwriting any previous
    /// object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`](crate::StorageError) on storage failure.
    async fn put(&self, bucket: &str, key: &str, data: &[u8]) -> error::Result<PutAck>;

    /// Read the half-open byte range `[start, end)` of an object.
    ///
    /// On success the returned buffer is exactly `end - start` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`](crate::StorageError) when the object is
    /// missing, the range is malformed or out of bounds, or the store fails.
    async fn get_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end: u64,
    ) -> error::Result<Vec<u8>>;
}
