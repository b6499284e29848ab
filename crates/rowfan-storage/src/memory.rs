//! In-memory implementation of [`StorageBackend`].
//!
//! An explicit, cloneable handle over a `Mutex`-guarded map. Each handle
//! created with [`MemoryStorage::new`] owns an independent store, so
//! concurrent tests cannot cross-contaminate; clones share the same store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::backend::{PutAck, StorageBackend};
use crate::error::{self, StorageError};

type ObjectMap = HashMap<(String, String), Vec<u8>>;

/// In-memory blob storage for local dispatch, dev, and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<ObjectMap>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the object-map lock.
    fn lock_objects(&self) -> error::Result<MutexGuard<'_, ObjectMap>> {
        self.objects.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Snapshot one stored object, if present. Intended for tests and
    /// diagnostics.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// `true` when no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn put(&self, bucket: &str, key: &str, data: &[u8]) -> error::Result<PutAck> {
        let mut objects = self.lock_objects()?;
        objects.insert((bucket.to_string(), key.to_string()), data.to_vec());
        Ok(PutAck {
            bytes: data.len() as u64,
            etag: None,
        })
    }

    async fn get_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end: u64,
    ) -> error::Result<Vec<u8>> {
        if start > end {
            return Err(StorageError::InvalidRange { start, end });
        }
        let objects = self.lock_objects()?;
        let data = objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        let len = data.len() as u64;
        if end > len {
            return Err(StorageError::OutOfBounds { start, end, len });
        }
        let start = usize::try_from(start).map_err(|_| StorageError::InvalidRange { start, end })?;
        let end = usize::try_from(end).map_err(|_| StorageError::OutOfBounds {
            start: start as u64,
            end,
            len,
        })?;
        Ok(data[start..end].to_vec())
    }
}
