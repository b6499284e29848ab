//! Storage backend error types.

/// Errors produced by [`StorageBackend`](crate::StorageBackend) operations.
///
/// Storage failures are not retried here; they surface to the caller at
/// dispatch time (`put`) or abort the worker at fetch time (`get_range`).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was queried.
        key: String,
    },

    /// The caller's range was reversed or otherwise malformed.
    #[error("invalid byte range [{start}, {end})")]
    InvalidRange {
        /// Requested range start.
        start: u64,
        /// Requested range end (exclusive).
        end: u64,
    },

    /// The range extends past the end of the stored object.
    #[error("byte range [{start}, {end}) exceeds object length {len}")]
    OutOfBounds {
        /// Requested range start.
        start: u64,
        /// Requested range end (exclusive).
        end: u64,
        /// Actual object length in bytes.
        len: u64,
    },

    /// Transport or service failure in the underlying store.
    #[error("storage backend error: {message}")]
    Backend {
        /// Human-readable description of the failure.
        message: String,
        /// The underlying error, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal mutex was poisoned by a panicked thread.
    #[error("storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Wrap an arbitrary backend failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_object() {
        let err = StorageError::NotFound {
            bucket: "staging".to_string(),
            key: "rowfan/blob.csv".to_string(),
        };
        assert_eq!(err.to_string(), "object not found: staging/rowfan/blob.csv");
    }

    #[test]
    fn out_of_bounds_reports_lengths() {
        let err = StorageError::OutOfBounds {
            start: 10,
            end: 20,
            len: 15,
        };
        let msg = err.to_string();
        assert!(msg.contains("[10, 20)"), "got: {msg}");
        assert!(msg.contains("15"), "got: {msg}");
    }

    #[test]
    fn backend_preserves_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = StorageError::backend(inner);
        assert!(err.to_string().contains("timed out"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
