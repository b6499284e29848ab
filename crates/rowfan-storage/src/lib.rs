//! Blob storage for staged row tables.
//!
//! Provides the [`StorageBackend`] trait — whole-blob `put`, byte-range
//! `get_range` — with an S3 adapter ([`S3Storage`]) for deployed use and an
//! in-memory implementation ([`MemoryStorage`]) for local dispatch, dev,
//! and tests.

#![warn(clippy::pedantic)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod s3;

pub use backend::{PutAck, StorageBackend};
pub use error::StorageError;
pub use memory::MemoryStorage;
pub use s3::S3Storage;
