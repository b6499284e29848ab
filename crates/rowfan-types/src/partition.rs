//! Partition plans and staged-object identity.

use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` byte range over a staged blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionRange {
    /// First byte of the range.
    pub start: u64,
    /// One past the last byte of the range.
    pub end: u64,
}

impl PartitionRange {
    /// Build a range; `start` must not exceed `end`.
    #[must_use]
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "partition range reversed: [{start}, {end})");
        Self { start, end }
    }

    /// Number of bytes covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// `true` when the range covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for PartitionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// The full, ordered partitioning of one staged blob.
///
/// Ranges are contiguous, non-overlapping, and row-aligned; their ordered
/// concatenation reproduces the data-row bytes exactly, excluding only the
/// blob's final synthetic terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    /// Byte range of the header line, absent for an empty blob.
    pub header: Option<PartitionRange>,
    /// Data-row partitions, in blob order.
    pub ranges: Vec<PartitionRange>,
}

impl PartitionPlan {
    /// Plan over an empty blob: no header, no partitions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of partitions.
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.ranges.len()
    }
}

/// Identity of one staged blob: a bucket/key pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    bucket: String,
    key: String,
}

impl ObjectKey {
    /// Build an object identity.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The bucket component.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key component.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
