//! Partition planning: row-aligned byte ranges over a staged blob.
//!
//! The blob layout is fixed by the serializer: one header line, N data
//! rows, a terminator after every line. The planner scans the terminators
//! once and chunks whole rows, so a partition boundary can never split a
//! row.

use rowfan_types::partition::{PartitionPlan, PartitionRange};
use rowfan_types::table::ROW_TERMINATOR;

/// Errors produced while planning partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    /// `rows_per_partition` was zero.
    #[error("rows_per_partition must be at least 1")]
    InvalidRowsPerPartition,
}

/// Split a staged blob into row-aligned partitions of `rows_per_partition`
/// rows each; the final partition takes the remainder.
///
/// The first line is the header and is never partitioned. An empty blob, or
/// one holding only a header, yields zero partitions. The resulting ranges
/// are contiguous, non-overlapping, and concatenate to the data-row bytes
/// exactly, excluding only the blob's final synthetic terminator.
///
/// # Errors
///
/// Returns [`PartitionError::InvalidRowsPerPartition`] when
/// `rows_per_partition` is zero.
pub fn plan_partitions(
    blob: &[u8],
    rows_per_partition: usize,
) -> Result<PartitionPlan, PartitionError> {
    if rows_per_partition == 0 {
        return Err(PartitionError::InvalidRowsPerPartition);
    }

    let spans = line_spans(blob);
    let Some((header, rows)) = spans.split_first() else {
        return Ok(PartitionPlan::empty());
    };

    let ranges = rows
        .chunks(rows_per_partition)
        .map(|chunk| PartitionRange::new(chunk[0].start, chunk[chunk.len() - 1].end))
        .collect();

    Ok(PartitionPlan {
        header: Some(*header),
        ranges,
    })
}

/// Scan line boundaries, producing each line's `[start, end)` span including
/// its terminator. The empty boundary implied by the blob's own trailing
/// terminator is dropped by trimming that terminator from the final span; an
/// unterminated final line is kept whole.
fn line_spans(blob: &[u8]) -> Vec<PartitionRange> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for (pos, byte) in blob.iter().enumerate() {
        if *byte == ROW_TERMINATOR {
            spans.push(PartitionRange::new(start as u64, (pos + 1) as u64));
            start = pos + 1;
        }
    }
    if start < blob.len() {
        spans.push(PartitionRange::new(start as u64, blob.len() as u64));
    } else if let Some(last) = spans.last_mut() {
        last.end -= 1;
    }
    spans
}
