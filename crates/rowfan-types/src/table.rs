//! Row tables: the engine's view of a tabular dataset.
//!
//! The engine never interprets row contents; rows are opaque delimited
//! lines produced by whatever connector or transformation built the table.
//! All the engine needs is the framing: one header line, N row lines, one
//! terminator after every line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record terminator used by the blob serialization.
pub const ROW_TERMINATOR: u8 = b'\n';

/// UTF-8 byte-order mark, tolerated at the start of a fetched partition.
const BOM: char = '\u{feff}';

/// Errors produced when decoding partition bytes back into rows.
#[derive(Debug, Error)]
pub enum TableError {
    /// The partition bytes were not valid UTF-8.
    #[error("partition bytes are not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

/// A header line plus N opaque data rows.
///
/// Rows must be single lines: the serializer is the only thing that writes
/// terminators, and it writes exactly one after the header and after every
/// row — including the last, so a serialized blob always ends with a single
/// trailing terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTable {
    header: String,
    rows: Vec<String>,
}

impl RowTable {
    /// Build a table from a header line and data rows.
    #[must_use]
    pub fn new(header: impl Into<String>, rows: Vec<String>) -> Self {
        Self {
            header: header.into(),
            rows,
        }
    }

    /// The header line, without terminator.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The data rows, without terminators.
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Serialize to the staged blob layout: header, rows, one terminator
    /// after each line.
    #[must_use]
    pub fn to_blob(&self) -> Vec<u8> {
        let capacity = self.header.len()
            + 1
            + self.rows.iter().map(|r| r.len() + 1).sum::<usize>();
        let mut blob = Vec::with_capacity(capacity);
        blob.extend_from_slice(self.header.as_bytes());
        blob.push(ROW_TERMINATOR);
        for row in &self.rows {
            blob.extend_from_slice(row.as_bytes());
            blob.push(ROW_TERMINATOR);
        }
        blob
    }

    /// Rebuild a sub-table from fetched partition bytes plus the original
    /// header.
    ///
    /// The bytes are decoded as UTF-8 with an optional leading byte-order
    /// mark; the empty fragment after a trailing terminator is discarded, and
    /// an unterminated final row is kept.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NotUtf8`] when the bytes do not decode.
    pub fn from_partition(header: impl Into<String>, bytes: &[u8]) -> Result<Self, TableError> {
        let text = String::from_utf8(bytes.to_vec())?;
        let stripped = text.strip_prefix(BOM).unwrap_or(&text);
        let mut rows: Vec<String> = stripped
            .split(ROW_TERMINATOR as char)
            .map(str::to_string)
            .collect();
        if rows.last().is_some_and(String::is_empty) {
            rows.pop();
        }
        Ok(Self {
            header: header.into(),
            rows,
        })
    }
}
