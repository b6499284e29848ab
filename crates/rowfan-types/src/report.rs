//! Structured error reports returned by contained worker failures.
//!
//! When a partition worker runs with error containment on, a failing user
//! task produces an [`ErrorReport`] instead of an error, so the compute
//! backend does not observe a failed invocation and re-run non-idempotent
//! work. The `kind` field is a stable literal; alerting keys on it in
//! backend logs.

use serde::{Deserialize, Serialize};

/// Stable `kind` literals carried by reports and log records.
pub mod kind {
    /// A task reference could not be resolved against the registry.
    pub const TASK_RESOLUTION: &str = "task_resolution_error";
    /// The user's processing task failed over its partition.
    pub const PARTITION_PROCESSING: &str = "partition_processing_error";
}

/// A contained per-partition failure, returned in place of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Stable failure classification literal (see [`kind`]).
    pub kind: String,
    /// Top-level failure message.
    pub message: String,
    /// Source chain of the failure, one frame per line.
    pub trace: String,
    /// Start of the partition the worker was processing.
    pub range_start: u64,
    /// End (exclusive) of the partition the worker was processing.
    pub range_end: u64,
    /// Wire path of the task that failed.
    pub task_path: String,
    /// Bucket of the staged blob.
    pub bucket: String,
    /// Key of the staged blob.
    pub key: String,
}

/// Terminal state of one worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The task processed its partition successfully.
    Completed,
    /// The task failed and containment captured the failure.
    Reported(ErrorReport),
}

impl WorkerOutcome {
    /// The contained report, if this outcome carries one.
    #[must_use]
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Completed => None,
            Self::Reported(report) => Some(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serde_round_trip() {
        let report = ErrorReport {
            kind: kind::PARTITION_PROCESSING.to_string(),
            message: "division by zero".to_string(),
            trace: "division by zero".to_string(),
            range_start: 12,
            range_end: 48,
            task_path: "reports.nightly.rollup".to_string(),
            bucket: "staging".to_string(),
            key: "rowfan/blob.csv".to_string(),
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: ErrorReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn kind_literals_are_stable() {
        // Alerting matches on these exact strings in backend logs.
        assert_eq!(kind::PARTITION_PROCESSING, "partition_processing_error");
        assert_eq!(kind::TASK_RESOLUTION, "task_resolution_error");
    }

    #[test]
    fn outcome_report_accessor() {
        assert!(WorkerOutcome::Completed.report().is_none());
        let report = ErrorReport {
            kind: kind::PARTITION_PROCESSING.to_string(),
            message: "boom".to_string(),
            trace: "boom".to_string(),
            range_start: 0,
            range_end: 4,
            task_path: "m.f".to_string(),
            bucket: "b".to_string(),
            key: "k".to_string(),
        };
        let outcome = WorkerOutcome::Reported(report.clone());
        assert_eq!(outcome.report(), Some(&report));
    }
}
