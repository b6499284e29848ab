//! Dispatch payloads: the unit of work sent to the compute backend.
//!
//! Wire format of a sub-task event:
//!
//! ```json
//! {
//!   "kind": "subtask",
//!   "task_path": "rowfan.worker.run_partition",
//!   "args": ["staging", "rowfan/3f2a….csv", 18, 96, "reports.nightly.rollup", "id,amount", true],
//!   "kwargs": {"dry_run": false},
//!   "func_class_init_kwargs": null
//! }
//! ```
//!
//! The `kind` discriminant is what lets a single compute entry point tell a
//! dispatched sub-task apart from an ordinary invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Keyword arguments passed through to a task, JSON-shaped.
pub type Kwargs = serde_json::Map<String, Value>;

/// Hard cap on the serialized size of one dispatch event, in bytes.
///
/// Payloads above this size must never reach the compute backend's invoke
/// call; the dispatcher fails them synchronously instead.
pub const MAX_PAYLOAD_BYTES: usize = 128_000;

/// Discriminant value marking an inbound event as a dispatched sub-task.
pub const SUBTASK_KIND: &str = "subtask";

/// Task path of the built-in partition worker entry point.
///
/// Every partition payload names this path; the user's own task reference
/// rides inside the positional arguments.
pub const WORKER_TASK_PATH: &str = "rowfan.worker.run_partition";

/// One dispatched call: a task path plus its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPayload {
    /// Wire path of the task to invoke (see [`TaskRef`](crate::task::TaskRef)).
    pub task_path: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: Kwargs,
    /// Constructor kwargs for method tasks that require instantiation.
    #[serde(default)]
    pub func_class_init_kwargs: Option<Kwargs>,
}

/// Inbound compute-backend event, classified at the deserialization boundary.
///
/// Events that do not carry `kind: "subtask"` fail to decode into this type
/// and flow on to ordinary request processing untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A dispatched partition sub-task.
    Subtask(DispatchPayload),
}

/// Errors produced when decoding a worker payload's positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// A required positional argument was absent.
    #[error("worker payload is missing argument {index} ({name})")]
    MissingArg {
        /// Position of the missing argument.
        index: usize,
        /// Name of the missing argument.
        name: &'static str,
    },

    /// A positional argument had the wrong JSON type.
    #[error("worker payload argument {index} ({name}) is not a {expected}")]
    InvalidArg {
        /// Position of the malformed argument.
        index: usize,
        /// Name of the malformed argument.
        name: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },
}

/// The positional-argument shape of one partition worker invocation.
///
/// Field order mirrors the wire argument order exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionJob {
    /// Bucket holding the staged blob.
    pub bucket: String,
    /// Key of the staged blob.
    pub key: String,
    /// Partition byte range start (inclusive).
    pub range_start: u64,
    /// Partition byte range end (exclusive).
    pub range_end: u64,
    /// Wire path of the user task to run over the sub-table.
    pub target_path: String,
    /// Header line of the staged table.
    pub header: String,
    /// Whether the user task runs inside a failure boundary.
    pub catch_errors: bool,
}

impl PartitionJob {
    /// Assemble the dispatch payload for this job.
    #[must_use]
    pub fn into_payload(self, kwargs: Kwargs, init_kwargs: Option<Kwargs>) -> DispatchPayload {
        DispatchPayload {
            task_path: WORKER_TASK_PATH.to_string(),
            args: vec![
                Value::from(self.bucket),
                Value::from(self.key),
                Value::from(self.range_start),
                Value::from(self.range_end),
                Value::from(self.target_path),
                Value::from(self.header),
                Value::from(self.catch_errors),
            ],
            kwargs,
            func_class_init_kwargs: init_kwargs,
        }
    }

    /// Decode a job from a payload's positional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when an argument is absent or has the wrong
    /// JSON type.
    pub fn from_payload(payload: &DispatchPayload) -> Result<Self, PayloadError> {
        Ok(Self {
            bucket: str_arg(&payload.args, 0, "bucket")?,
            key: str_arg(&payload.args, 1, "key")?,
            range_start: u64_arg(&payload.args, 2, "range_start")?,
            range_end: u64_arg(&payload.args, 3, "range_end")?,
            target_path: str_arg(&payload.args, 4, "target_path")?,
            header: str_arg(&payload.args, 5, "header")?,
            catch_errors: bool_arg(&payload.args, 6, "catch_errors")?,
        })
    }
}

fn arg<'a>(args: &'a [Value], index: usize, name: &'static str) -> Result<&'a Value, PayloadError> {
    args.get(index)
        .ok_or(PayloadError::MissingArg { index, name })
}

fn str_arg(args: &[Value], index: usize, name: &'static str) -> Result<String, PayloadError> {
    arg(args, index, name)?
        .as_str()
        .map(str::to_string)
        .ok_or(PayloadError::InvalidArg {
            index,
            name,
            expected: "string",
        })
}

fn u64_arg(args: &[Value], index: usize, name: &'static str) -> Result<u64, PayloadError> {
    arg(args, index, name)?
        .as_u64()
        .ok_or(PayloadError::InvalidArg {
            index,
            name,
            expected: "non-negative integer",
        })
}

fn bool_arg(args: &[Value], index: usize, name: &'static str) -> Result<bool, PayloadError> {
    arg(args, index, name)?
        .as_bool()
        .ok_or(PayloadError::InvalidArg {
            index,
            name,
            expected: "boolean",
        })
}
