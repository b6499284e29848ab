//! Engine error model.
//!
//! Two layers, mirroring when the caller can observe a failure:
//!
//! `DispatchError` covers everything that can go wrong while dispatching —
//! these are synchronous and surface to the original caller. `TaskError`
//! covers worker-time failures — remotely these are visible only in backend
//! logs (or as a structured
//! [`ErrorReport`](rowfan_types::ErrorReport) when containment is on); in
//! local mode they propagate through the dispatcher.

use rowfan_storage::StorageError;
use rowfan_types::payload::PayloadError;
use rowfan_types::table::TableError;
use rowfan_types::task::TaskPathError;

use crate::compute::InvokeError;
use crate::partitioner::PartitionError;

/// A worker-time failure: resolving, fetching, rebuilding, or running a task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task path names nothing in the registry. Fatal for the
    /// invocation; typically a stale or renamed target.
    #[error("task reference '{0}' is not registered")]
    Unresolved(String),

    /// The task path resolved to a registration it cannot bind against
    /// (shape mismatch, missing direct method, or a failing constructor).
    #[error("task reference '{path}' cannot bind: {reason}")]
    Binding {
        /// The offending task path.
        path: String,
        /// What went wrong while binding.
        reason: String,
    },

    /// The task path string was malformed.
    #[error("malformed task path: {0}")]
    Path(#[from] TaskPathError),

    /// An inbound sub-task event claimed the subtask shape but did not
    /// decode.
    #[error("malformed subtask event: {0}")]
    Decode(#[from] serde_json::Error),

    /// The worker payload's positional arguments were malformed.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Fetching the partition bytes failed.
    #[error("partition fetch failed: {0}")]
    Storage(#[from] StorageError),

    /// The partition bytes did not decode into rows.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The user task itself failed and containment was off.
    #[error("task '{path}' failed: {source}")]
    Failed {
        /// Wire path of the failing task.
        path: String,
        /// The task's own failure.
        #[source]
        source: anyhow::Error,
    },
}

/// A dispatch-time failure, surfaced synchronously to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The serialized payload exceeds the hard cap. Raised before any
    /// network call; shrink the partitions or the argument size.
    #[error("serialized payload is {size} bytes, exceeding the {cap}-byte dispatch cap")]
    PayloadTooLarge {
        /// Serialized payload size.
        size: usize,
        /// The enforced cap.
        cap: usize,
    },

    /// No staging bucket was configured or supplied.
    #[error("no staging bucket configured")]
    MissingBucket,

    /// Staging the blob failed.
    #[error("staging write failed: {0}")]
    Storage(#[from] StorageError),

    /// Partition planning failed.
    #[error(transparent)]
    Partition(#[from] PartitionError),

    /// The payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The compute backend could not be reached.
    #[error("compute backend invoke failed: {0}")]
    Invoke(#[from] InvokeError),

    /// Local-mode execution failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}
