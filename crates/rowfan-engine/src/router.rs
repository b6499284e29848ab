//! Inbound event router.
//!
//! One compute entry point serves both ordinary requests and dispatched
//! sub-tasks. [`route_event`] classifies the inbound JSON at the
//! deserialization boundary: events tagged `kind: "subtask"` decode into a
//! [`DispatchPayload`] and execute as a partition worker; everything else
//! is handed back untouched for ordinary processing.

use rowfan_storage::StorageBackend;
use rowfan_types::payload::{
    DispatchPayload, InboundEvent, PartitionJob, SUBTASK_KIND, WORKER_TASK_PATH,
};
use rowfan_types::report::{kind, WorkerOutcome};
use serde_json::Value;

use crate::error::TaskError;
use crate::registry::TaskRegistry;
use crate::worker;

/// Routing decision for one inbound event.
#[derive(Debug)]
pub enum Routed {
    /// The event was a dispatched sub-task and was executed; the outer
    /// handler must skip ordinary request processing.
    Handled(WorkerOutcome),
    /// Not a sub-task; the event is returned unchanged for ordinary
    /// processing.
    NotHandled(Value),
}

impl Routed {
    /// `true` when the event was consumed as a sub-task.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// Classify and, for sub-tasks, execute one inbound event.
///
/// # Errors
///
/// Returns [`TaskError`] when an event claims the sub-task shape but does
/// not decode, or when worker execution fails. An event without the
/// sub-task discriminant never errors here; it flows through as
/// [`Routed::NotHandled`].
pub async fn route_event(
    registry: &TaskRegistry,
    storage: &dyn StorageBackend,
    event: Value,
) -> Result<Routed, TaskError> {
    if event.get("kind").and_then(Value::as_str) != Some(SUBTASK_KIND) {
        return Ok(Routed::NotHandled(event));
    }

    let InboundEvent::Subtask(payload) = serde_json::from_value(event)?;
    let outcome = execute_payload(registry, storage, payload)
        .await
        .inspect_err(|err| {
            let failure_kind = match err {
                TaskError::Unresolved(_) | TaskError::Binding { .. } | TaskError::Path(_) => {
                    kind::TASK_RESOLUTION
                }
                _ => kind::PARTITION_PROCESSING,
            };
            tracing::error!(kind = failure_kind, "Sub-task failed: {err}");
        })?;
    Ok(Routed::Handled(outcome))
}

/// Execute a decoded sub-task payload.
///
/// The only entry point dispatched through payloads is the partition
/// worker; any other task path is unresolvable by construction.
///
/// # Errors
///
/// Returns [`TaskError`] when the payload is malformed or the worker fails.
pub async fn execute_payload(
    registry: &TaskRegistry,
    storage: &dyn StorageBackend,
    payload: DispatchPayload,
) -> Result<WorkerOutcome, TaskError> {
    if payload.task_path != WORKER_TASK_PATH {
        return Err(TaskError::Unresolved(payload.task_path));
    }
    let job = PartitionJob::from_payload(&payload)?;
    worker::run_partition(
        registry,
        storage,
        &job,
        &payload.kwargs,
        payload.func_class_init_kwargs.as_ref(),
    )
    .await
}
