//! Dispatcher: the local/remote state machine and table fan-out.
//!
//! `run` sends one payload; `distribute_table` stages a table and fans one
//! payload out per partition. Remote dispatch is fire-and-forget — the
//! report says only what the backend *accepted*, and there is no channel
//! for results. Parallelism belongs entirely to the compute backend; the
//! dispatcher itself never spawns.

use std::sync::Arc;

use rowfan_storage::{PutAck, StorageBackend};
use rowfan_types::partition::{ObjectKey, PartitionRange};
use rowfan_types::payload::{DispatchPayload, InboundEvent, Kwargs, PartitionJob, MAX_PAYLOAD_BYTES};
use rowfan_types::report::WorkerOutcome;
use rowfan_types::table::RowTable;
use rowfan_types::task::TaskRef;
use uuid::Uuid;

use crate::compute::ComputeBackend;
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::partitioner::plan_partitions;
use crate::registry::TaskRegistry;
use crate::router;

/// Acknowledgement of one dispatched payload.
///
/// Diagnostic only: a remote `accepted` says the backend took the call,
/// never that the partition was processed.
#[derive(Debug)]
pub enum DispatchAck {
    /// Executed synchronously in-process.
    Local(WorkerOutcome),
    /// Submitted to the compute backend.
    Remote {
        /// Whether the backend accepted the invocation.
        accepted: bool,
    },
}

impl DispatchAck {
    /// `true` when the payload was executed locally or accepted remotely.
    #[must_use]
    pub fn accepted(&self) -> bool {
        match self {
            Self::Local(_) => true,
            Self::Remote { accepted } => *accepted,
        }
    }
}

/// Per-call options for [`Dispatcher::distribute_table`].
#[derive(Debug, Clone)]
pub struct DistributeOptions {
    /// Rows per partition; the final partition takes the remainder.
    pub rows_per_partition: usize,
    /// Run each partition's task inside a failure boundary.
    pub catch_errors: bool,
    /// Keyword arguments passed through to the task.
    pub kwargs: Kwargs,
    /// Constructor kwargs for method tasks requiring instantiation.
    pub init_kwargs: Option<Kwargs>,
    /// Staging bucket override; falls back to the configured default.
    pub bucket: Option<String>,
}

impl DistributeOptions {
    /// Options with the given partition size and everything else default.
    #[must_use]
    pub fn new(rows_per_partition: usize) -> Self {
        Self {
            rows_per_partition,
            catch_errors: false,
            kwargs: Kwargs::new(),
            init_kwargs: None,
            bucket: None,
        }
    }
}

/// One partition's dispatch record inside a [`DistributeReport`].
#[derive(Debug)]
pub struct PartitionDispatch {
    /// The partition's byte range.
    pub range: PartitionRange,
    /// Acceptance for this partition's payload.
    pub ack: DispatchAck,
}

/// Diagnostics from one `distribute_table` call.
///
/// Callers must not infer end-to-end success from this value; genuine
/// success/failure monitoring is a backend-log concern.
#[derive(Debug)]
pub struct DistributeReport {
    /// Where the blob was staged.
    pub object: ObjectKey,
    /// Staging acknowledgement.
    pub put_ack: PutAck,
    /// Per-partition dispatch records, in partition order.
    pub partitions: Vec<PartitionDispatch>,
}

impl DistributeReport {
    /// `true` when every partition was executed locally or accepted
    /// remotely. Still only an acceptance signal, not completion.
    #[must_use]
    pub fn all_accepted(&self) -> bool {
        self.partitions.iter().all(|p| p.ack.accepted())
    }
}

enum Mode<'a> {
    Local,
    Remote {
        compute: &'a dyn ComputeBackend,
        function: &'a str,
    },
}

/// Decides local vs. remote execution and sends work.
pub struct Dispatcher {
    registry: TaskRegistry,
    storage: Arc<dyn StorageBackend>,
    compute: Option<Arc<dyn ComputeBackend>>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Build a dispatcher with no compute backend: every payload runs
    /// locally.
    #[must_use]
    pub fn new(
        registry: TaskRegistry,
        storage: Arc<dyn StorageBackend>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            storage,
            compute: None,
            config,
        }
    }

    /// Attach a compute backend for remote dispatch.
    #[must_use]
    pub fn with_compute(mut self, compute: Arc<dyn ComputeBackend>) -> Self {
        self.compute = Some(compute);
        self
    }

    fn mode(&self) -> Mode<'_> {
        if self.config.force_local {
            return Mode::Local;
        }
        match (self.compute.as_deref(), self.config.function_name.as_deref()) {
            (Some(compute), Some(function)) => Mode::Remote { compute, function },
            _ => Mode::Local,
        }
    }

    /// Send one payload.
    ///
    /// Local mode routes the payload through the same decode path the
    /// remote entry point uses and executes it synchronously. Remote mode
    /// serializes, enforces the payload cap, and submits a fire-and-forget
    /// invocation, reporting only whether the backend accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PayloadTooLarge`] before any network call
    /// when the serialized payload exceeds the cap; otherwise storage,
    /// invoke, or local execution errors.
    pub async fn run(&self, payload: DispatchPayload) -> Result<DispatchAck, DispatchError> {
        match self.mode() {
            Mode::Local => {
                let outcome =
                    router::execute_payload(&self.registry, self.storage.as_ref(), payload)
                        .await?;
                Ok(DispatchAck::Local(outcome))
            }
            Mode::Remote { compute, function } => {
                let bytes = serde_json::to_vec(&InboundEvent::Subtask(payload))?;
                if bytes.len() > MAX_PAYLOAD_BYTES {
                    return Err(DispatchError::PayloadTooLarge {
                        size: bytes.len(),
                        cap: MAX_PAYLOAD_BYTES,
                    });
                }
                let ack = compute.invoke_async(function, &bytes).await?;
                Ok(DispatchAck::Remote {
                    accepted: ack.accepted,
                })
            }
        }
    }

    /// Stage a table and dispatch one worker payload per partition.
    ///
    /// The returned report is diagnostic only; there is no way to await
    /// remote partitions from here.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when no bucket is available, staging or
    /// planning fails, a payload exceeds the cap, the backend cannot be
    /// reached, or (local mode, containment off) a partition task fails —
    /// in which case remaining partitions are not dispatched.
    pub async fn distribute_table(
        &self,
        table: &RowTable,
        target: &TaskRef,
        options: DistributeOptions,
    ) -> Result<DistributeReport, DispatchError> {
        let bucket = options
            .bucket
            .as_deref()
            .or(self.config.bucket.as_deref())
            .ok_or(DispatchError::MissingBucket)?;
        let key = self.fresh_key();

        let blob = table.to_blob();
        let put_ack = self.storage.put(bucket, &key, &blob).await?;
        tracing::info!(bucket, key, bytes = blob.len(), "Staged table blob");

        let plan = plan_partitions(&blob, options.rows_per_partition)?;
        tracing::info!(
            partitions = plan.partition_count(),
            rows_per_partition = options.rows_per_partition,
            target = %target,
            "Dispatching partitions"
        );

        let target_path = target.as_path();
        let mut partitions = Vec::with_capacity(plan.partition_count());
        for range in &plan.ranges {
            let job = PartitionJob {
                bucket: bucket.to_string(),
                key: key.clone(),
                range_start: range.start,
                range_end: range.end,
                target_path: target_path.clone(),
                header: table.header().to_string(),
                catch_errors: options.catch_errors,
            };
            let payload = job.into_payload(options.kwargs.clone(), options.init_kwargs.clone());
            let ack = self.run(payload).await?;
            tracing::debug!(range = %range, accepted = ack.accepted(), "Partition dispatched");
            partitions.push(PartitionDispatch { range: *range, ack });
        }

        Ok(DistributeReport {
            object: ObjectKey::new(bucket, key),
            put_ack,
            partitions,
        })
    }

    /// Fresh staging key: configured prefix plus a random UUID.
    fn fresh_key(&self) -> String {
        let prefix = self.config.key_prefix.as_deref().unwrap_or("rowfan/");
        let separator = if prefix.is_empty() || prefix.ends_with('/') {
            ""
        } else {
            "/"
        };
        format!("{prefix}{separator}{}.csv", Uuid::new_v4())
    }
}
