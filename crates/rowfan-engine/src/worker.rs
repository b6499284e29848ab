//! Partition worker: one invocation per partition.
//!
//! The worker resolves the target task, fetches its byte range, rebuilds a
//! self-describing sub-table, and invokes the task. Only the task
//! invocation itself runs inside the optional containment boundary;
//! resolution and fetch failures always propagate, since containment
//! exists to stop the backend retrying non-idempotent *user* work, not to
//! mask infrastructure faults.

use rowfan_storage::StorageBackend;
use rowfan_types::payload::{Kwargs, PartitionJob};
use rowfan_types::report::{kind, ErrorReport, WorkerOutcome};
use rowfan_types::table::RowTable;
use rowfan_types::task::TaskRef;

use crate::error::TaskError;
use crate::registry::TaskRegistry;

/// Run one partition.
///
/// # Errors
///
/// Returns [`TaskError`] when the target cannot be resolved, the partition
/// cannot be fetched or decoded, or the task fails with containment off.
/// With containment on, a task failure becomes
/// [`WorkerOutcome::Reported`] instead.
pub async fn run_partition(
    registry: &TaskRegistry,
    storage: &dyn StorageBackend,
    job: &PartitionJob,
    kwargs: &Kwargs,
    init_kwargs: Option<&Kwargs>,
) -> Result<WorkerOutcome, TaskError> {
    let target = TaskRef::parse(&job.target_path)?;
    let task = registry.resolve(&target, init_kwargs)?;

    let bytes = storage
        .get_range(&job.bucket, &job.key, job.range_start, job.range_end)
        .await?;
    let sub_table = RowTable::from_partition(&job.header, &bytes)?;
    tracing::debug!(
        bucket = job.bucket,
        key = job.key,
        start = job.range_start,
        end = job.range_end,
        rows = sub_table.row_count(),
        task = job.target_path,
        "Partition fetched"
    );

    match task(sub_table, kwargs) {
        Ok(()) => Ok(WorkerOutcome::Completed),
        Err(err) if job.catch_errors => {
            tracing::warn!(
                kind = kind::PARTITION_PROCESSING,
                task = job.target_path,
                start = job.range_start,
                end = job.range_end,
                "Contained task failure: {err:#}"
            );
            Ok(WorkerOutcome::Reported(ErrorReport {
                kind: kind::PARTITION_PROCESSING.to_string(),
                message: err.to_string(),
                trace: render_chain(&err),
                range_start: job.range_start,
                range_end: job.range_end,
                task_path: job.target_path.clone(),
                bucket: job.bucket.clone(),
                key: job.key.clone(),
            }))
        }
        Err(err) => Err(TaskError::Failed {
            path: job.target_path.clone(),
            source: err,
        }),
    }
}

/// Render an error's source chain, one frame per line.
fn render_chain(err: &anyhow::Error) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowfan_storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn job(catch_errors: bool) -> PartitionJob {
        PartitionJob {
            bucket: "b".to_string(),
            key: "k".to_string(),
            range_start: 2,
            range_end: 10,
            target_path: "m.process".to_string(),
            header: "id".to_string(),
            catch_errors,
        }
    }

    async fn storage_with(blob: &[u8]) -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.put("b", "k", blob).await.unwrap();
        storage
    }

    #[tokio::test]
    async fn fetches_and_invokes_over_sub_table() {
        let registry = TaskRegistry::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.register_function("m", "process", move |table, _| {
            sink.lock().unwrap().extend(table.rows().to_vec());
            Ok(())
        });
        let storage = storage_with(b"h\n1,a\n2,b\n").await;

        let outcome = run_partition(
            &registry,
            &storage,
            &job(false),
            &Kwargs::new(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(outcome, WorkerOutcome::Completed);
        assert_eq!(*seen.lock().unwrap(), ["1,a", "2,b"]);
    }

    #[tokio::test]
    async fn contained_failure_returns_report_with_partition_range() {
        let registry = TaskRegistry::new();
        registry.register_function("m", "process", |_, _| anyhow::bail!("boom"));
        let storage = storage_with(b"h\n1,a\n2,b\n").await;

        let outcome = run_partition(&registry, &storage, &job(true), &Kwargs::new(), None)
            .await
            .unwrap();
        let report = outcome.report().expect("failure should be contained");
        assert_eq!(report.kind, kind::PARTITION_PROCESSING);
        assert_eq!(report.range_start, 2);
        assert_eq!(report.range_end, 10);
        assert_eq!(report.task_path, "m.process");
        assert!(report.message.contains("boom"));
    }

    #[tokio::test]
    async fn uncontained_failure_propagates() {
        let registry = TaskRegistry::new();
        registry.register_function("m", "process", |_, _| anyhow::bail!("boom"));
        let storage = storage_with(b"h\n1,a\n2,b\n").await;

        let err = run_partition(&registry, &storage, &job(false), &Kwargs::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Failed { .. }));
    }

    #[tokio::test]
    async fn unresolved_target_propagates_even_with_containment() {
        let registry = TaskRegistry::new();
        let storage = storage_with(b"h\n1,a\n2,b\n").await;

        let err = run_partition(&registry, &storage, &job(true), &Kwargs::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Unresolved(_)));
    }

    #[tokio::test]
    async fn fetch_failure_propagates_even_with_containment() {
        let registry = TaskRegistry::new();
        registry.register_function("m", "process", |_, _| Ok(()));
        let storage = MemoryStorage::new();

        let err = run_partition(&registry, &storage, &job(true), &Kwargs::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Storage(_)));
    }

    #[tokio::test]
    async fn kwargs_reach_the_task() {
        let registry = TaskRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry.register_function("m", "process", move |_, kwargs| {
            assert_eq!(kwargs.get("limit").and_then(|v| v.as_u64()), Some(10));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let storage = storage_with(b"h\n1,a\n2,b\n").await;

        let mut kwargs = Kwargs::new();
        kwargs.insert("limit".to_string(), serde_json::Value::from(10));
        run_partition(&registry, &storage, &job(false), &kwargs, None)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
