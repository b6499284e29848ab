//! Integration tests for the full distribute path.
//!
//! Local mode exercises the exact remote decode path in-process, so these
//! tests cover staging, planning, payload round-trips, and worker execution
//! end to end without any network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rowfan_engine::compute::RecordingCompute;
use rowfan_engine::{
    DispatchAck, DispatchConfig, DispatchError, Dispatcher, DistributeOptions, TaskRegistry,
};
use rowfan_storage::MemoryStorage;
use rowfan_types::payload::{InboundEvent, Kwargs, WORKER_TASK_PATH};
use rowfan_types::report::kind;
use rowfan_types::table::RowTable;
use rowfan_types::task::TaskRef;

fn sample_table(rows: usize) -> RowTable {
    RowTable::new(
        "id,amount",
        (0..rows).map(|i| format!("{i},{}", i * 3)).collect(),
    )
}

fn local_dispatcher(registry: TaskRegistry, storage: MemoryStorage) -> Dispatcher {
    let config = DispatchConfig {
        bucket: Some("staging".to_string()),
        ..DispatchConfig::local()
    };
    Dispatcher::new(registry, Arc::new(storage), config)
}

fn remote_dispatcher(
    registry: TaskRegistry,
    storage: MemoryStorage,
    compute: RecordingCompute,
) -> Dispatcher {
    let config = DispatchConfig {
        function_name: Some("rowfan-worker".to_string()),
        bucket: Some("staging".to_string()),
        ..DispatchConfig::default()
    };
    Dispatcher::new(registry, Arc::new(storage), config).with_compute(Arc::new(compute))
}

/// 21 rows in fives: exactly 5 in-order calls over disjoint subsets whose
/// concatenation is the original dataset.
#[tokio::test]
async fn local_distribute_is_deterministic() {
    let registry = TaskRegistry::new();
    let calls: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    registry.register_function("reports.nightly", "rollup", move |table, _| {
        sink.lock().unwrap().push(table.rows().to_vec());
        Ok(())
    });

    let storage = MemoryStorage::new();
    let table = sample_table(21);
    let dispatcher = local_dispatcher(registry, storage.clone());

    let report = dispatcher
        .distribute_table(
            &table,
            &TaskRef::function("reports.nightly", "rollup"),
            DistributeOptions::new(5),
        )
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 5);
    let sizes: Vec<usize> = calls.iter().map(Vec::len).collect();
    assert_eq!(sizes, [5, 5, 5, 5, 1]);

    let rebuilt: Vec<String> = calls.iter().flatten().cloned().collect();
    assert_eq!(rebuilt, table.rows(), "row subsets must concatenate in order");

    assert!(report.all_accepted());
    assert_eq!(report.partitions.len(), 5);
    assert_eq!(report.object.bucket(), "staging");

    // The staged blob is the table's exact serialization.
    let staged = storage
        .object(report.object.bucket(), report.object.key())
        .unwrap();
    assert_eq!(staged, table.to_blob());
    assert_eq!(report.put_ack.bytes, staged.len() as u64);
}

#[tokio::test]
async fn containment_reports_every_partition_failure() {
    let registry = TaskRegistry::new();
    registry.register_function("m", "explode", |_, _| anyhow::bail!("bad partition"));

    let dispatcher = local_dispatcher(registry, MemoryStorage::new());
    let mut options = DistributeOptions::new(4);
    options.catch_errors = true;

    let report = dispatcher
        .distribute_table(&sample_table(10), &TaskRef::function("m", "explode"), options)
        .await
        .unwrap();

    assert_eq!(report.partitions.len(), 3);
    for partition in &report.partitions {
        let DispatchAck::Local(outcome) = &partition.ack else {
            panic!("local dispatch expected");
        };
        let failure = outcome.report().expect("every partition must be contained");
        assert_eq!(failure.kind, kind::PARTITION_PROCESSING);
        assert_eq!(failure.range_start, partition.range.start);
        assert_eq!(failure.range_end, partition.range.end);
        assert!(failure.message.contains("bad partition"));
    }
}

#[tokio::test]
async fn uncontained_local_failure_aborts_remaining_partitions() {
    let registry = TaskRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    registry.register_function("m", "explode", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("bad partition")
    });

    let dispatcher = local_dispatcher(registry, MemoryStorage::new());
    let err = dispatcher
        .distribute_table(
            &sample_table(10),
            &TaskRef::function("m", "explode"),
            DistributeOptions::new(4),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Task(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "later partitions must not run");
}

#[tokio::test]
async fn oversized_payload_never_reaches_the_backend() {
    let registry = TaskRegistry::new();
    let compute = RecordingCompute::accepting();
    let dispatcher = remote_dispatcher(registry, MemoryStorage::new(), compute.clone());

    let mut options = DistributeOptions::new(5);
    options
        .kwargs
        .insert("blob".to_string(), serde_json::Value::from("x".repeat(200_000)));

    let err = dispatcher
        .distribute_table(&sample_table(3), &TaskRef::function("m", "f"), options)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::PayloadTooLarge { .. }));
    assert!(
        compute.invocations().is_empty(),
        "no invocation may be observed for an oversized payload"
    );
}

#[tokio::test]
async fn remote_distribute_submits_one_payload_per_partition() {
    let registry = TaskRegistry::new();
    let compute = RecordingCompute::accepting();
    let storage = MemoryStorage::new();
    let table = sample_table(7);
    let dispatcher = remote_dispatcher(registry, storage, compute.clone());

    let report = dispatcher
        .distribute_table(
            &table,
            &TaskRef::function("reports.nightly", "rollup"),
            DistributeOptions::new(3),
        )
        .await
        .unwrap();

    assert!(report.all_accepted());
    let invocations = compute.invocations();
    assert_eq!(invocations.len(), 3);

    for ((function, payload), partition) in invocations.iter().zip(&report.partitions) {
        assert_eq!(function, "rowfan-worker");
        assert!(matches!(partition.ack, DispatchAck::Remote { accepted: true }));

        let InboundEvent::Subtask(decoded) = serde_json::from_slice(payload).unwrap();
        assert_eq!(decoded.task_path, WORKER_TASK_PATH);
        assert_eq!(decoded.args[2], serde_json::json!(partition.range.start));
        assert_eq!(decoded.args[3], serde_json::json!(partition.range.end));
        assert_eq!(
            decoded.args[4],
            serde_json::json!("reports.nightly.rollup")
        );
    }
}

#[tokio::test]
async fn rejected_invocation_is_reported_not_raised() {
    let registry = TaskRegistry::new();
    let compute = RecordingCompute::rejecting();
    let dispatcher = remote_dispatcher(registry, MemoryStorage::new(), compute.clone());

    let report = dispatcher
        .distribute_table(
            &sample_table(2),
            &TaskRef::function("m", "f"),
            DistributeOptions::new(1),
        )
        .await
        .unwrap();

    assert!(!report.all_accepted());
    assert_eq!(compute.invocations().len(), 2);
}

#[tokio::test]
async fn method_task_constructs_receiver_per_partition() {
    let registry = TaskRegistry::new();
    let constructed = Arc::new(AtomicUsize::new(0));
    let invoked = Arc::new(AtomicUsize::new(0));
    let construct_counter = constructed.clone();
    let invoke_counter = invoked.clone();
    registry.register_method(
        "crm",
        "AccountSync",
        "push_rows",
        move |init: &Kwargs| {
            assert_eq!(
                init.get("region").and_then(|v| v.as_str()),
                Some("eu-west-1")
            );
            construct_counter.fetch_add(1, Ordering::SeqCst);
            let counter = invoke_counter.clone();
            Ok(Arc::new(move |_table: RowTable, _: &Kwargs| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }) as rowfan_engine::TaskFn)
        },
        None,
    );

    let dispatcher = local_dispatcher(registry, MemoryStorage::new());
    let mut options = DistributeOptions::new(2);
    let mut init = Kwargs::new();
    init.insert("region".to_string(), serde_json::Value::from("eu-west-1"));
    options.init_kwargs = Some(init);

    let target = TaskRef::parse("crm.AccountSync|push_rows").unwrap();
    let report = dispatcher
        .distribute_table(&sample_table(5), &target, options)
        .await
        .unwrap();

    assert_eq!(report.partitions.len(), 3);
    // Each worker invocation re-resolves the reference independently.
    assert_eq!(constructed.load(Ordering::SeqCst), 3);
    assert_eq!(invoked.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_table_dispatches_nothing() {
    let registry = TaskRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    registry.register_function("m", "f", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let storage = MemoryStorage::new();
    let dispatcher = local_dispatcher(registry, storage.clone());
    let report = dispatcher
        .distribute_table(
            &sample_table(0),
            &TaskRef::function("m", "f"),
            DistributeOptions::new(5),
        )
        .await
        .unwrap();

    assert!(report.partitions.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    // The header-only blob is still staged.
    assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn missing_bucket_fails_before_staging() {
    let registry = TaskRegistry::new();
    let storage = MemoryStorage::new();
    let dispatcher = Dispatcher::new(
        registry,
        Arc::new(storage.clone()),
        DispatchConfig::local(),
    );

    let err = dispatcher
        .distribute_table(
            &sample_table(3),
            &TaskRef::function("m", "f"),
            DistributeOptions::new(1),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::MissingBucket));
    assert!(storage.is_empty());
}

#[tokio::test]
async fn zero_rows_per_partition_fails_fast() {
    let registry = TaskRegistry::new();
    let dispatcher = local_dispatcher(registry, MemoryStorage::new());

    let err = dispatcher
        .distribute_table(
            &sample_table(3),
            &TaskRef::function("m", "f"),
            DistributeOptions::new(0),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Partition(_)));
}
