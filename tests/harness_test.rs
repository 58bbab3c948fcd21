use rstest::rstest;

use docbench::backends::DocumentStore;
use docbench::conf::WorkloadConfig;
use docbench::core::{BackendKind, BenchError, Operation};
use docbench::harness::Harness;
use docbench::testutil::{MemoryStore, diploma_dataset};

fn setup(kind: BackendKind, total: usize, with_book: usize) -> (Harness, MemoryStore) {
    let store = MemoryStore::new(kind);
    let mut harness = Harness::new(diploma_dataset(total, with_book), WorkloadConfig::default());
    harness.attach(Box::new(store.clone()));
    (harness, store)
}

#[rstest]
#[case(BackendKind::Mongodb, 0)]
#[case(BackendKind::Mongodb, 7)]
#[case(BackendKind::Mongodb, 10)]
#[case(BackendKind::Couchdb, 0)]
#[case(BackendKind::Couchdb, 7)]
#[case(BackendKind::Couchdb, 10)]
#[tokio::test]
async fn test_insert_stores_exactly_n(#[case] kind: BackendKind, #[case] n: usize) {
    let (mut harness, _store) = setup(kind, 10, 0);

    let report = harness.insert(kind, n).await.unwrap();

    assert_eq!(harness.count(kind).await.unwrap(), n);
    assert_eq!(report.operation, Operation::Insert);
    assert_eq!(report.backend, kind);
    assert_eq!(report.requested_count, n);
    assert_eq!(report.affected, n);
    assert_eq!(report.result_cardinality, None);
    assert!(report.elapsed_seconds >= 0.0);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_insert_truncates_to_dataset_length(#[case] kind: BackendKind) {
    let (mut harness, _store) = setup(kind, 10, 0);

    let report = harness.insert(kind, 25).await.unwrap();

    assert_eq!(harness.count(kind).await.unwrap(), 10);
    assert_eq!(report.requested_count, 25);
    assert_eq!(report.affected, 10);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_insert_is_idempotent(#[case] kind: BackendKind) {
    let (mut harness, store) = setup(kind, 10, 0);

    harness.insert(kind, 6).await.unwrap();
    harness.insert(kind, 6).await.unwrap();

    assert_eq!(harness.count(kind).await.unwrap(), 6);
    assert_eq!(store.resets().await, 2);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_insert_keeps_dataset_order_and_leaves_dataset_untouched(#[case] kind: BackendKind) {
    let (mut harness, store) = setup(kind, 5, 0);
    let before = harness.dataset().clone();

    harness.insert(kind, 3).await.unwrap();

    let stored = store.documents().await;
    assert_eq!(stored.as_slice(), before.take(3));
    assert_eq!(harness.dataset(), &before);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_delete_zero_is_noop(#[case] kind: BackendKind) {
    let (mut harness, _store) = setup(kind, 10, 0);
    harness.insert(kind, 4).await.unwrap();

    let report = harness.delete(kind, 0).await.unwrap();

    assert_eq!(report.affected, 0);
    assert_eq!(harness.count(kind).await.unwrap(), 4);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_delete_on_empty_collection_with_zero_count(#[case] kind: BackendKind) {
    let (mut harness, _store) = setup(kind, 10, 0);

    let report = harness.delete(kind, 0).await.unwrap();

    assert_eq!(report.affected, 0);
    assert_eq!(harness.count(kind).await.unwrap(), 0);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_insert_delete_insert_scenario(#[case] kind: BackendKind) {
    let (mut harness, _store) = setup(kind, 10, 0);

    harness.insert(kind, 5).await.unwrap();
    assert_eq!(harness.count(kind).await.unwrap(), 5);

    let report = harness.delete(kind, 3).await.unwrap();
    assert_eq!(report.affected, 3);
    assert_eq!(harness.count(kind).await.unwrap(), 2);

    harness.insert(kind, 5).await.unwrap();
    assert_eq!(harness.count(kind).await.unwrap(), 5);
}

#[tokio::test]
async fn test_predicate_delete_truncates_silently() {
    let kind = BackendKind::Mongodb;
    let (mut harness, _store) = setup(kind, 10, 0);
    harness.insert(kind, 3).await.unwrap();

    let report = harness.delete(kind, 8).await.unwrap();

    assert_eq!(report.requested_count, 8);
    assert_eq!(report.affected, 3);
    assert_eq!(harness.count(kind).await.unwrap(), 0);
}

#[tokio::test]
async fn test_snapshot_delete_out_of_range_deletes_nothing() {
    let kind = BackendKind::Couchdb;
    let (mut harness, _store) = setup(kind, 10, 0);
    harness.insert(kind, 3).await.unwrap();

    let err = harness.delete(kind, 4).await.unwrap_err();

    assert_eq!(
        err,
        BenchError::OutOfRangeError {
            requested: 4,
            available: 3
        }
    );
    assert_eq!(harness.count(kind).await.unwrap(), 3);
}

#[tokio::test]
async fn test_stale_snapshot_surfaces_backend_error() {
    let kind = BackendKind::Couchdb;
    let (mut harness, store) = setup(kind, 10, 0);
    harness.insert(kind, 3).await.unwrap();

    let mut handle = store.clone();
    let mut cursor = handle.prepare_delete(2).await.unwrap();
    store.remove_external(0).await;

    let target = cursor.next_target().unwrap();
    let err = handle.delete_one(&target).await.unwrap_err();
    assert!(matches!(err, BenchError::BackendError(_)));
    assert_eq!(harness.count(kind).await.unwrap(), 2);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_find_returns_matching_cardinality(#[case] kind: BackendKind) {
    let (mut harness, _store) = setup(kind, 20, 7);
    harness.insert(kind, 20).await.unwrap();

    let report = harness.find(kind, 1).await.unwrap();

    assert_eq!(report.result_cardinality, Some(7));
    assert_eq!(report.requested_count, 1);
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_find_reports_last_iteration(#[case] kind: BackendKind) {
    let (mut harness, _store) = setup(kind, 20, 7);
    harness.insert(kind, 20).await.unwrap();

    let report = harness.find(kind, 3).await.unwrap();

    assert_eq!(report.affected, 3);
    assert_eq!(report.result_cardinality, Some(7));
}

#[rstest]
#[case(BackendKind::Mongodb)]
#[case(BackendKind::Couchdb)]
#[tokio::test]
async fn test_find_zero_iterations_reports_zero(#[case] kind: BackendKind) {
    let (mut harness, _store) = setup(kind, 20, 7);
    harness.insert(kind, 20).await.unwrap();

    let report = harness.find(kind, 0).await.unwrap();

    assert_eq!(report.affected, 0);
    assert_eq!(report.result_cardinality, Some(0));
}

#[tokio::test]
async fn test_find_respects_limit() {
    let kind = BackendKind::Mongodb;
    let mut workload = WorkloadConfig::default();
    workload.find.limit = 4;
    let mut harness = Harness::new(diploma_dataset(20, 10), workload);
    harness.attach(Box::new(MemoryStore::new(kind)));
    harness.insert(kind, 20).await.unwrap();

    let report = harness.find(kind, 1).await.unwrap();

    assert_eq!(report.result_cardinality, Some(4));
}

#[rstest]
#[case(BackendKind::Mongodb, 4, 4)]
#[case(BackendKind::Mongodb, 20, 6)]
#[case(BackendKind::Couchdb, 4, 4)]
#[case(BackendKind::Couchdb, 20, 6)]
#[case(BackendKind::Couchdb, 0, 0)]
#[tokio::test]
async fn test_update_patches_min_of_n_and_stored(
    #[case] kind: BackendKind,
    #[case] n: usize,
    #[case] expected: usize,
) {
    let (mut harness, store) = setup(kind, 10, 0);
    harness.insert(kind, 6).await.unwrap();
    let originals = store.documents().await;

    let report = harness.update(kind, n).await.unwrap();
    assert_eq!(report.affected, expected);

    let stored = store.documents().await;
    let patched: Vec<_> = stored
        .iter()
        .filter(|d| d["curso"] == "MECATRÔNICA" && d["livro"] == "P")
        .collect();
    assert_eq!(patched.len(), expected);

    for (before, after) in originals.iter().zip(stored.iter()) {
        for (field, value) in before {
            if field != "curso" && field != "livro" {
                assert_eq!(&after[field], value);
            }
        }
    }
}

#[tokio::test]
async fn test_operation_on_unconnected_backend() {
    let (mut harness, _store) = setup(BackendKind::Mongodb, 10, 0);

    let err = harness.insert(BackendKind::Couchdb, 1).await.unwrap_err();

    assert_eq!(err, BenchError::NotConnected(BackendKind::Couchdb));
}

#[tokio::test]
async fn test_insert_failure_leaves_partial_state_and_no_report() {
    let kind = BackendKind::Mongodb;
    let store = MemoryStore::failing_after(kind, 4);
    let mut harness = Harness::new(diploma_dataset(10, 0), WorkloadConfig::default());
    harness.attach(Box::new(store.clone()));

    let result = harness.insert(kind, 10).await;

    assert!(matches!(result, Err(BenchError::BackendError(_))));
    assert_eq!(store.documents().await.len(), 4);
}

#[tokio::test]
async fn test_run_dispatches_operations() {
    let kind = BackendKind::Couchdb;
    let (mut harness, _store) = setup(kind, 10, 2);

    let insert = harness.run(Operation::Insert, kind, 5).await.unwrap();
    let find = harness.run(Operation::Find, kind, 2).await.unwrap();
    let update = harness.run(Operation::Update, kind, 3).await.unwrap();
    let delete = harness.run(Operation::Delete, kind, 1).await.unwrap();

    assert_eq!(insert.operation, Operation::Insert);
    assert_eq!(find.result_cardinality, Some(2));
    assert_eq!(update.affected, 3);
    assert_eq!(delete.affected, 1);
    assert_eq!(harness.count(kind).await.unwrap(), 4);
}

#[tokio::test]
async fn test_compare_runs_both_backends_in_order() {
    let mut harness = Harness::new(diploma_dataset(10, 3), WorkloadConfig::default());
    harness.attach(Box::new(MemoryStore::new(BackendKind::Couchdb)));
    harness.attach(Box::new(MemoryStore::new(BackendKind::Mongodb)));

    let reports = harness.compare(Operation::Insert, 8).await.unwrap();

    let backends: Vec<_> = reports.iter().map(|r| r.backend).collect();
    assert_eq!(backends, vec![BackendKind::Mongodb, BackendKind::Couchdb]);
    assert!(reports.iter().all(|r| r.affected == 8));
}

#[tokio::test]
async fn test_compare_requires_both_backends() {
    let (mut harness, _store) = setup(BackendKind::Mongodb, 10, 0);

    let err = harness.compare(Operation::Find, 1).await.unwrap_err();

    assert_eq!(err, BenchError::NotConnected(BackendKind::Couchdb));
}
