//! Reindex tests
//!
//! Backfilling an index from its primary table: completeness, predicates,
//! bounded concurrency, failures, timeouts and cancellation.

use crate::*;
use tessera::{CancellationToken, Error, ReindexOptions};

fn recorder() -> (Arc<Mutex<Vec<usize>>>, impl Fn(usize) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |n| sink.lock().push(n))
}

fn seed(employees: &Primary, count: i64) {
    let records: Vec<Employee> = (0..count)
        .map(|i| employee(1, i, &format!("Employee{:03}", i)))
        .collect();
    employees.insert_many(&records).unwrap();
}

// =============================================================================
// COMPLETENESS
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_name_index_backfill() {
    let db = create_db();
    let employees = employees(&db);
    employees.insert(&employee(99, 1, "Test")).unwrap();
    employees.insert(&employee(99, 2, "Other")).unwrap();

    db.indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByName"))
        .unwrap();
    let (progress, on_progress) = recorder();

    let count = db
        .indexes(&employees)
        .reindex("Name", ReindexOptions::new().on_progress(on_progress))
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(progress.lock().last().copied(), Some(2));

    let indexes = db.indexes(&employees);
    let hit = indexes
        .get_record_by_index_raw("Name", "99", "Test")
        .unwrap()
        .unwrap();
    assert_eq!(hit.id, 1);
    assert_eq!(
        indexes.get_by_index_partition_key_raw("Name", "99").unwrap().len(),
        2
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reindex_across_pages() {
    let db = create_db();
    let employees = employees(&db);
    seed(&employees, 25);
    let index = by_name(&db, "EmployeesByName");
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&index))
        .unwrap();
    let (progress, on_progress) = recorder();

    let count = db
        .indexes(&employees)
        .reindex(
            "Name",
            ReindexOptions::new()
                .page_size(10)
                .max_concurrency(4)
                .on_progress(on_progress),
        )
        .await
        .unwrap();

    assert_eq!(count, 25);
    assert_eq!(index.get_record_count().unwrap(), 25);

    // One report per page plus the final one, never decreasing
    let progress = progress.lock().clone();
    assert_eq!(progress.len(), 4);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last().copied(), Some(25));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reindex_is_repeatable() {
    let db = create_db();
    let employees = employees(&db);
    seed(&employees, 5);
    let index = by_name(&db, "EmployeesByName");
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&index))
        .unwrap();

    for _ in 0..2 {
        let count = db
            .indexes(&employees)
            .reindex("Name", ReindexOptions::new())
            .await
            .unwrap();
        assert_eq!(count, 5);
    }
    assert_eq!(index.get_record_count().unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_conditional_reindex_counts_passing_records() {
    let db = create_db();
    let employees = employees(&db);
    employees
        .insert_many(&[
            employee(1, 1, "A"),
            inactive(1, 2, "B"),
            employee(1, 3, "C"),
            inactive(1, 4, "D"),
            employee(1, 5, "E"),
        ])
        .unwrap();
    let active = by_name(&db, "ActiveEmployees");
    db.indexes(&employees)
        .add_conditional_index("IsActive", Arc::clone(&active), |e: &Employee| e.is_active)
        .unwrap();

    let count = db
        .indexes(&employees)
        .reindex("IsActive", ReindexOptions::new())
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(active.get_record_count().unwrap(), 3);
    assert!(active
        .get_all_records()
        .unwrap()
        .iter()
        .all(|e| e.is_active));
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_upserts_are_drained_and_bounded() {
    let db = create_db();
    let employees = employees(&db);
    seed(&employees, 8);
    let (index, faulty) = faulty_by_name(
        &db,
        "EmployeesByName",
        Faults::slow(Duration::from_millis(40)),
    );
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&index))
        .unwrap();

    let count = db
        .indexes(&employees)
        .reindex("Name", ReindexOptions::new().max_concurrency(2))
        .await
        .unwrap();

    // Every upsert finished before the call returned
    assert_eq!(count, 8);
    assert_eq!(index.get_record_count().unwrap(), 8);
    assert_eq!(faulty.attempted_writes().len(), 8);
    assert!(faulty.peak_concurrency() <= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gate_timeout_aborts_after_draining() {
    let db = create_db();
    let employees = employees(&db);
    seed(&employees, 3);
    let (index, _faulty) = faulty_by_name(
        &db,
        "EmployeesByName",
        Faults::slow(Duration::from_millis(300)),
    );
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&index))
        .unwrap();

    let err: Error = db
        .indexes(&employees)
        .reindex(
            "Name",
            ReindexOptions::new()
                .max_concurrency(1)
                .gate_timeout(Duration::from_millis(20)),
        )
        .await
        .unwrap_err()
        .into();

    assert!(matches!(err, Error::Timeout(_)));
    // The upsert holding the only slot still completed
    assert_eq!(index.get_record_count().unwrap(), 1);
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_upserts_reach_failure_callback() {
    let db = create_db();
    let employees = employees(&db);
    employees
        .insert_many(&[
            employee(1, 1, "Good"),
            employee(1, 2, "Bad"),
            employee(1, 3, "Fine"),
        ])
        .unwrap();
    let (index, _faulty) = faulty_by_name(&db, "EmployeesByName", Faults::failing(&["Bad"]));
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&index))
        .unwrap();

    let failed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failed);
    let count = db
        .indexes(&employees)
        .reindex(
            "Name",
            ReindexOptions::new().on_failure(move |e: &Employee, err| {
                sink.lock().push((e.name.clone(), err.to_string()));
            }),
        )
        .await
        .unwrap();

    // Failed records still count as processed
    assert_eq!(count, 3);
    assert_eq!(index.get_record_count().unwrap(), 2);

    let failed = failed.lock().clone();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "Bad");
    assert!(failed[0].1.contains("injected failure"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reindex_unknown_index() {
    let db = create_db();
    let employees = employees(&db);

    let err: Error = db
        .indexes(&employees)
        .reindex("Missing", ReindexOptions::new())
        .await
        .unwrap_err()
        .into();

    assert!(matches!(err, Error::IndexNotFound(_)));
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_before_start() {
    let db = create_db();
    let employees = employees(&db);
    seed(&employees, 3);
    let index = by_name(&db, "EmployeesByName");
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&index))
        .unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err: Error = db
        .indexes(&employees)
        .reindex("Name", ReindexOptions::new().cancellation(token))
        .await
        .unwrap_err()
        .into();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(index.get_record_count().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_between_pages() {
    let db = create_db();
    let employees = employees(&db);
    seed(&employees, 5);
    let index = by_name(&db, "EmployeesByName");
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&index))
        .unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    let err: Error = db
        .indexes(&employees)
        .reindex(
            "Name",
            ReindexOptions::new()
                .page_size(1)
                .cancellation(token)
                .on_progress(move |_| trigger.cancel()),
        )
        .await
        .unwrap_err()
        .into();

    assert!(matches!(err, Error::Cancelled));
    // Only the first page was processed, and it was drained
    assert_eq!(index.get_record_count().unwrap(), 1);
}
