//! Index lookup tests
//!
//! Point and partition reads through a named index, typed and raw.

use crate::*;
use tessera::Error;

fn seeded() -> (Tessera, Primary) {
    let db = create_db();
    let employees = employees(&db);
    db.indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByName"))
        .unwrap();
    employees
        .insert_many(&[
            employee(99, 1, "Test"),
            employee(99, 2, "Other"),
            employee(99, 3, "Third"),
            employee(7, 4, "Test"),
        ])
        .unwrap();
    (db, employees)
}

#[test]
fn test_point_lookup() {
    let (db, employees) = seeded();
    let indexes = db.indexes(&employees);

    let typed = indexes
        .get_record_by_index::<i64, String>("Name", &99, &"Test".to_string())
        .unwrap()
        .unwrap();
    assert_eq!(typed.id, 1);

    let raw = indexes
        .get_record_by_index_raw("Name", "7", "Test")
        .unwrap()
        .unwrap();
    assert_eq!(raw.id, 4);

    let missing = indexes
        .get_record_by_index_raw("Name", "99", "Nobody")
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_partition_lookup() {
    let (db, employees) = seeded();
    let indexes = db.indexes(&employees);

    let company = indexes
        .get_by_index_partition_key::<i64, String>("Name", &99)
        .unwrap();
    assert_eq!(company.len(), 3);

    // Rows come back in index row key order
    let names: Vec<String> = indexes
        .get_by_index_partition_key_raw("Name", "99")
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["Other", "Test", "Third"]);

    assert!(indexes
        .get_by_index_partition_key_raw("Name", "12345")
        .unwrap()
        .is_empty());
}

#[test]
fn test_paged_partition_lookup() {
    let (db, employees) = seeded();
    let indexes = db.indexes(&employees);

    let first = indexes
        .get_by_index_partition_key_paged::<i64, String>("Name", &99, 2, None)
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert!(!first.is_final_page);

    let second = indexes
        .get_by_index_partition_key_paged_raw(
            "Name",
            "99",
            2,
            first.continuation_token.as_deref(),
        )
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(second.is_final_page);
    assert!(second.continuation_token.is_none());
}

#[test]
fn test_unknown_index_name() {
    let (db, employees) = seeded();
    let indexes = db.indexes(&employees);

    let err: Error = indexes
        .get_record_by_index_raw("Missing", "99", "Test")
        .unwrap_err()
        .into();
    assert!(matches!(err, Error::IndexNotFound(ref n) if n == "Missing"));

    let err: Error = indexes
        .get_by_index_partition_key_raw("Missing", "99")
        .unwrap_err()
        .into();
    assert!(err.is_not_found());
}

#[test]
fn test_wrong_key_types() {
    let (db, employees) = seeded();

    let err: Error = db
        .indexes(&employees)
        .get_record_by_index::<String, String>("Name", &"99".to_string(), &"Test".to_string())
        .unwrap_err()
        .into();
    assert!(matches!(err, Error::IndexTypeMismatch(_)));
}

#[test]
fn test_typed_index_handle() {
    let (db, employees) = seeded();

    let index = db
        .indexes(&employees)
        .index::<i64, String>("Name")
        .unwrap();
    assert_eq!(index.table_name(), "EmployeesByName");
    assert_eq!(index.get_record_count().unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_async_lookups() {
    let (db, employees) = seeded();
    let indexes = db.indexes(&employees);

    let hit = indexes
        .get_record_by_index_async::<i64, String>("Name", &99, &"Test".to_string())
        .await
        .unwrap();
    assert_eq!(hit.map(|e| e.id), Some(1));

    let raw = indexes
        .get_record_by_index_raw_async("Name", "7", "Test")
        .await
        .unwrap();
    assert!(raw.is_some());

    let company = indexes
        .get_by_index_partition_key_async::<i64, String>("Name", &99)
        .await
        .unwrap();
    assert_eq!(company.len(), 3);

    let page = indexes
        .get_by_index_partition_key_paged_raw_async("Name", "99", 10, None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.is_final_page);
}
