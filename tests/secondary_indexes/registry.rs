//! Index registry tests
//!
//! Name uniqueness, removal, and private versus process-wide registries.

use crate::*;
use tessera::{Error, SecondaryIndexes};

#[test]
fn test_add_index_registers_name() {
    let db = create_db();
    let employees = employees(&db);

    db.indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByName"))
        .unwrap();

    assert!(db.registry().contains("Name"));
    assert_eq!(db.registry().names(), vec!["Name".to_string()]);
}

#[test]
fn test_duplicate_name_is_rejected() {
    let db = create_db();
    let employees = employees(&db);

    db.indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByName"))
        .unwrap();
    let err: Error = db
        .indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByNameCopy"))
        .unwrap_err()
        .into();

    assert!(matches!(err, Error::DuplicateIndex(ref n) if n == "Name"));
    assert_eq!(db.registry().len(), 1);
}

#[test]
fn test_duplicate_conditional_name_is_rejected() {
    let db = create_db();
    let employees = employees(&db);

    db.indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByName"))
        .unwrap();
    let result = db.indexes(&employees).add_conditional_index(
        "Name",
        by_name(&db, "ActiveByName"),
        |e: &Employee| e.is_active,
    );

    assert!(result.is_err());
}

#[test]
fn test_remove_unknown_index_is_noop() {
    let db = create_db();
    let employees = employees(&db);

    db.indexes(&employees).remove_index("Missing");
    assert!(db.registry().is_empty());
}

#[test]
fn test_name_reusable_after_remove() {
    let db = create_db();
    let employees = employees(&db);

    db.indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByName"))
        .unwrap();
    db.indexes(&employees).remove_index("Name");
    assert!(!db.registry().contains("Name"));

    db.indexes(&employees)
        .add_index("Name", by_name(&db, "EmployeesByNameV2"))
        .unwrap();
    assert!(db.registry().contains("Name"));
}

#[test]
fn test_global_registry_is_shared() {
    let a = Tessera::builder().global_registry().build();
    let b = Tessera::builder().global_registry().build();
    let employees = employees(&a);
    let name = "GlobalRegistrySharedName";

    a.indexes(&employees)
        .add_index(name, by_name(&a, "GlobalByName"))
        .unwrap();
    assert!(b.registry().contains(name));

    // The trait entry point uses the same registry
    assert!(employees.indexes().registry().contains(name));

    b.indexes(&employees).remove_index(name);
    assert!(!a.registry().contains(name));
}
