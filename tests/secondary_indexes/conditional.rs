//! Conditional index tests
//!
//! A conditional index holds exactly the primary records that currently
//! pass its predicate.

use crate::*;
use proptest::prelude::*;

fn attach_active(db: &Tessera, employees: &Primary) -> ByName {
    let active = by_name(db, "ActiveEmployees");
    db.indexes(employees)
        .add_conditional_index("IsActive", Arc::clone(&active), |e: &Employee| e.is_active)
        .unwrap();
    active
}

#[test]
fn test_is_active_flip() {
    let db = create_db();
    let employees = employees(&db);
    let active = attach_active(&db, &employees);

    employees.insert(&employee(1, 1, "Mike")).unwrap();
    assert_eq!(active.get_record_count().unwrap(), 1);

    employees.update(&inactive(1, 1, "Mike")).unwrap();
    assert_eq!(active.get_record_count().unwrap(), 0);

    employees.update(&employee(1, 1, "Mike")).unwrap();
    assert_eq!(active.get_record_count().unwrap(), 1);

    employees.delete(&employee(1, 1, "Mike")).unwrap();
    assert_eq!(active.get_record_count().unwrap(), 0);
}

#[test]
fn test_failing_record_never_enters_index() {
    let db = create_db();
    let employees = employees(&db);
    let active = attach_active(&db, &employees);

    employees.insert(&inactive(1, 1, "Idle")).unwrap();
    employees.delete(&inactive(1, 1, "Idle")).unwrap();

    assert_eq!(active.get_record_count().unwrap(), 0);
}

#[test]
fn test_bulk_insert_filters_by_predicate() {
    let db = create_db();
    let employees = employees(&db);
    let active = attach_active(&db, &employees);

    employees
        .insert_many(&[
            employee(1, 1, "A"),
            inactive(1, 2, "B"),
            employee(1, 3, "C"),
        ])
        .unwrap();

    assert_eq!(employees.get_record_count().unwrap(), 3);
    let names: Vec<String> = active
        .get_all_records()
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["A".to_string(), "C".to_string()]);
}

#[test]
fn test_conditional_and_unconditional_side_by_side() {
    let db = create_db();
    let employees = employees(&db);
    let active = attach_active(&db, &employees);
    let all = by_name(&db, "AllEmployees");
    db.indexes(&employees)
        .add_index("Name", Arc::clone(&all))
        .unwrap();

    employees.insert(&employee(1, 1, "On")).unwrap();
    employees.insert(&inactive(1, 2, "Off")).unwrap();

    assert_eq!(active.get_record_count().unwrap(), 1);
    assert_eq!(all.get_record_count().unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_is_active_flip_async() {
    let db = create_db();
    let employees = employees(&db);
    let active = attach_active(&db, &employees);

    employees.insert_async(&employee(1, 1, "Mike")).await.unwrap();
    employees.update_async(&inactive(1, 1, "Mike")).await.unwrap();
    assert_eq!(active.get_record_count_async().await.unwrap(), 0);

    employees
        .update_using_wildcard_etag_async(&employee(1, 1, "Mike"))
        .await
        .unwrap();
    assert_eq!(active.get_record_count_async().await.unwrap(), 1);

    employees
        .insert_many_async(&[inactive(1, 2, "B"), employee(1, 3, "C")])
        .await
        .unwrap();
    assert_eq!(active.get_record_count_async().await.unwrap(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// After any sequence of flag flips the index matches the active set
    #[test]
    fn test_membership_tracks_latest_state(
        flips in prop::collection::vec((0i64..6, any::<bool>()), 1..40)
    ) {
        let db = create_db();
        let employees = employees(&db);
        let active = attach_active(&db, &employees);

        for (id, is_active) in flips {
            let mut record = employee(1, id, &format!("E{}", id));
            record.is_active = is_active;
            employees.insert_or_replace(&record).unwrap();
        }

        let mut expected: Vec<String> = employees
            .get_records_by_filter(|e| e.is_active)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        expected.sort();
        let mut actual: Vec<String> = active
            .get_all_records()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        actual.sort();
        prop_assert_eq!(actual, expected);
    }
}
