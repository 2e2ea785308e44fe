//! End-to-end scenarios for the diff engine and snapshot store

use crate::common::sample_data::{id_x, sequence};
use tabwatch::{diff, fingerprint_of, record_snapshot, SnapshotStore, StoreConfig, Table, Value};

fn ids(values: &[i64]) -> Table {
    Table::from_rows(&["id"], values.iter().map(|&v| vec![Value::from(v)]).collect()).unwrap()
}

#[test]
fn test_modify_one_cell() {
    let reference = id_x(&[(1, "a"), (2, "b"), (3, "c")]);
    let current = id_x(&[(1, "a"), (2, "B"), (3, "c")]);

    let result = diff(&reference, &["id"], &current).unwrap();

    assert_eq!(result.modified_row_count, 1);
    assert_eq!(result.unchanged_row_count, 2);
    assert_eq!(result.removed_row_count, 0);
    assert_eq!(result.added_row_count, 0);

    let changes = &result.per_column_changes["x"];
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, vec![Value::from(2)]);
    assert_eq!(changes[0].old_value, Value::from("b"));
    assert_eq!(changes[0].new_value, Value::from("B"));
}

#[test]
fn test_add_and_remove() {
    let result = diff(&ids(&[1, 2, 3]), &["id"], &ids(&[2, 3, 4])).unwrap();

    assert_eq!(result.removed_row_count, 1);
    assert_eq!(result.added_row_count, 1);
    assert_eq!(result.unchanged_row_count, 2);
    assert_eq!(result.modified_row_count, 0);
    assert_eq!(result.removed_rows, vec![vec![Value::from(1)]]);
    assert_eq!(result.added_rows, vec![vec![Value::from(4)]]);
    assert!(result.per_column_changes.is_empty());
}

#[test]
fn test_na_handling() {
    let reference = Table::from_rows(
        &["id", "x"],
        vec![
            vec![Value::from(1), Value::from(1)],
            vec![Value::from(2), Value::Null],
            vec![Value::from(3), Value::from(3)],
        ],
    )
    .unwrap();
    let current = Table::from_rows(
        &["id", "x"],
        vec![
            vec![Value::from(1), Value::from(1)],
            vec![Value::from(2), Value::from(2)],
            vec![Value::from(3), Value::Null],
        ],
    )
    .unwrap();

    let result = diff(&reference, &["id"], &current).unwrap();
    assert_eq!(result.modified_row_count, 2);
    assert_eq!(result.unchanged_row_count, 1);

    let changes = &result.per_column_changes["x"];
    assert_eq!(changes[0].old_value, Value::Null);
    assert_eq!(changes[0].new_value, Value::from(2));
    assert_eq!(changes[1].old_value, Value::from(3));
    assert_eq!(changes[1].new_value, Value::Null);
}

#[test]
fn test_na_to_na_is_unchanged() {
    let table = Table::from_rows(
        &["id", "x"],
        vec![vec![Value::from(1), Value::Null], vec![Value::from(2), Value::from(f64::NAN)]],
    )
    .unwrap();
    let result = diff(&table, &["id"], &table.clone()).unwrap();
    assert_eq!(result.unchanged_row_count, 2);
    assert!(!result.has_changes());
}

#[test]
fn test_eviction_by_count() {
    let store = SnapshotStore::new(StoreConfig::new(2, u64::MAX).unwrap()).unwrap();
    let a = record_snapshot(&sequence(0, 1), Some("A"), &store);
    let b = record_snapshot(&sequence(10, 1), Some("B"), &store);
    let c = record_snapshot(&sequence(20, 1), Some("C"), &store);

    let listed: Vec<_> = store.list().into_iter().map(|s| s.fingerprint).collect();
    assert_eq!(listed, vec![b.fingerprint, c.fingerprint]);
    assert!(!listed.contains(&a.fingerprint));
}

#[test]
fn test_composite_key_with_reordered_rows() {
    let reference = Table::from_rows(
        &["region", "day", "sales"],
        vec![
            vec![Value::from("north"), Value::from(1), Value::from(10.0)],
            vec![Value::from("north"), Value::from(2), Value::from(12.5)],
            vec![Value::from("south"), Value::from(1), Value::from(7.0)],
        ],
    )
    .unwrap();
    let current = Table::from_rows(
        &["region", "day", "sales"],
        vec![
            vec![Value::from("south"), Value::from(1), Value::from(7.0)],
            vec![Value::from("north"), Value::from(2), Value::from(13.0)],
            vec![Value::from("north"), Value::from(1), Value::from(10.0)],
        ],
    )
    .unwrap();

    assert_ne!(fingerprint_of(&reference), fingerprint_of(&current));

    let result = diff(&reference, &["region", "day"], &current).unwrap();
    assert_eq!(result.modified_row_count, 1);
    assert_eq!(result.unchanged_row_count, 2);
    assert_eq!(
        result.per_column_changes["sales"][0].key,
        vec![Value::from("north"), Value::from(2)]
    );
}

#[test]
fn test_changes_listed_in_reference_column_order() {
    let reference = Table::from_rows(
        &["id", "b", "a"],
        vec![vec![Value::from(1), Value::from("x"), Value::from("y")]],
    )
    .unwrap();
    let current = Table::from_rows(
        &["a", "id", "b"],
        vec![vec![Value::from("Y"), Value::from(1), Value::from("X")]],
    )
    .unwrap();

    let result = diff(&reference, &["id"], &current).unwrap();
    let columns: Vec<&str> = result.per_column_changes.keys().map(String::as_str).collect();
    assert_eq!(columns, vec!["b", "a"]);
    assert_eq!(result.changed_cell_count(), 2);
    assert_eq!(result.modified_row_count, 1);
}

#[test]
fn test_column_set_differences() {
    let reference = Table::from_rows(
        &["id", "old", "x"],
        vec![vec![Value::from(1), Value::from(true), Value::from("a")]],
    )
    .unwrap();
    let current = Table::from_rows(
        &["id", "x", "new"],
        vec![vec![Value::from(1), Value::from("a"), Value::from(5)]],
    )
    .unwrap();

    let result = diff(&reference, &["id"], &current).unwrap();
    assert_eq!(result.columns_only_in_reference, vec!["old".to_string()]);
    assert_eq!(result.columns_only_in_current, vec!["new".to_string()]);
    assert_eq!(result.unchanged_row_count, 1);
    assert!(result.has_changes());
}
