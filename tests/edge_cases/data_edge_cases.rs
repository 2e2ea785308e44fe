//! Edge case tests for unusual tables and input files

use crate::common::{sample_data::id_x, TestFixture};
use tabwatch::data::DataProcessor;
use tabwatch::{diff, fingerprint_of, Table, TabwatchError, Value};

#[test]
fn test_empty_tables_diff() {
    let empty = Table::from_rows(&["id", "x"], vec![]).unwrap();
    let result = diff(&empty, &["id"], &empty).unwrap();
    assert_eq!(result.unchanged_row_count, 0);
    assert!(!result.has_changes());

    let filled = id_x(&[(1, "a"), (2, "b")]);
    let result = diff(&empty, &["id"], &filled).unwrap();
    assert_eq!(result.added_row_count, 2);
    let result = diff(&filled, &["id"], &empty).unwrap();
    assert_eq!(result.removed_row_count, 2);
}

#[test]
fn test_zero_column_table_fingerprint() {
    let table = Table::new(vec![]).unwrap();
    assert_eq!(table.row_count(), 0);
    assert_eq!(fingerprint_of(&table), fingerprint_of(&Table::default()));
}

#[test]
fn test_null_keys_align() {
    let reference = Table::from_rows(
        &["id", "x"],
        vec![
            vec![Value::Null, Value::from("a")],
            vec![Value::from(1), Value::from("b")],
        ],
    )
    .unwrap();
    let current = Table::from_rows(
        &["id", "x"],
        vec![
            vec![Value::from(1), Value::from("b")],
            vec![Value::Null, Value::from("z")],
        ],
    )
    .unwrap();

    let result = diff(&reference, &["id"], &current).unwrap();
    assert_eq!(result.modified_row_count, 1);
    assert_eq!(result.unchanged_row_count, 1);
    assert_eq!(result.per_column_changes["x"][0].key, vec![Value::Null]);
}

#[test]
fn test_duplicate_keys_pair_by_occurrence() {
    let reference = id_x(&[(1, "a"), (1, "b"), (1, "c"), (2, "d")]);
    let current = id_x(&[(1, "a"), (1, "B"), (2, "d"), (2, "e")]);

    let result = diff(&reference, &["id"], &current).unwrap();

    // (1,a)-(1,a), (1,b)-(1,B), (2,d)-(2,d); (1,c) surplus removed, (2,e) surplus added
    assert_eq!(result.unchanged_row_count, 2);
    assert_eq!(result.modified_row_count, 1);
    assert_eq!(result.removed_rows, vec![vec![Value::from(1), Value::from("c")]]);
    assert_eq!(result.added_rows, vec![vec![Value::from(2), Value::from("e")]]);
}

#[test]
fn test_duplicate_keys_surplus_on_current_side() {
    let reference = id_x(&[(1, "a"), (2, "b")]);
    let current = id_x(&[(1, "a"), (2, "b"), (1, "x"), (3, "c"), (2, "y"), (1, "z")]);

    let result = diff(&reference, &["id"], &current).unwrap();

    assert_eq!(result.unchanged_row_count, 2);
    assert_eq!(result.removed_row_count, 0);
    assert_eq!(result.added_row_count, 4);
    assert_eq!(
        result.added_rows,
        vec![
            vec![Value::from(1), Value::from("x")],
            vec![Value::from(3), Value::from("c")],
            vec![Value::from(2), Value::from("y")],
            vec![Value::from(1), Value::from("z")],
        ]
    );
}

#[test]
fn test_key_type_change_breaks_alignment() {
    let reference = id_x(&[(1, "a")]);
    let current = Table::from_rows(
        &["id", "x"],
        vec![vec![Value::from("1"), Value::from("a")]],
    )
    .unwrap();

    let result = diff(&reference, &["id"], &current).unwrap();
    assert_eq!(result.removed_row_count, 1);
    assert_eq!(result.added_row_count, 1);
}

#[test]
fn test_value_type_change_is_modification() {
    let reference = Table::from_rows(&["id", "v"], vec![vec![Value::from(1), Value::from(1)]]).unwrap();
    let current = Table::from_rows(&["id", "v"], vec![vec![Value::from(1), Value::from(1.0)]]).unwrap();

    let result = diff(&reference, &["id"], &current).unwrap();
    assert_eq!(result.modified_row_count, 1);
}

#[test]
fn test_diff_key_errors() {
    let table = id_x(&[(1, "a")]);
    let no_keys: [&str; 0] = [];

    assert!(matches!(diff(&table, &no_keys, &table), Err(TabwatchError::InvalidKey { .. })));
    assert!(matches!(diff(&table, &["id", "id"], &table), Err(TabwatchError::InvalidKey { .. })));

    let without_id = Table::from_rows(&["x"], vec![vec![Value::from("a")]]).unwrap();
    match diff(&table, &["id"], &without_id) {
        Err(TabwatchError::MissingColumn { column, context }) => {
            assert_eq!(column, "id");
            assert!(context.contains("current"));
        }
        other => panic!("Expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_ragged_and_duplicate_columns_rejected() {
    assert!(Table::from_rows(&["a", "b"], vec![vec![Value::from(1)]]).is_err());
    assert!(Table::from_rows(&["a", "a"], vec![]).is_err());
}

#[test]
fn test_unicode_text() {
    let reference = Table::from_rows(
        &["id", "name"],
        vec![vec![Value::from(1), Value::from("Café ☕")], vec![Value::from(2), Value::from("北京")]],
    )
    .unwrap();
    let current = Table::from_rows(
        &["id", "name"],
        vec![vec![Value::from(1), Value::from("Cafe ☕")], vec![Value::from(2), Value::from("北京")]],
    )
    .unwrap();

    assert_ne!(fingerprint_of(&reference), fingerprint_of(&current));
    assert_eq!(diff(&reference, &["id"], &current).unwrap().modified_row_count, 1);
}

#[test]
fn test_malformed_and_unsupported_files() {
    let fixture = TestFixture::new().unwrap();
    let malformed = fixture.create_raw("bad.json", "[{\"id\": 1,").unwrap();
    let unsupported = fixture.create_raw("data.csv", "id\n1\n").unwrap();
    let nested = fixture.create_raw("nested.json", r#"[{"id": 1, "tags": ["a"]}]"#).unwrap();
    let bad_line = fixture.create_raw("bad.jsonl", "{\"id\": 1}\nnot json\n").unwrap();

    for path in [&malformed, &unsupported, &nested, &bad_line] {
        assert!(
            matches!(DataProcessor::load_table(path), Err(TabwatchError::InvalidInput { .. })),
            "{} should be rejected",
            path.display()
        );
    }
}

#[test]
fn test_ragged_column_object_and_unreadable_file() {
    let fixture = TestFixture::new().unwrap();
    let ragged = fixture
        .create_raw("ragged.json", r#"{"id": [1, 2], "x": ["a"]}"#)
        .unwrap();
    let corrupted = fixture.create_corrupted_file("corrupted.json").unwrap();

    assert!(matches!(
        DataProcessor::load_table(&ragged),
        Err(TabwatchError::DataProcessing { .. })
    ));
    match DataProcessor::load_table(&corrupted) {
        Err(TabwatchError::Generic(e)) => assert!(e.to_string().contains("corrupted.json")),
        other => panic!("Expected read failure, got {:?}", other),
    }
}

#[test]
fn test_json_lines_file() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_raw("rows.ndjson", "{\"id\": 1, \"x\": \"a\"}\n{\"id\": 2}\n")
        .unwrap();

    let table = DataProcessor::load_table(&path).unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column("x").unwrap().values[1], Value::Null);
}
