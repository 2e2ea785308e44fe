//! Randomized properties of fingerprints, the store bounds and the diff engine

use proptest::prelude::*;
use std::collections::HashSet;
use tabwatch::{diff, fingerprint_of, SnapshotStore, StoreConfig, Table, Value};

/// Keyed table: unique `id` plus one nullable integer column
fn keyed_table(rows: &[(i64, Option<i64>)]) -> Table {
    Table::from_rows(
        &["id", "v"],
        rows.iter()
            .map(|(id, v)| vec![Value::from(*id), Value::from(*v)])
            .collect(),
    )
    .unwrap()
}

fn unique_rows() -> impl Strategy<Value = Vec<(i64, Option<i64>)>> {
    prop::collection::btree_map(0i64..200, prop::option::of(-5i64..5), 0..40)
        .prop_map(|rows| rows.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_bounds_hold_after_every_record(
        max_entries in 1usize..6,
        max_bytes in 200u64..4000,
        lengths in prop::collection::vec(0usize..60, 1..40),
    ) {
        let store = SnapshotStore::new(StoreConfig::new(max_entries, max_bytes).unwrap()).unwrap();

        for (i, len) in lengths.iter().enumerate() {
            let table = Table::from_rows(
                &["n"],
                (0..*len as i64).map(|r| vec![Value::from(i as i64 * 1000 + r)]).collect(),
            )
            .unwrap();
            let snapshot = store.record(fingerprint_of(&table), &table, None);

            let stats = store.stats();
            prop_assert!(stats.entry_count <= max_entries);
            prop_assert!(stats.entry_count == 1 || stats.total_bytes <= max_bytes);
            prop_assert!(store.contains(snapshot.fingerprint));
            let listed: u64 = store.list().iter().map(|s| s.payload_size).sum();
            prop_assert_eq!(listed, stats.total_bytes);
        }
    }

    #[test]
    fn prop_recording_twice_is_idempotent(rows in unique_rows()) {
        let store = SnapshotStore::default();
        let table = keyed_table(&rows);

        let first = store.record(fingerprint_of(&table), &table, None);
        let copy = keyed_table(&rows);
        let second = store.record(fingerprint_of(&copy), &copy, None);

        prop_assert_eq!(first.fingerprint, second.fingerprint);
        prop_assert_eq!(store.len(), 1);
    }

    #[test]
    fn prop_diff_with_itself_is_noop(rows in unique_rows()) {
        let table = keyed_table(&rows);
        let result = diff(&table, &["id"], &table).unwrap();

        prop_assert_eq!(result.removed_row_count, 0);
        prop_assert_eq!(result.added_row_count, 0);
        prop_assert_eq!(result.modified_row_count, 0);
        prop_assert_eq!(result.unchanged_row_count, table.row_count());
    }

    #[test]
    fn prop_diff_accounts_for_every_key(reference in unique_rows(), current in unique_rows()) {
        let before = keyed_table(&reference);
        let after = keyed_table(&current);
        let result = diff(&before, &["id"], &after).unwrap();

        prop_assert_eq!(
            result.removed_row_count + result.modified_row_count + result.unchanged_row_count,
            before.row_count()
        );
        prop_assert_eq!(
            result.added_row_count + result.modified_row_count + result.unchanged_row_count,
            after.row_count()
        );

        let reference_ids: HashSet<i64> = reference.iter().map(|(id, _)| *id).collect();
        let current_ids: HashSet<i64> = current.iter().map(|(id, _)| *id).collect();
        prop_assert_eq!(result.removed_row_count, reference_ids.difference(&current_ids).count());
        prop_assert_eq!(result.added_row_count, current_ids.difference(&reference_ids).count());

        let changed = result.per_column_changes.get("v").map_or(0, Vec::len);
        prop_assert_eq!(changed, result.modified_row_count);
    }

    #[test]
    fn prop_single_cell_edit_changes_fingerprint(
        rows in unique_rows().prop_filter("non-empty", |r| !r.is_empty()),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut edited = rows.clone();
        let i = pick.index(edited.len());
        edited[i].1 = match edited[i].1 {
            Some(v) => Some(v + 100),
            None => Some(0),
        };

        prop_assert_ne!(fingerprint_of(&keyed_table(&rows)), fingerprint_of(&keyed_table(&edited)));
    }
}
