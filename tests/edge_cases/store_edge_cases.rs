//! Edge case tests for the snapshot store and drift checks

use crate::common::sample_data::{id_x, sequence};
use tabwatch::{
    check_drift, fingerprint_of, record_snapshot, DriftCheck, Fingerprint, SnapshotStore, StoreConfig, Table,
};

#[test]
fn test_single_entry_store_keeps_latest() {
    let store = SnapshotStore::new(StoreConfig::new(1, u64::MAX).unwrap()).unwrap();
    for i in 0..10 {
        let snapshot = record_snapshot(&sequence(i * 10, 2), None, &store);
        assert_eq!(store.len(), 1);
        assert!(store.contains(snapshot.fingerprint));
    }
    assert_eq!(store.stats().evictions, 9);
}

#[test]
fn test_re_record_after_eviction_creates_new_entry() {
    let store = SnapshotStore::new(StoreConfig::new(1, u64::MAX).unwrap()).unwrap();
    let table = sequence(0, 2);
    let first = record_snapshot(&table, Some("first"), &store);
    record_snapshot(&sequence(10, 2), None, &store);

    let again = record_snapshot(&table, Some("again"), &store);
    assert_eq!(again.fingerprint, first.fingerprint);
    assert_eq!(again.label.as_deref(), Some("again"));
    assert!(again.sequence > first.sequence);
}

#[test]
fn test_re_record_does_not_refresh_eviction_order() {
    let store = SnapshotStore::new(StoreConfig::new(2, u64::MAX).unwrap()).unwrap();
    let a = record_snapshot(&sequence(0, 1), None, &store);
    let b = record_snapshot(&sequence(10, 1), None, &store);
    record_snapshot(&sequence(0, 1), None, &store);

    let c = record_snapshot(&sequence(20, 1), None, &store);
    assert!(!store.contains(a.fingerprint));
    assert!(store.contains(b.fingerprint));
    assert!(store.contains(c.fingerprint));
}

#[test]
fn test_empty_table_snapshot() {
    let store = SnapshotStore::default();
    let empty = Table::from_rows(&["id", "x"], vec![]).unwrap().with_key_columns(["id"]);
    let snapshot = record_snapshot(&empty, None, &store);

    let grown = id_x(&[(1, "a")]).with_key_columns(["id"]);
    let report = check_drift(&grown, Some(snapshot.fingerprint), &store)
        .unwrap()
        .into_report()
        .unwrap();

    assert!(report.has_drift);
    assert_eq!(report.diff.unwrap().added_row_count, 1);
    assert!(report.key_values_changed);
}

#[test]
fn test_unknown_fingerprint() {
    let store = SnapshotStore::default();
    record_snapshot(&sequence(0, 1), None, &store);

    let unknown = Fingerprint::from_u64(fingerprint_of(&sequence(0, 1)).as_u64() ^ 1);
    assert!(store.get(unknown).is_none());
    assert!(store.remove(unknown).is_none());
    assert_eq!(
        check_drift(&sequence(0, 1), Some(unknown), &store).unwrap(),
        DriftCheck::SnapshotNotFound { fingerprint: unknown }
    );
}

#[test]
fn test_cleared_store_reports_cache_miss() {
    let store = SnapshotStore::default();
    let table = id_x(&[(1, "a")]);
    let snapshot = record_snapshot(&table, None, &store);
    assert_eq!(store.clear_all(), 1);

    let current = table.with_reference(Some(snapshot.fingerprint));
    let check = check_drift(&current, None, &store).unwrap();
    assert!(check.report().is_none());
    assert!(check.reason().is_some());
}
