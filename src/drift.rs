//! Drift reporting: compare a table against a recorded snapshot

use crate::diff::{diff, DiffResult};
use crate::error::Result;
use crate::hash::{fingerprint_of, fingerprint_of_columns, Fingerprint};
use crate::store::{Snapshot, SnapshotStore};
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Schema-level comparison used when no key-aligned diff is possible
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub row_delta: i64,
    pub columns_added: Vec<String>,
    pub columns_removed: Vec<String>,
}

/// Result of checking a table against its reference snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub reference_fingerprint: Fingerprint,
    pub current_fingerprint: Fingerprint,
    pub reference_created_at: DateTime<Utc>,
    pub reference_label: Option<String>,
    pub has_drift: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural_summary: Option<StructuralSummary>,
    /// Keyedness present on one side only
    pub key_lost: bool,
    /// The key columns' content differs between reference and current
    pub key_values_changed: bool,
}

/// Outcome of a drift check. Both non-report variants are normal cache misses.
#[derive(Debug, Clone, PartialEq)]
pub enum DriftCheck {
    /// No reference fingerprint was supplied or attached to the table
    NoReference,
    /// The reference snapshot is not in the store
    SnapshotNotFound { fingerprint: Fingerprint },
    Report(DriftReport),
}

impl DriftCheck {
    /// Human-readable reason for a missing report
    pub fn reason(&self) -> Option<String> {
        match self {
            DriftCheck::NoReference => {
                Some("No reference snapshot: record a snapshot first".to_string())
            }
            DriftCheck::SnapshotNotFound { fingerprint } => Some(format!(
                "Snapshot {} not found: it may have been evicted or recorded by another process",
                fingerprint
            )),
            DriftCheck::Report(_) => None,
        }
    }

    pub fn report(&self) -> Option<&DriftReport> {
        match self {
            DriftCheck::Report(report) => Some(report),
            _ => None,
        }
    }

    pub fn into_report(self) -> Option<DriftReport> {
        match self {
            DriftCheck::Report(report) => Some(report),
            _ => None,
        }
    }
}

impl StructuralSummary {
    pub fn between(reference: &Table, current: &Table) -> Self {
        let rows_before = reference.row_count();
        let rows_after = current.row_count();
        Self {
            rows_before,
            rows_after,
            row_delta: rows_after as i64 - rows_before as i64,
            columns_added: current
                .column_names()
                .into_iter()
                .filter(|name| !reference.has_column(name))
                .map(str::to_string)
                .collect(),
            columns_removed: reference
                .column_names()
                .into_iter()
                .filter(|name| !current.has_column(name))
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Fingerprint `table` and record it in `store`.
///
/// Attach the returned snapshot's fingerprint to later versions of the table
/// (see [`Table::with_reference`]) to check them for drift.
///
/// The snapshot keeps the bookkeeping (key columns) of the table that first
/// recorded this content. Recording identical content again with different
/// key columns returns the existing snapshot unchanged, so later checks still
/// see the first key list.
pub fn record_snapshot(table: &Table, label: Option<&str>, store: &SnapshotStore) -> Arc<Snapshot> {
    store.record(fingerprint_of(table), table, label)
}

/// True when both sides name the same distinct keys and every key column exists in both tables
fn can_diff(reference: &Table, current: &Table) -> bool {
    let keys = &reference.meta().key_columns;
    let mut seen = HashSet::new();
    !keys.is_empty()
        && *keys == current.meta().key_columns
        && keys.iter().all(|k| seen.insert(k.as_str()))
        && keys.iter().all(|k| reference.has_column(k) && current.has_column(k))
}

/// Compare each side's key columns. A side whose key columns cannot be read
/// counts as changed.
fn key_values_changed(reference: &Table, current: &Table) -> bool {
    if !reference.has_key() || !current.has_key() {
        return false;
    }
    let before = fingerprint_of_columns(reference, &reference.meta().key_columns);
    let after = fingerprint_of_columns(current, &current.meta().key_columns);
    match (before, after) {
        (Ok(before), Ok(after)) => before != after,
        _ => true,
    }
}

/// Check `current` against a recorded snapshot.
///
/// `reference` falls back to the reference attached to `current`. When both the
/// snapshot and `current` carry the same key columns a cell-level diff is
/// included, otherwise a structural summary.
pub fn check_drift(
    current: &Table,
    reference: Option<Fingerprint>,
    store: &SnapshotStore,
) -> Result<DriftCheck> {
    let Some(reference) = reference.or(current.meta().reference) else {
        log::debug!("No reference snapshot for drift check");
        return Ok(DriftCheck::NoReference);
    };

    let Some(snapshot) = store.get(reference) else {
        log::debug!("Reference snapshot {} not in store", reference);
        return Ok(DriftCheck::SnapshotNotFound {
            fingerprint: reference,
        });
    };

    let payload = snapshot.payload.as_ref();
    let current_fingerprint = fingerprint_of(current);
    let has_drift = current_fingerprint != snapshot.fingerprint;

    let (diff_result, structural_summary) = if can_diff(payload, current) {
        let result = diff(payload, &payload.meta().key_columns, current)?;
        (Some(result), None)
    } else {
        (None, Some(StructuralSummary::between(payload, current)))
    };

    let report = DriftReport {
        reference_fingerprint: snapshot.fingerprint,
        current_fingerprint,
        reference_created_at: snapshot.created_at,
        reference_label: snapshot.label.clone(),
        has_drift,
        diff: diff_result,
        structural_summary,
        key_lost: payload.has_key() != current.has_key(),
        key_values_changed: key_values_changed(payload, current),
    };

    log::debug!(
        "Drift check against {}: has_drift={}, key_lost={}, key_values_changed={}",
        reference,
        report.has_drift,
        report.key_lost,
        report.key_values_changed
    );

    Ok(DriftCheck::Report(report))
}
