//! Key-aligned row and cell comparison between two versions of a table

use crate::error::{Result, TabwatchError};
use crate::table::{KeyAtom, Table, Value};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One changed cell of a modified row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange {
    /// Key tuple of the row, in key column order
    pub key: Vec<Value>,
    pub old_value: Value,
    pub new_value: Value,
}

/// Outcome of comparing a reference table with a current table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    pub key_columns: Vec<String>,
    pub removed_row_count: usize,
    pub added_row_count: usize,
    pub modified_row_count: usize,
    pub unchanged_row_count: usize,
    /// Column layout of `removed_rows`
    pub reference_columns: Vec<String>,
    /// Full reference rows whose key is gone, in reference row order
    pub removed_rows: Vec<Vec<Value>>,
    /// Column layout of `added_rows`
    pub current_columns: Vec<String>,
    /// Full current rows with a new key, in current row order
    pub added_rows: Vec<Vec<Value>>,
    /// Changed cells per value column, only for columns with at least one change
    pub per_column_changes: IndexMap<String, Vec<CellChange>>,
    pub columns_only_in_reference: Vec<String>,
    pub columns_only_in_current: Vec<String>,
}

impl DiffResult {
    /// True when any row was added, removed or modified, or the column sets differ
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
            || !self.columns_only_in_reference.is_empty()
            || !self.columns_only_in_current.is_empty()
    }

    /// Number of rows that were added, removed or modified
    pub fn total_changes(&self) -> usize {
        self.removed_row_count + self.added_row_count + self.modified_row_count
    }

    /// Number of changed cells across all columns
    pub fn changed_cell_count(&self) -> usize {
        self.per_column_changes.values().map(Vec::len).sum()
    }
}

/// A value column present in both tables: (name, reference index, current index)
type SharedColumn<'a> = (&'a str, usize, usize);

/// Column indices of the key columns in `table`
fn resolve_key_indices<S: AsRef<str>>(table: &Table, key_columns: &[S], side: &str) -> Result<Vec<usize>> {
    key_columns
        .iter()
        .map(|name| {
            let name = name.as_ref();
            table
                .column_index(name)
                .ok_or_else(|| TabwatchError::missing_column(name, format!("{} table", side)))
        })
        .collect()
}

fn key_of<'a>(table: &'a Table, key_indices: &[usize], row: usize) -> Vec<KeyAtom<'a>> {
    key_indices
        .iter()
        .map(|&col| table.columns()[col].values[row].key_atom())
        .collect()
}

fn key_values(table: &Table, key_indices: &[usize], row: usize) -> Vec<Value> {
    key_indices
        .iter()
        .map(|&col| table.columns()[col].values[row].clone())
        .collect()
}

/// Pair reference rows with current rows by key.
///
/// The k-th reference row carrying a key pairs with the k-th current row
/// carrying the same key. Surplus duplicates on either side stay unpaired and
/// are reported as removed or added rows, so the pairing is total and
/// deterministic without assuming keys are unique.
fn align_rows(
    reference: &Table,
    reference_keys: &[usize],
    current: &Table,
    current_keys: &[usize],
) -> (Vec<(usize, usize)>, Vec<usize>, Vec<usize>) {
    let mut current_by_key: HashMap<Vec<KeyAtom<'_>>, Vec<usize>> = HashMap::new();
    for row in 0..current.row_count() {
        current_by_key
            .entry(key_of(current, current_keys, row))
            .or_default()
            .push(row);
    }

    let mut occurrences: HashMap<Vec<KeyAtom<'_>>, usize> = HashMap::new();
    let mut matched = Vec::new();
    let mut removed = Vec::new();
    let mut current_matched = vec![false; current.row_count()];

    for row in 0..reference.row_count() {
        let key = key_of(reference, reference_keys, row);
        let candidates = current_by_key.get(&key);
        let occurrence = occurrences.entry(key).or_insert(0);

        match candidates.and_then(|rows| rows.get(*occurrence)) {
            Some(&current_row) => {
                matched.push((row, current_row));
                current_matched[current_row] = true;
            }
            None => removed.push(row),
        }
        *occurrence += 1;
    }

    let added = current_matched
        .iter()
        .enumerate()
        .filter(|&(_, &is_matched)| !is_matched)
        .map(|(row, _)| row)
        .collect();

    (matched, removed, added)
}

/// Value columns (non-key, present on both sides) in reference column order
fn shared_value_columns<'a, S: AsRef<str>>(
    reference: &'a Table,
    current: &Table,
    key_columns: &[S],
) -> Vec<SharedColumn<'a>> {
    let keys: HashSet<&str> = key_columns.iter().map(|k| k.as_ref()).collect();
    reference
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| !keys.contains(column.name.as_str()))
        .filter_map(|(ref_idx, column)| {
            current
                .column_index(&column.name)
                .map(|cur_idx| (column.name.as_str(), ref_idx, cur_idx))
        })
        .collect()
}

/// Positions (into the shared column list) of the cells that differ in one matched pair
fn compare_pair(
    reference: &Table,
    current: &Table,
    columns: &[SharedColumn<'_>],
    reference_row: usize,
    current_row: usize,
) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, (_, ref_idx, cur_idx))| {
            let old = &reference.columns()[*ref_idx].values[reference_row];
            let new = &current.columns()[*cur_idx].values[current_row];
            !old.na_eq(new)
        })
        .map(|(pos, _)| pos)
        .collect()
}

fn names_not_in(table: &Table, other: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| !other.has_column(&c.name))
        .map(|c| c.name.clone())
        .collect()
}

/// Compare `current` against `reference`, aligning rows by `key_columns`.
///
/// Rows whose key only occurs in the reference are removed, rows whose key only
/// occurs in the current table are added. Matched rows are modified when any
/// shared non-key column differs under NA-safe equality, unchanged otherwise.
/// Columns present on one side only are reported as column-set differences.
pub fn diff<S: AsRef<str>>(reference: &Table, key_columns: &[S], current: &Table) -> Result<DiffResult> {
    if key_columns.is_empty() {
        return Err(TabwatchError::invalid_key("key column list is empty"));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = key_columns.iter().map(|k| k.as_ref()).find(|k| !seen.insert(*k)) {
        return Err(TabwatchError::invalid_key(format!(
            "key column '{}' is listed more than once",
            dup
        )));
    }

    let reference_keys = resolve_key_indices(reference, key_columns, "reference")?;
    let current_keys = resolve_key_indices(current, key_columns, "current")?;

    let (matched, removed, added) = align_rows(reference, &reference_keys, current, &current_keys);
    let columns = shared_value_columns(reference, current, key_columns);

    // Collect preserves order, so results line up with `matched`.
    let pair_changes: Vec<Vec<usize>> = matched
        .par_iter()
        .map(|&(ref_row, cur_row)| compare_pair(reference, current, &columns, ref_row, cur_row))
        .collect();

    let mut column_changes: Vec<Vec<CellChange>> = vec![Vec::new(); columns.len()];
    let mut modified_row_count = 0;
    for (&(ref_row, cur_row), changed) in matched.iter().zip(&pair_changes) {
        if changed.is_empty() {
            continue;
        }
        modified_row_count += 1;
        let key = key_values(reference, &reference_keys, ref_row);
        for &pos in changed {
            let (_, ref_idx, cur_idx) = columns[pos];
            column_changes[pos].push(CellChange {
                key: key.clone(),
                old_value: reference.columns()[ref_idx].values[ref_row].clone(),
                new_value: current.columns()[cur_idx].values[cur_row].clone(),
            });
        }
    }

    let per_column_changes: IndexMap<String, Vec<CellChange>> = columns
        .iter()
        .zip(column_changes)
        .filter(|(_, changes)| !changes.is_empty())
        .map(|((name, _, _), changes)| (name.to_string(), changes))
        .collect();

    let removed_rows: Vec<Vec<Value>> = removed.iter().filter_map(|&row| reference.row(row)).collect();
    let added_rows: Vec<Vec<Value>> = added.iter().filter_map(|&row| current.row(row)).collect();

    log::debug!(
        "Diff on [{}]: {} removed, {} added, {} modified, {} unchanged",
        key_columns.iter().map(|k| k.as_ref()).collect::<Vec<_>>().join(", "),
        removed_rows.len(),
        added_rows.len(),
        modified_row_count,
        matched.len() - modified_row_count
    );

    Ok(DiffResult {
        key_columns: key_columns.iter().map(|k| k.as_ref().to_string()).collect(),
        removed_row_count: removed_rows.len(),
        added_row_count: added_rows.len(),
        modified_row_count,
        unchanged_row_count: matched.len() - modified_row_count,
        reference_columns: reference.column_names().into_iter().map(str::to_string).collect(),
        removed_rows,
        current_columns: current.column_names().into_iter().map(str::to_string).collect(),
        added_rows,
        per_column_changes,
        columns_only_in_reference: names_not_in(reference, current),
        columns_only_in_current: names_not_in(current, reference),
    })
}
