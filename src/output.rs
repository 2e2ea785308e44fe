//! Output formatting utilities

use crate::diff::DiffResult;
use crate::drift::{DriftCheck, DriftReport, StructuralSummary};
use crate::error::Result;
use crate::hash::Fingerprint;
use crate::store::{SnapshotSummary, StoreStats};
use crate::table::Value;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Maximum cell changes shown per column in pretty output
const MAX_CHANGES_PER_COLUMN: usize = 10;

/// Maximum added/removed rows shown in pretty output
const MAX_ROWS_SHOWN: usize = 10;

/// Pretty printer for tabwatch output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Render the outcome of a drift check
    pub fn render_drift_check(check: &DriftCheck) -> String {
        match check {
            DriftCheck::Report(report) => Self::render_drift_report(report),
            other => format!("⚠️  {}\n", other.reason().unwrap_or_default()),
        }
    }

    /// Render a drift report
    pub fn render_drift_report(report: &DriftReport) -> String {
        let mut out = String::new();
        let label = report
            .reference_label
            .as_deref()
            .map(|l| format!(" ({})", l))
            .unwrap_or_default();

        let _ = writeln!(out, "🔍 Drift check against {}{}", report.reference_fingerprint, label);
        let _ = writeln!(out, "├─ Recorded: {}", report.reference_created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "├─ Current: {}", report.current_fingerprint);

        if report.has_drift {
            let _ = writeln!(out, "├─ ❌ Content: CHANGED");
        } else {
            let _ = writeln!(out, "├─ ✅ Content: unchanged");
        }

        if report.key_lost {
            let _ = writeln!(out, "├─ ⚠️  Key: present on one side only");
        }
        if report.key_values_changed {
            let _ = writeln!(out, "├─ ⚠️  Key values: CHANGED");
        }

        if let Some(diff) = &report.diff {
            let _ = writeln!(out, "└─ Row changes:");
            Self::write_diff_body(&mut out, diff, "   ");
        } else if let Some(summary) = &report.structural_summary {
            let _ = writeln!(out, "└─ Structure:");
            Self::write_structural_summary(&mut out, summary, "   ");
        }

        out
    }

    /// Render a standalone diff result
    pub fn render_diff(diff: &DiffResult) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "🔍 Diff on key [{}]", diff.key_columns.join(", "));
        Self::write_diff_body(&mut out, diff, "");
        out
    }

    fn write_diff_body(out: &mut String, diff: &DiffResult, indent: &str) {
        let _ = writeln!(out, "{}├─ Removed: {}", indent, diff.removed_row_count);
        let _ = writeln!(out, "{}├─ Added: {}", indent, diff.added_row_count);
        let _ = writeln!(out, "{}├─ Modified: {}", indent, diff.modified_row_count);

        let has_details = !diff.columns_only_in_reference.is_empty()
            || !diff.columns_only_in_current.is_empty()
            || !diff.per_column_changes.is_empty()
            || !diff.removed_rows.is_empty()
            || !diff.added_rows.is_empty();
        let last = if has_details { "├─" } else { "└─" };
        let _ = writeln!(out, "{}{} Unchanged: {}", indent, last, diff.unchanged_row_count);

        let mut sections: Vec<String> = Vec::new();
        if !diff.columns_only_in_reference.is_empty() {
            sections.push(format!("Columns dropped: {}", diff.columns_only_in_reference.join(", ")));
        }
        if !diff.columns_only_in_current.is_empty() {
            sections.push(format!("Columns added: {}", diff.columns_only_in_current.join(", ")));
        }
        for (column, changes) in &diff.per_column_changes {
            let mut section = format!("Column '{}': {} changed", column, changes.len());
            for change in changes.iter().take(MAX_CHANGES_PER_COLUMN) {
                let _ = write!(
                    section,
                    "\n   {} : {} → {}",
                    format_tuple(&change.key),
                    change.old_value,
                    change.new_value
                );
            }
            if changes.len() > MAX_CHANGES_PER_COLUMN {
                let _ = write!(section, "\n   … {} more", changes.len() - MAX_CHANGES_PER_COLUMN);
            }
            sections.push(section);
        }
        if !diff.removed_rows.is_empty() {
            sections.push(format_rows("Removed rows", &diff.reference_columns, &diff.removed_rows));
        }
        if !diff.added_rows.is_empty() {
            sections.push(format_rows("Added rows", &diff.current_columns, &diff.added_rows));
        }

        let count = sections.len();
        for (i, section) in sections.into_iter().enumerate() {
            let (prefix, continuation) = if i + 1 == count { ("└─", "  ") } else { ("├─", "│ ") };
            let mut lines = section.lines();
            if let Some(first) = lines.next() {
                let _ = writeln!(out, "{}{} {}", indent, prefix, first);
            }
            for line in lines {
                let _ = writeln!(out, "{}{}{}", indent, continuation, line);
            }
        }
    }

    fn write_structural_summary(out: &mut String, summary: &StructuralSummary, indent: &str) {
        let _ = writeln!(
            out,
            "{}├─ Rows: {} → {} ({:+})",
            indent, summary.rows_before, summary.rows_after, summary.row_delta
        );
        let added = if summary.columns_added.is_empty() {
            "none".to_string()
        } else {
            summary.columns_added.join(", ")
        };
        let removed = if summary.columns_removed.is_empty() {
            "none".to_string()
        } else {
            summary.columns_removed.join(", ")
        };
        let _ = writeln!(out, "{}├─ Columns added: {}", indent, added);
        let _ = writeln!(out, "{}└─ Columns removed: {}", indent, removed);
    }

    /// Render snapshot list
    pub fn render_snapshot_list(snapshots: &[SnapshotSummary]) -> String {
        if snapshots.is_empty() {
            return "No snapshots recorded.\n".to_string();
        }

        let mut out = String::new();
        let _ = writeln!(out, "📸 Snapshots:");
        for (i, snapshot) in snapshots.iter().enumerate() {
            let prefix = if i == snapshots.len() - 1 { "└─" } else { "├─" };
            let _ = writeln!(
                out,
                "{} {} {} [{} rows × {} cols, {}] {}",
                prefix,
                snapshot.fingerprint,
                snapshot.label.as_deref().unwrap_or("-"),
                snapshot.row_count,
                snapshot.col_count,
                format_bytes(snapshot.payload_size),
                snapshot.created_at.format("%H:%M:%S%.3f")
            );
        }
        out
    }

    /// Render store occupancy
    pub fn render_store_stats(stats: &StoreStats) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📊 Snapshot store");
        let _ = writeln!(out, "├─ Entries: {} / {}", stats.entry_count, stats.max_entries);
        let _ = writeln!(
            out,
            "├─ Size: {} / {}",
            format_bytes(stats.total_bytes),
            format_bytes(stats.max_bytes)
        );
        let _ = writeln!(out, "└─ Evictions: {}", stats.evictions);
        out
    }

    pub fn render_fingerprint(fingerprint: Fingerprint, columns: Option<&[String]>) -> String {
        match columns {
            Some(columns) => format!("{} [{}]\n", fingerprint, columns.join(", ")),
            None => format!("{}\n", fingerprint),
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    /// Drift check as a JSON value; cache misses become `{"status": ..., "reason": ...}`
    pub fn drift_check_value(check: &DriftCheck) -> Result<serde_json::Value> {
        let value = match check {
            DriftCheck::Report(report) => serde_json::to_value(report)?,
            DriftCheck::NoReference => serde_json::json!({
                "status": "no_reference",
                "reason": check.reason(),
            }),
            DriftCheck::SnapshotNotFound { fingerprint } => serde_json::json!({
                "status": "snapshot_not_found",
                "fingerprint": fingerprint,
                "reason": check.reason(),
            }),
        };
        Ok(value)
    }

    pub fn drift_check(check: &DriftCheck) -> Result<String> {
        Self::to_json(&Self::drift_check_value(check)?)
    }
}

/// Writes rendered output to stdout or a file
pub struct OutputManager;

impl OutputManager {
    pub fn emit(content: &str, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                std::fs::write(path, content)?;
                log::info!("Wrote output to {}", path.display());
            }
            None => print!("{}", content),
        }
        Ok(())
    }
}

fn format_tuple(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("({})", parts.join(", "))
}

fn format_rows(title: &str, columns: &[String], rows: &[Vec<Value>]) -> String {
    let mut section = format!("{}: {} [{}]", title, rows.len(), columns.join(", "));
    for row in rows.iter().take(MAX_ROWS_SHOWN) {
        let _ = write!(section, "\n   {}", format_tuple(row));
    }
    if rows.len() > MAX_ROWS_SHOWN {
        let _ = write!(section, "\n   … {} more", rows.len() - MAX_ROWS_SHOWN);
    }
    section
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
