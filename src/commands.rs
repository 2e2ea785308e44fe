//! Command implementations for tabwatch CLI

use crate::cli::{parse_column_list, Commands, OutputFormat};
use crate::config::StoreConfig;
use crate::data::DataProcessor;
use crate::diff::diff;
use crate::drift::{check_drift, record_snapshot};
use crate::error::{Result, TabwatchError};
use crate::hash::{fingerprint_of, fingerprint_of_columns};
use crate::output::{JsonFormatter, OutputManager, PrettyPrinter};
use crate::store::SnapshotStore;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Fingerprint { input, columns } => fingerprint_command(&input, columns.as_deref()),
        Commands::Diff {
            reference,
            current,
            key,
            format,
            output,
        } => diff_command(&reference, &current, &key, &format, output.as_deref()),
        Commands::Check {
            reference,
            current,
            key,
            label,
            max_entries,
            max_bytes,
            format,
        } => {
            let config = resolve_config(config_path, max_entries, max_bytes)?;
            check_command(
                &reference,
                &current,
                key.as_deref(),
                label.as_deref(),
                config,
                &format,
            )
        }
        Commands::Record {
            inputs,
            max_entries,
            max_bytes,
            format,
        } => {
            let config = resolve_config(config_path, max_entries, max_bytes)?;
            record_command(&inputs, config, &format)
        }
    }
}

/// Explicit config file, else the nearest discovered one, then command-line overrides
fn resolve_config(
    config_path: Option<&Path>,
    max_entries: Option<usize>,
    max_bytes: Option<u64>,
) -> Result<StoreConfig> {
    let base = match config_path {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::discover(&std::env::current_dir()?)?,
    };
    base.with_overrides(max_entries, max_bytes)
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(TabwatchError::invalid_input)
}

fn parse_keys(key: &str) -> Result<Vec<String>> {
    parse_column_list(key).map_err(TabwatchError::invalid_key)
}

/// Print the fingerprint of a table or of a column subset
fn fingerprint_command(input: &Path, columns: Option<&str>) -> Result<()> {
    let table = DataProcessor::load_table(input)?;

    let rendered = match columns {
        Some(columns) => {
            let columns = parse_column_list(columns).map_err(TabwatchError::invalid_input)?;
            let fingerprint = fingerprint_of_columns(&table, &columns)?;
            PrettyPrinter::render_fingerprint(fingerprint, Some(columns.as_slice()))
        }
        None => PrettyPrinter::render_fingerprint(fingerprint_of(&table), None),
    };

    OutputManager::emit(&rendered, None)
}

/// Diff two tables by key
fn diff_command(
    reference: &Path,
    current: &Path,
    key: &str,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let format = parse_format(format)?;
    let keys = parse_keys(key)?;

    let reference_table = DataProcessor::load_table(reference)?;
    let current_table = DataProcessor::load_table(current)?;

    let result = diff(&reference_table, &keys, &current_table)?;

    let rendered = match format {
        OutputFormat::Pretty => PrettyPrinter::render_diff(&result),
        OutputFormat::Json => JsonFormatter::to_json(&result)? + "\n",
    };
    OutputManager::emit(&rendered, output)
}

/// Record the reference table, then check each current table against it
fn check_command(
    reference: &Path,
    current: &[PathBuf],
    key: Option<&str>,
    label: Option<&str>,
    config: StoreConfig,
    format: &str,
) -> Result<()> {
    let format = parse_format(format)?;
    let keys = key.map(parse_keys).transpose()?.unwrap_or_default();
    let store = SnapshotStore::new(config)?;

    let reference_table = DataProcessor::load_table(reference)?.with_key_columns(keys.clone());
    let label = label
        .map(str::to_string)
        .unwrap_or_else(|| reference.display().to_string());
    let snapshot = record_snapshot(&reference_table, Some(&label), &store);

    let mut reports = Vec::new();
    for path in current {
        let current_table = DataProcessor::load_table(path)?
            .with_key_columns(keys.clone())
            .with_reference(Some(snapshot.fingerprint));
        let check = check_drift(&current_table, None, &store)?;

        match format {
            OutputFormat::Pretty => {
                let rendered = format!(
                    "📄 {}\n{}",
                    path.display(),
                    PrettyPrinter::render_drift_check(&check)
                );
                OutputManager::emit(&rendered, None)?;
            }
            OutputFormat::Json => reports.push(JsonFormatter::drift_check_value(&check)?),
        }
    }

    if format == OutputFormat::Json {
        OutputManager::emit(&(JsonFormatter::to_json(&reports)? + "\n"), None)?;
    }
    Ok(())
}

/// Record each input in order and list what the store keeps
fn record_command(inputs: &[PathBuf], config: StoreConfig, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let store = SnapshotStore::new(config)?;

    for path in inputs {
        let table = DataProcessor::load_table(path)?;
        record_snapshot(&table, Some(&path.display().to_string()), &store);
    }

    let rendered = match format {
        OutputFormat::Pretty => {
            PrettyPrinter::render_snapshot_list(&store.list()) + &PrettyPrinter::render_store_stats(&store.stats())
        }
        OutputFormat::Json => {
            JsonFormatter::to_json(&serde_json::json!({
                "snapshots": store.list(),
                "stats": store.stats(),
            }))? + "\n"
        }
    };
    OutputManager::emit(&rendered, None)
}
