//! Command-line interface for tabwatch

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabwatch")]
#[command(about = "Snapshot tabular data and report what changed")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store config file (defaults to the nearest .tabwatch.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the content fingerprint of a table
    Fingerprint {
        /// Input JSON file
        input: PathBuf,

        /// Comma-separated subset of columns to fingerprint
        #[arg(long)]
        columns: Option<String>,
    },

    /// Compare two tables by key
    Diff {
        /// Reference table
        reference: PathBuf,

        /// Current table
        current: PathBuf,

        /// Comma-separated key columns
        #[arg(long)]
        key: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Record a reference table, then check later versions against it
    Check {
        /// Reference table
        reference: PathBuf,

        /// Current table(s) to check
        #[arg(required = true)]
        current: Vec<PathBuf>,

        /// Comma-separated key columns carried by every table
        #[arg(long)]
        key: Option<String>,

        /// Label for the reference snapshot
        #[arg(long)]
        label: Option<String>,

        /// Maximum number of snapshots kept (must be > 0)
        #[arg(long, value_parser = validate_limit::<usize>)]
        max_entries: Option<usize>,

        /// Maximum total snapshot size in bytes (must be > 0)
        #[arg(long, value_parser = validate_limit::<u64>)]
        max_bytes: Option<u64>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Record tables in order and list the snapshots that survive eviction
    Record {
        /// Input tables, recorded in the order given
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Maximum number of snapshots kept (must be > 0)
        #[arg(long, value_parser = validate_limit::<usize>)]
        max_entries: Option<usize>,

        /// Maximum total snapshot size in bytes (must be > 0)
        #[arg(long, value_parser = validate_limit::<u64>)]
        max_bytes: Option<u64>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Split a comma-separated column list, rejecting empty names
pub fn parse_column_list(s: &str) -> Result<Vec<String>, String> {
    let columns: Vec<String> = s.split(',').map(|c| c.trim().to_string()).collect();
    if columns.iter().any(|c| c.is_empty()) {
        return Err(format!("Invalid column list: '{}'", s));
    }
    Ok(columns)
}

/// Validate that a store limit is greater than 0
fn validate_limit<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value: T = s
        .parse()
        .map_err(|_| format!("Invalid limit: '{}'. Must be a positive integer.", s))?;

    if value == T::default() {
        return Err("Limit must be greater than 0".to_string());
    }

    Ok(value)
}
