//! # tabwatch
//!
//! Opt-in change tracking for tabular data. A table is fingerprinted and
//! recorded into a bounded, in-memory [`SnapshotStore`]; later versions are
//! checked against that snapshot with [`check_drift`], which reports whether
//! anything changed and, when both versions carry the same key columns, which
//! rows and cells changed.

pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod diff;
pub mod drift;
pub mod error;
pub mod hash;
pub mod output;
pub mod store;
pub mod table;

pub use config::StoreConfig;
pub use diff::{diff, CellChange, DiffResult};
pub use drift::{check_drift, record_snapshot, DriftCheck, DriftReport, StructuralSummary};
pub use error::{Result, TabwatchError};
pub use hash::{fingerprint_of, fingerprint_of_columns, Fingerprint};
pub use store::{Snapshot, SnapshotStore, SnapshotSummary, StoreStats};
pub use table::{Column, DataType, Table, TableMeta, Value};

/// Default maximum number of snapshots held by a store
pub const DEFAULT_MAX_ENTRIES: usize = 20;

/// Default maximum aggregate snapshot size in bytes
pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;
