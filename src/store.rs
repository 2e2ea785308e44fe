//! Bounded, content-addressed in-memory snapshot store

use crate::config::StoreConfig;
use crate::error::Result;
use crate::hash::Fingerprint;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A captured table. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub fingerprint: Fingerprint,
    pub created_at: DateTime<Utc>,
    /// Creation order within the owning store
    pub sequence: u64,
    pub label: Option<String>,
    pub payload: Arc<Table>,
    /// Payload size measured once at capture time
    pub payload_size: u64,
}

/// Diagnostic view of a snapshot without its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub fingerprint: Fingerprint,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
    pub col_count: usize,
    pub payload_size: u64,
}

/// Store occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub max_entries: usize,
    pub max_bytes: u64,
    pub evictions: u64,
}

impl Snapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            fingerprint: self.fingerprint,
            label: self.label.clone(),
            created_at: self.created_at,
            row_count: self.payload.row_count(),
            col_count: self.payload.column_count(),
            payload_size: self.payload_size,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<Fingerprint, Arc<Snapshot>>,
    total_bytes: u64,
    next_sequence: u64,
    last_created_at: Option<DateTime<Utc>>,
    evictions: u64,
}

impl StoreState {
    /// Remove the entry created first. Returns `None` once the store is empty.
    fn evict_oldest(&mut self) -> Option<Arc<Snapshot>> {
        let oldest = self
            .entries
            .values()
            .min_by_key(|s| (s.created_at, s.sequence))
            .map(|s| s.fingerprint)?;

        let removed = self.entries.remove(&oldest)?;
        self.total_bytes = self.total_bytes.saturating_sub(removed.payload_size);
        self.evictions += 1;
        Some(removed)
    }

    /// Wall-clock now, never earlier than the previous entry's timestamp
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match self.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created_at = Some(created_at);
        created_at
    }
}

/// In-memory map from fingerprint to snapshot, bounded by entry count and
/// aggregate payload size.
///
/// Eviction removes the oldest entry by creation time. Lookups never refresh
/// an entry's position, so the policy is first-in first-out.
///
/// All operations take a single lock, so the bounds hold for every observer.
#[derive(Debug)]
pub struct SnapshotStore {
    config: StoreConfig,
    state: Mutex<StoreState>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self {
            config: StoreConfig::default(),
            state: Mutex::new(StoreState::default()),
        }
    }
}

impl SnapshotStore {
    /// Create a store with the given bounds
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(StoreState::default()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // Mutations only happen after all fallible work, so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `table` under `fingerprint`.
    ///
    /// Re-recording an existing fingerprint returns the stored entry untouched.
    /// Otherwise older entries are evicted until the new one fits both bounds,
    /// and the new entry is inserted even if it alone exceeds `max_bytes`.
    pub fn record(&self, fingerprint: Fingerprint, table: &Table, label: Option<&str>) -> Arc<Snapshot> {
        let mut state = self.lock();

        if let Some(existing) = state.entries.get(&fingerprint) {
            log::debug!("Snapshot {} already recorded, reusing it", fingerprint);
            return Arc::clone(existing);
        }

        let payload_size = table.estimated_size_bytes();

        while state.entries.len() >= self.config.max_entries
            || (!state.entries.is_empty()
                && state.total_bytes.saturating_add(payload_size) > self.config.max_bytes)
        {
            match state.evict_oldest() {
                Some(evicted) => log::debug!(
                    "Evicted snapshot {} ({} bytes) to make room for {}",
                    evicted.fingerprint,
                    evicted.payload_size,
                    fingerprint
                ),
                None => break,
            }
        }

        if payload_size > self.config.max_bytes {
            log::warn!(
                "Snapshot {} is {} bytes, larger than the {} byte store limit",
                fingerprint,
                payload_size,
                self.config.max_bytes
            );
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let snapshot = Arc::new(Snapshot {
            fingerprint,
            created_at: state.next_created_at(),
            sequence,
            label: label.map(str::to_string),
            payload: Arc::new(table.clone()),
            payload_size,
        });

        state.total_bytes += payload_size;
        state.entries.insert(fingerprint, Arc::clone(&snapshot));

        log::info!(
            "Recorded snapshot {} ({} rows, {} bytes)",
            fingerprint,
            table.row_count(),
            payload_size
        );

        snapshot
    }

    /// Look up a snapshot. Does not affect eviction order.
    pub fn get(&self, fingerprint: Fingerprint) -> Option<Arc<Snapshot>> {
        self.lock().entries.get(&fingerprint).cloned()
    }

    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.lock().entries.contains_key(&fingerprint)
    }

    /// Remove a snapshot if present
    pub fn remove(&self, fingerprint: Fingerprint) -> Option<Arc<Snapshot>> {
        let mut state = self.lock();
        let removed = state.entries.remove(&fingerprint)?;
        state.total_bytes = state.total_bytes.saturating_sub(removed.payload_size);
        log::debug!("Removed snapshot {}", fingerprint);
        Some(removed)
    }

    /// Remove every snapshot, returning how many were removed
    pub fn clear_all(&self) -> usize {
        let mut state = self.lock();
        let count = state.entries.len();
        state.entries.clear();
        state.total_bytes = 0;
        log::info!("Cleared {} snapshots", count);
        count
    }

    /// Summaries of all snapshots, oldest first
    pub fn list(&self) -> Vec<SnapshotSummary> {
        let state = self.lock();
        let mut snapshots: Vec<&Arc<Snapshot>> = state.entries.values().collect();
        snapshots.sort_by_key(|s| (s.created_at, s.sequence));
        snapshots.into_iter().map(|s| s.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Sum of payload sizes currently held
    pub fn total_bytes(&self) -> u64 {
        self.lock().total_bytes
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.lock();
        StoreStats {
            entry_count: state.entries.len(),
            total_bytes: state.total_bytes,
            max_entries: self.config.max_entries,
            max_bytes: self.config.max_bytes,
            evictions: state.evictions,
        }
    }
}
