//! Snapshot store configuration

use crate::error::{Result, TabwatchError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up by [`StoreConfig::discover`]
pub const CONFIG_FILE_NAME: &str = ".tabwatch.json";

/// Bounds for the in-memory snapshot store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of snapshots kept at once
    pub max_entries: usize,
    /// Maximum aggregate payload size in bytes
    pub max_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: crate::DEFAULT_MAX_ENTRIES,
            max_bytes: crate::DEFAULT_MAX_BYTES,
        }
    }
}

impl StoreConfig {
    /// Create a validated configuration
    pub fn new(max_entries: usize, max_bytes: u64) -> Result<Self> {
        let config = Self {
            max_entries,
            max_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(TabwatchError::config("max_entries must be greater than 0"));
        }
        if self.max_bytes == 0 {
            return Err(TabwatchError::config("max_bytes must be greater than 0"));
        }
        Ok(())
    }

    /// Apply command-line overrides on top of this configuration
    pub fn with_overrides(self, max_entries: Option<usize>, max_bytes: Option<u64>) -> Result<Self> {
        let config = Self {
            max_entries: max_entries.unwrap_or(self.max_entries),
            max_bytes: max_bytes.unwrap_or(self.max_bytes),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            TabwatchError::config(format!("Invalid config file '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        log::debug!("Loaded store config from {}", path.display());
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Find the nearest config file walking up from `start_dir`, or fall back to defaults
    pub fn discover(start_dir: &Path) -> Result<Self> {
        match Self::find_config_file(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Walk up the directory tree looking for a config file.
    /// Stops at a `.git` directory (project root) or the filesystem root.
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }

            if current.join(".git").exists() {
                return None;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }
}
