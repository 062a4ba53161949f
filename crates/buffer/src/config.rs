//! Spool configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a disk-backed spool buffer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpoolConfig {
    /// Directory holding the backing store
    pub directory: PathBuf,

    /// Whether every write is fsynced before it is acknowledged
    pub sync_writes: bool,

    /// Interval between value-log garbage collection passes, in milliseconds
    pub gc_interval_ms: u64,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        // Use tempfile to create a proper temporary directory
        // Using .keep() to persist the directory (won't be auto-deleted)
        let directory = tempfile::tempdir()
            .expect("Failed to create temporary directory")
            .keep();

        Self {
            directory,
            sync_writes: true,
            gc_interval_ms: 1000,
        }
    }
}

impl SpoolConfig {
    /// Create a config for the given directory with default settings
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            sync_writes: true,
            gc_interval_ms: 1000,
        }
    }

    /// Set whether writes are fsynced
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Set the garbage collection interval
    pub fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval_ms = interval.as_millis() as u64;
        self
    }

    pub(crate) fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.gc_interval_ms)
    }
}
