//! Configuration for the version cache and the document storage.
//!
//! Both structs implement [`Default`] with the standard thresholds and deserialize with
//! `#[serde(default)]`, so a host can embed them in its own configuration file and only spell out
//! the fields it wants to change.

use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`VersionCache`](crate::VersionCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionCacheConfig {
    /// Number of snapshots kept in the history ring.
    pub capacity: usize,
    /// Pending edits are materialized once more than this many are buffered.
    pub change_count_threshold: usize,
    /// Pending edits are materialized as soon as one edit deletes or inserts more chars than this.
    pub change_length_threshold: usize,
    /// Verify every tree edit against a plain string splice. O(n) per edit; meant for tests.
    pub check_edits: bool,
}

impl VersionCacheConfig {
    /// Default number of retained snapshots.
    pub const DEFAULT_CAPACITY: usize = 8;
    /// Default pending edit count before materialization.
    pub const DEFAULT_CHANGE_COUNT_THRESHOLD: usize = 8;
    /// Default size (in chars) of an edit that forces materialization.
    pub const DEFAULT_CHANGE_LENGTH_THRESHOLD: usize = 256;

    /// Enable or disable edit checking.
    pub fn with_check_edits(mut self, check_edits: bool) -> Self {
        self.check_edits = check_edits;
        self
    }

    /// Set the history ring capacity. A capacity of zero is bumped to one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub(crate) fn effective_capacity(&self) -> usize {
        self.capacity.max(1)
    }
}

impl Default for VersionCacheConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            change_count_threshold: Self::DEFAULT_CHANGE_COUNT_THRESHOLD,
            change_length_threshold: Self::DEFAULT_CHANGE_LENGTH_THRESHOLD,
            check_edits: false,
        }
    }
}

/// Configuration for a [`TextStorage`](crate::TextStorage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Settings for the version cache created when the document is opened for editing.
    pub cache: VersionCacheConfig,
    /// Files larger than this (as reported by the host) are not loaded; the document stays empty.
    pub max_file_size: Option<u64>,
}
