//! Version history cache
//!
//! Edits are buffered as pending [`TextChange`]s and folded into a new immutable [`Snapshot`]
//! when a snapshot is requested, or eagerly once too many (or too large) edits pile up. The last
//! `capacity` snapshots are kept in a ring so that the change range between two recent versions
//! can be answered without diffing texts. Versions never repeat; a version that fell out of the
//! ring answers [`ChangeRange::Unavailable`].
//!
//! # Example
//!
//! ```rust
//! use doc_text::{ChangeRange, VersionCache, VersionCacheConfig};
//!
//! let mut cache = VersionCache::from_text("hello world", VersionCacheConfig::default());
//! cache.edit(5, 1, ", ").unwrap();
//!
//! let snapshot = cache.snapshot().unwrap();
//! assert_eq!(snapshot.version(), 1);
//! assert_eq!(snapshot.text(), "hello, world");
//! assert!(matches!(cache.text_changes_between_versions(0, 1), ChangeRange::Changed(_)));
//! ```

use crate::config::VersionCacheConfig;
use crate::delta::{ChangeRange, TextChangeRange, TextSpan, collapse_text_change_ranges};
use crate::edit::{TextChange, apply_edit};
use crate::error::{Result, TextError};
use crate::line_index::{LineIndex, LineOffset};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

/// One materialized version of a document.
///
/// Snapshots are immutable and may outlive their eviction from the cache.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    cache_id: u64,
    index: LineIndex,
    changes: Vec<TextChange>,
}

impl Snapshot {
    /// Version number of this snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The line index tree of this version.
    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    /// Edits that turned the previous version into this one (empty for version 0).
    pub fn changes_since_previous_version(&self) -> &[TextChange] {
        &self.changes
    }

    /// Length in chars.
    pub fn char_count(&self) -> usize {
        self.index.char_count()
    }

    /// Number of lines, counting the empty line after a trailing terminator.
    pub fn line_count(&self) -> usize {
        self.index.document_line_count()
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.index.text()
    }

    /// Text of `[start, end)`, clipped to the document.
    pub fn get_text(&self, start: usize, end: usize) -> String {
        self.index.get_text(start, end.saturating_sub(start))
    }

    /// Span of the zero-based `line`, terminator included; `None` past the last line.
    pub fn line_to_text_span(&self, line: usize) -> Option<TextSpan> {
        let leaf_lines = self.index.line_count();
        if line < leaf_lines {
            let start = self.index.line_to_position_and_text(line + 1);
            let length = start.text.map_or(0, |text| text.chars().count());
            Some(TextSpan::new(start.position, length))
        } else if line == leaf_lines && (self.index.is_empty() || self.index.ends_with_line_break())
        {
            Some(TextSpan::new(self.index.char_count(), 0))
        } else {
            None
        }
    }

    /// One-based line and zero-based column of `position`; `None` past the end.
    ///
    /// The end of a document that ends with a terminator is the start of the empty last line.
    pub fn position_to_line_offset(&self, position: usize) -> Option<LineOffset> {
        let char_count = self.index.char_count();
        if position > char_count {
            return None;
        }
        if position == char_count && (self.index.is_empty() || self.index.ends_with_line_break()) {
            return Some(LineOffset {
                line: self.index.line_count() + 1,
                column: 0,
            });
        }
        Some(self.index.position_to_line_offset(position))
    }

    /// Absolute position of the one-based `line` and zero-based `column`.
    ///
    /// The column may point just past the line's last char; `None` for anything further.
    pub fn line_offset_to_position(&self, line: usize, column: usize) -> Option<usize> {
        let span = self.line_to_text_span(line.checked_sub(1)?)?;
        (column <= span.length).then(|| span.start + column)
    }
}

/// Bounded history of snapshots plus the edits not yet materialized.
#[derive(Debug)]
pub struct VersionCache {
    id: u64,
    config: VersionCacheConfig,
    versions: Vec<Option<Arc<Snapshot>>>,
    current: Arc<Snapshot>,
    min_version: u64,
    changes: Vec<TextChange>,
    pending_char_count: usize,
}

impl VersionCache {
    /// Create a cache whose version 0 holds `text`.
    pub fn from_text(text: &str, config: VersionCacheConfig) -> Self {
        let id = NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed);
        let index = LineIndex::from_text(text);
        let pending_char_count = index.char_count();
        let root = Arc::new(Snapshot {
            version: 0,
            cache_id: id,
            index,
            changes: Vec::new(),
        });

        let mut versions = vec![None; config.effective_capacity()];
        versions[0] = Some(Arc::clone(&root));

        Self {
            id,
            config,
            versions,
            current: root,
            min_version: 0,
            changes: Vec::new(),
            pending_char_count,
        }
    }

    /// The configuration this cache was created with.
    pub fn config(&self) -> &VersionCacheConfig {
        &self.config
    }

    /// Number of snapshots the ring retains.
    pub fn capacity(&self) -> usize {
        self.versions.len()
    }

    /// Version of the latest materialized snapshot. Does not fold pending edits.
    pub fn current_version(&self) -> u64 {
        self.current.version
    }

    /// Oldest version still retained.
    pub fn min_version(&self) -> u64 {
        self.min_version
    }

    /// Edits buffered since the latest snapshot.
    pub fn pending_changes(&self) -> &[TextChange] {
        &self.changes
    }

    /// Length the document will have once pending edits are materialized.
    pub fn pending_char_count(&self) -> usize {
        self.pending_char_count
    }

    /// Buffer a replacement of `delete_len` chars at `pos`.
    ///
    /// The edit is checked against the text as it will be after the pending edits. The pending
    /// edits are materialized right away when there are more than
    /// [`VersionCacheConfig::change_count_threshold`] of them, or when this edit deletes or
    /// inserts more than [`VersionCacheConfig::change_length_threshold`] chars.
    pub fn edit(&mut self, pos: usize, delete_len: usize, inserted_text: impl Into<String>) -> Result<()> {
        let char_count = self.pending_char_count;
        if pos > char_count || delete_len > char_count - pos {
            return Err(TextError::InvalidEdit {
                pos,
                delete_len,
                char_count,
            });
        }

        let change = TextChange::new(pos, delete_len, inserted_text);
        let inserted_len = change.inserted_len();
        self.pending_char_count = char_count - delete_len + inserted_len;
        tracing::trace!(pos, delete_len, inserted_len, pending = self.changes.len() + 1, "buffered edit");
        self.changes.push(change);

        let threshold = self.config.change_length_threshold;
        if self.changes.len() > self.config.change_count_threshold
            || delete_len > threshold
            || inserted_len > threshold
        {
            self.snapshot()?;
        }
        Ok(())
    }

    /// The latest materialized snapshot, ignoring pending edits.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// Materialize pending edits (if any) and return the current snapshot.
    ///
    /// Without pending edits this returns the existing snapshot and the version stays put.
    ///
    /// If an edit fails to apply, the edits before it are still committed as a new snapshot, the
    /// failing edit and everything after it are discarded, and the error is returned. The cache
    /// stays usable either way.
    pub fn snapshot(&mut self) -> Result<Arc<Snapshot>> {
        if self.changes.is_empty() {
            return Ok(self.current_snapshot());
        }

        let mut changes = std::mem::take(&mut self.changes);
        let mut index = self.current.index.clone();
        let mut failure = None;
        for (applied, change) in changes.iter().enumerate() {
            match apply_edit(&index, change, self.config.check_edits) {
                Ok(next) => index = next,
                Err(err) => {
                    failure = Some((applied, err));
                    break;
                }
            }
        }

        let Some((applied, err)) = failure else {
            return Ok(self.commit(index, changes));
        };
        let dropped = changes.len() - applied;
        changes.truncate(applied);
        if !changes.is_empty() {
            self.commit(index, changes);
        }
        self.pending_char_count = self.current.char_count();
        tracing::error!(
            applied,
            dropped,
            version = self.current.version,
            error = %err,
            "materialization failed, discarding edits"
        );
        Err(err)
    }

    fn commit(&mut self, index: LineIndex, changes: Vec<TextChange>) -> Arc<Snapshot> {
        let version = self.current.version + 1;
        let snapshot = Arc::new(Snapshot {
            version,
            cache_id: self.id,
            index,
            changes,
        });
        let slot = self.slot(version);
        self.versions[slot] = Some(Arc::clone(&snapshot));
        self.current = Arc::clone(&snapshot);

        let capacity = self.versions.len() as u64;
        if version - self.min_version >= capacity {
            self.min_version = version - capacity + 1;
        }
        tracing::debug!(
            version,
            edits = snapshot.changes.len(),
            min_version = self.min_version,
            "materialized snapshot"
        );
        snapshot
    }

    /// A retained snapshot by version, if it is still in the ring.
    pub fn snapshot_at(&self, version: u64) -> Option<Arc<Snapshot>> {
        if version < self.min_version || version > self.current.version {
            return None;
        }
        self.versions[self.slot(version)]
            .as_ref()
            .filter(|snapshot| snapshot.version == version)
            .cloned()
    }

    fn slot(&self, version: u64) -> usize {
        (version % self.versions.len() as u64) as usize
    }

    /// Collapsed change range between two materialized versions.
    ///
    /// `old == new` is [`ChangeRange::Unchanged`], and so is `old > new` (callers ask in
    /// increasing order). A version outside the retained window gives
    /// [`ChangeRange::Unavailable`].
    pub fn text_changes_between_versions(&self, old_version: u64, new_version: u64) -> ChangeRange {
        if old_version == new_version {
            return ChangeRange::Unchanged;
        }
        if old_version > new_version {
            tracing::warn!(old_version, new_version, "change range requested backwards");
            return ChangeRange::Unchanged;
        }
        if old_version < self.min_version || new_version > self.current.version {
            return ChangeRange::Unavailable;
        }

        let mut ranges: Vec<TextChangeRange> = Vec::new();
        for version in old_version + 1..=new_version {
            let Some(snapshot) = self.snapshot_at(version) else {
                return ChangeRange::Unavailable;
            };
            ranges.extend(snapshot.changes.iter().map(TextChange::text_change_range));
        }
        ChangeRange::Changed(collapse_text_change_ranges(&ranges))
    }

    /// Change range from `old` to `new`; both must come from this cache.
    pub fn change_range_between(&self, old: &Snapshot, new: &Snapshot) -> ChangeRange {
        if old.cache_id != self.id || new.cache_id != self.id {
            return ChangeRange::Unavailable;
        }
        if new.version <= old.version {
            return ChangeRange::Unchanged;
        }
        self.text_changes_between_versions(old.version, new.version)
    }

    /// Returns `true` if `snapshot` was produced by this cache.
    pub fn owns(&self, snapshot: &Snapshot) -> bool {
        snapshot.cache_id == self.id
    }

    /// Full text of the current version.
    pub fn text(&mut self) -> Result<String> {
        Ok(self.snapshot()?.text())
    }

    /// Number of lines of the current version.
    pub fn line_count(&mut self) -> Result<usize> {
        Ok(self.snapshot()?.line_count())
    }

    /// Span of the zero-based `line` in the current version.
    pub fn line_to_text_span(&mut self, line: usize) -> Result<TextSpan> {
        let snapshot = self.snapshot()?;
        snapshot
            .line_to_text_span(line)
            .ok_or_else(|| TextError::InvalidLine {
                line,
                offset: 0,
                line_count: snapshot.line_count(),
            })
    }

    /// Position of the one-based `line` and zero-based `column` in the current version.
    pub fn line_offset_to_position(&mut self, line: usize, column: usize) -> Result<usize> {
        let snapshot = self.snapshot()?;
        snapshot
            .line_offset_to_position(line, column)
            .ok_or_else(|| TextError::InvalidLine {
                line,
                offset: column,
                line_count: snapshot.line_count(),
            })
    }

    /// One-based line and zero-based column of `position` in the current version.
    pub fn position_to_line_offset(&mut self, position: usize) -> Result<LineOffset> {
        let snapshot = self.snapshot()?;
        snapshot
            .position_to_line_offset(position)
            .ok_or_else(|| TextError::InvalidPosition {
                position,
                char_count: snapshot.char_count(),
            })
    }
}
