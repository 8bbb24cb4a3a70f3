//! Document text storage
//!
//! [`TextStorage`] holds the text of one document and decides how to represent it:
//!
//! - **Plain**: a flat string plus a lazily built line-start table. Used for documents that are
//!   only read (closed files loaded from disk).
//! - **Versioned**: a [`VersionCache`]. Used as soon as the document is opened for editing or
//!   receives its first edit.
//!
//! Closing a document whose text did not come from disk schedules a reload; the reload is
//! performed by the next query and drops the version cache if the disk text differs.
//!
//! Every query takes `&mut self`: it may load a pending reload, build the line-start table, or
//! materialize buffered edits.

use crate::config::StorageConfig;
use crate::delta::{ChangeRange, TextSpan};
use crate::error::{Result, TextError};
use crate::host::TextHost;
use crate::line_break::{LineStarts, char_to_byte};
use crate::line_index::LineOffset;
use crate::version_cache::{Snapshot, VersionCache};
use once_cell::unsync::OnceCell;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Opaque, ordered version token of a [`TextStorage`].
///
/// Tokens are only comparable within one storage's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentVersion {
    /// Bumped on every representation switch and every real text replacement.
    pub generation: u64,
    /// Version cache version; always 0 in plain mode.
    pub snapshot: u64,
}

/// A read-only view of the text at one [`DocumentVersion`].
#[derive(Debug, Clone)]
pub enum TextSnapshot {
    /// Flat text of a plain document.
    Plain {
        /// Version of the storage when the snapshot was taken.
        version: DocumentVersion,
        /// The text.
        text: Arc<str>,
    },
    /// Snapshot of a version cache.
    Versioned {
        /// Generation of the storage when the snapshot was taken.
        generation: u64,
        /// The cache snapshot.
        snapshot: Arc<Snapshot>,
    },
}

impl TextSnapshot {
    /// Version token of this snapshot.
    pub fn version(&self) -> DocumentVersion {
        match self {
            TextSnapshot::Plain { version, .. } => *version,
            TextSnapshot::Versioned { generation, snapshot } => DocumentVersion {
                generation: *generation,
                snapshot: snapshot.version(),
            },
        }
    }

    /// Length in chars.
    pub fn char_count(&self) -> usize {
        match self {
            TextSnapshot::Plain { text, .. } => text.chars().count(),
            TextSnapshot::Versioned { snapshot, .. } => snapshot.char_count(),
        }
    }

    /// Full text.
    pub fn text(&self) -> String {
        match self {
            TextSnapshot::Plain { text, .. } => text.to_string(),
            TextSnapshot::Versioned { snapshot, .. } => snapshot.text(),
        }
    }

    /// Text of `[start, end)`, clipped to the snapshot.
    pub fn get_text(&self, start: usize, end: usize) -> String {
        match self {
            TextSnapshot::Plain { text, .. } => {
                let from = char_to_byte(text, start);
                let to = char_to_byte(text, end.max(start));
                text[from..to].to_string()
            }
            TextSnapshot::Versioned { snapshot, .. } => snapshot.get_text(start, end),
        }
    }
}

struct FileSource {
    path: PathBuf,
    host: Arc<dyn TextHost>,
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource").field("path", &self.path).finish_non_exhaustive()
    }
}

impl FileSource {
    /// Read the file, returning its text and size. Oversized files yield empty text; a missing
    /// file is empty.
    fn load(&self, max_file_size: Option<u64>) -> io::Result<(String, u64)> {
        if let Some(max) = max_file_size
            && let Some(size) = self.host.file_size(&self.path)
            && size > max
        {
            tracing::info!(path = %self.path.display(), size, max, "file too large, not loading content");
            return Ok((String::new(), size));
        }

        let text = match self.host.read_file(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err),
        };
        let size = text.len() as u64;
        if let Some(max) = max_file_size
            && size > max
        {
            tracing::info!(path = %self.path.display(), size, max, "file too large, not loading content");
            return Ok((String::new(), size));
        }
        Ok((text, size))
    }
}

#[derive(Debug)]
enum Representation {
    Plain {
        text: Arc<str>,
        line_starts: OnceCell<LineStarts>,
    },
    Versioned(VersionCache),
}

impl Representation {
    fn plain(text: String) -> Self {
        Representation::Plain {
            text: text.into(),
            line_starts: OnceCell::new(),
        }
    }
}

fn line_starts<'a>(text: &str, cell: &'a OnceCell<LineStarts>) -> &'a LineStarts {
    cell.get_or_init(|| LineStarts::new(text))
}

/// Text of one document, switching between a flat string and a version cache.
#[derive(Debug)]
pub struct TextStorage {
    config: StorageConfig,
    source: Option<FileSource>,
    repr: Representation,
    generation: u64,
    is_open: bool,
    owns_file_text: bool,
    pending_reload_from_disk: bool,
    file_size: Option<u64>,
    modified_time: Option<SystemTime>,
}

impl TextStorage {
    /// Storage for in-memory text with no backing file.
    pub fn from_text(text: impl Into<String>, config: StorageConfig) -> Self {
        Self {
            config,
            source: None,
            repr: Representation::plain(text.into()),
            generation: 0,
            is_open: false,
            owns_file_text: false,
            pending_reload_from_disk: false,
            file_size: None,
            modified_time: None,
        }
    }

    /// Storage backed by `path`. Nothing is read until the text is first needed.
    pub fn from_file(path: impl Into<PathBuf>, host: Arc<dyn TextHost>, config: StorageConfig) -> Self {
        Self {
            source: Some(FileSource {
                path: path.into(),
                host,
            }),
            pending_reload_from_disk: true,
            ..Self::from_text(String::new(), config)
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.source.as_ref().map(|source| source.path.as_path())
    }

    /// The configuration this storage was created with.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns `true` while the document is open for editing.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Returns `true` if the current text is exactly what was last read from the backing file.
    pub fn owns_file_text(&self) -> bool {
        self.owns_file_text
    }

    /// Returns `true` if the text currently lives in a version cache.
    pub fn is_versioned(&self) -> bool {
        matches!(self.repr, Representation::Versioned(_))
    }

    /// Returns `true` if the next query will reload from the backing file.
    pub fn has_pending_reload(&self) -> bool {
        self.pending_reload_from_disk
    }

    /// Size in bytes of the file at the last reload from disk.
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Modification time of the file at the last reload from disk.
    pub fn modified_time(&self) -> Option<SystemTime> {
        self.modified_time
    }

    /// Open the document for editing, optionally replacing its text.
    ///
    /// Returns whether the text changed. The storage switches to the versioned representation.
    pub fn open(&mut self, text: Option<String>) -> Result<bool> {
        self.is_open = true;
        let changed = match text {
            Some(text) => self.reload(text)?,
            None => {
                self.ensure_loaded()?;
                false
            }
        };
        self.versioned()?;
        Ok(changed)
    }

    /// Close the document. If the file still exists and the text did not come from it, a reload
    /// from disk is scheduled; returns whether that happened.
    pub fn close(&mut self, file_exists: bool) -> bool {
        self.is_open = false;
        file_exists && self.schedule_reload_if_needed()
    }

    /// Schedule a reload from the backing file unless one is pending or the text already matches
    /// the file. Returns whether a reload was scheduled.
    pub fn schedule_reload_if_needed(&mut self) -> bool {
        if self.pending_reload_from_disk || self.owns_file_text || self.source.is_none() {
            return false;
        }
        self.pending_reload_from_disk = true;
        tracing::debug!(path = ?self.path(), "scheduled reload from disk");
        true
    }

    /// Mark the text as stale; the next query reloads it from the backing file.
    pub fn delay_reload_from_file_into_text(&mut self) {
        if self.source.is_some() {
            self.pending_reload_from_disk = true;
        }
    }

    /// Replace the text with `text`. Returns `false` (and changes nothing) if it is identical to the
    /// current text.
    pub fn reload(&mut self, text: impl Into<String>) -> Result<bool> {
        let text = text.into();
        self.pending_reload_from_disk = false;

        let unchanged = match &mut self.repr {
            Representation::Plain { text: current, .. } => **current == *text,
            Representation::Versioned(cache) => cache.text()? == text,
        };
        if unchanged {
            tracing::trace!(generation = self.generation, "reload with identical text");
            return Ok(false);
        }

        self.use_text(text);
        self.owns_file_text = false;
        Ok(true)
    }

    /// Read the backing file now and reload from it. Returns whether the text changed.
    ///
    /// A missing file reloads as empty text; other read errors are returned.
    pub fn reload_from_host(&mut self) -> Result<bool> {
        let Some(source) = &self.source else {
            return Err(TextError::NoBackingFile);
        };
        let (text, file_size) = source.load(self.config.max_file_size)?;
        let modified_time = source.host.modified_time(&source.path);

        let changed = self.reload(text)?;
        self.file_size = Some(file_size);
        self.modified_time = modified_time;
        self.owns_file_text = true;
        Ok(changed)
    }

    /// Replace `[start, end)` with `new_text`.
    pub fn edit(&mut self, start: usize, end: usize, new_text: &str) -> Result<()> {
        self.ensure_loaded()?;
        let char_count = match &self.repr {
            Representation::Plain { text, line_starts: cell } => line_starts(text, cell).char_count(),
            Representation::Versioned(cache) => cache.pending_char_count(),
        };
        if start > end || end > char_count {
            return Err(TextError::InvalidRange {
                start,
                end,
                char_count,
            });
        }
        self.versioned()?.edit(start, end - start, new_text)?;
        self.owns_file_text = false;
        Ok(())
    }

    /// Version token of the current text. Materializes buffered edits.
    pub fn version(&mut self) -> Result<DocumentVersion> {
        self.ensure_loaded()?;
        let snapshot = match &mut self.repr {
            Representation::Plain { .. } => 0,
            Representation::Versioned(cache) => cache.snapshot()?.version(),
        };
        Ok(DocumentVersion {
            generation: self.generation,
            snapshot,
        })
    }

    /// What changed since `old`.
    ///
    /// `old` at or after the current version is [`ChangeRange::Unchanged`]; a token from another
    /// generation or an evicted version is [`ChangeRange::Unavailable`].
    pub fn change_range(&mut self, old: DocumentVersion) -> Result<ChangeRange> {
        let current = self.version()?;
        if old >= current {
            return Ok(ChangeRange::Unchanged);
        }
        if old.generation != current.generation {
            return Ok(ChangeRange::Unavailable);
        }
        Ok(match &self.repr {
            Representation::Plain { .. } => ChangeRange::Unchanged,
            Representation::Versioned(cache) => {
                cache.text_changes_between_versions(old.snapshot, current.snapshot)
            }
        })
    }

    /// A read-only view of the current text.
    pub fn snapshot(&mut self) -> Result<TextSnapshot> {
        let version = self.version()?;
        Ok(match &mut self.repr {
            Representation::Plain { text, .. } => TextSnapshot::Plain {
                version,
                text: Arc::clone(text),
            },
            Representation::Versioned(cache) => TextSnapshot::Versioned {
                generation: self.generation,
                snapshot: cache.snapshot()?,
            },
        })
    }

    /// Full text.
    pub fn text(&mut self) -> Result<String> {
        self.ensure_loaded()?;
        match &mut self.repr {
            Representation::Plain { text, .. } => Ok(text.to_string()),
            Representation::Versioned(cache) => cache.text(),
        }
    }

    /// Length in chars.
    pub fn char_count(&mut self) -> Result<usize> {
        self.ensure_loaded()?;
        match &mut self.repr {
            Representation::Plain { text, line_starts: cell } => {
                Ok(line_starts(text, cell).char_count())
            }
            Representation::Versioned(cache) => Ok(cache.snapshot()?.char_count()),
        }
    }

    /// Text of `[start, end)`.
    pub fn get_snapshot_text(&mut self, start: usize, end: usize) -> Result<String> {
        let char_count = self.char_count()?;
        if start > end || end > char_count {
            return Err(TextError::InvalidRange {
                start,
                end,
                char_count,
            });
        }
        match &mut self.repr {
            Representation::Plain { text, line_starts: cell } => {
                let starts = line_starts(text, cell);
                let from = starts.byte_offset(text, start);
                let to = starts.byte_offset(text, end);
                Ok(text[from..to].to_string())
            }
            Representation::Versioned(cache) => Ok(cache.snapshot()?.get_text(start, end)),
        }
    }

    /// Number of lines, counting the empty line after a trailing terminator.
    pub fn line_count(&mut self) -> Result<usize> {
        self.ensure_loaded()?;
        match &mut self.repr {
            Representation::Plain { text, line_starts: cell } => {
                Ok(line_starts(text, cell).line_count())
            }
            Representation::Versioned(cache) => cache.line_count(),
        }
    }

    /// Span of the zero-based `line`, terminator included.
    pub fn line_to_text_span(&mut self, line: usize) -> Result<TextSpan> {
        self.ensure_loaded()?;
        match &mut self.repr {
            Representation::Plain { text, line_starts: cell } => {
                let starts = line_starts(text, cell);
                match (starts.line_start(line), starts.line_end(line)) {
                    (Some(start), Some(end)) => Ok(TextSpan::from_bounds(start, end)),
                    _ => Err(TextError::InvalidLine {
                        line,
                        offset: 0,
                        line_count: starts.line_count(),
                    }),
                }
            }
            Representation::Versioned(cache) => cache.line_to_text_span(line),
        }
    }

    /// Absolute position of a one-based `line` and one-based `offset`.
    ///
    /// The offset may point just past the line's last char (which is the start of the next line).
    pub fn line_offset_to_position(&mut self, line: usize, offset: usize) -> Result<usize> {
        let invalid = |line_count| TextError::InvalidLine {
            line,
            offset,
            line_count,
        };
        if line == 0 || offset == 0 {
            return Err(invalid(self.line_count()?));
        }
        let span = match self.line_to_text_span(line - 1) {
            Ok(span) => span,
            Err(TextError::InvalidLine { line_count, .. }) => return Err(invalid(line_count)),
            Err(err) => return Err(err),
        };
        if offset - 1 > span.length {
            return Err(invalid(self.line_count()?));
        }
        Ok(span.start + offset - 1)
    }

    /// One-based line and one-based offset of `position`.
    ///
    /// The end of a document that ends with a terminator is offset 1 of the empty last line.
    pub fn position_to_line_offset(&mut self, position: usize) -> Result<LineOffset> {
        self.ensure_loaded()?;
        match &mut self.repr {
            Representation::Plain { text, line_starts: cell } => {
                let starts = line_starts(text, cell);
                if position > starts.char_count() {
                    return Err(TextError::InvalidPosition {
                        position,
                        char_count: starts.char_count(),
                    });
                }
                let line = starts.line_of_position(position);
                let start = starts.line_start(line).unwrap_or(0);
                Ok(LineOffset {
                    line: line + 1,
                    column: position - start + 1,
                })
            }
            Representation::Versioned(cache) => {
                let offset = cache.position_to_line_offset(position)?;
                Ok(LineOffset {
                    line: offset.line,
                    column: offset.column + 1,
                })
            }
        }
    }

    /// Perform a pending reload. Read failures are logged and load empty text.
    fn ensure_loaded(&mut self) -> Result<()> {
        if !self.pending_reload_from_disk {
            return Ok(());
        }
        match self.reload_from_host() {
            Ok(_) => Ok(()),
            Err(TextError::Io(err)) => {
                tracing::warn!(path = ?self.path(), error = %err, "failed to reload document, using empty text");
                self.reload(String::new())?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn use_text(&mut self, text: String) {
        self.generation += 1;
        self.file_size = None;
        self.repr = if self.is_open {
            Representation::Versioned(VersionCache::from_text(&text, self.config.cache))
        } else {
            Representation::plain(text)
        };
        tracing::debug!(
            generation = self.generation,
            versioned = self.is_versioned(),
            "replaced document text"
        );
    }

    /// Switch to the versioned representation (if needed) and return the cache.
    fn versioned(&mut self) -> Result<&mut VersionCache> {
        if let Representation::Plain { text, .. } = &self.repr {
            let cache = VersionCache::from_text(text, self.config.cache);
            self.repr = Representation::Versioned(cache);
            self.generation += 1;
            tracing::debug!(generation = self.generation, "switched to versioned text");
        }
        match &mut self.repr {
            Representation::Versioned(cache) => Ok(cache),
            Representation::Plain { .. } => {
                Err(TextError::CorruptTree("plain text left after switching to versions"))
            }
        }
    }
}
