#![warn(missing_docs)]
//! Doc Text - Versioned Document Text for Language Services
//!
//! # Overview
//!
//! `doc-text` keeps the text of source documents that are edited incrementally by an editor while a
//! language service keeps reading them. It answers line/offset queries quickly, batches edits,
//! and remembers enough recent history to tell a consumer which region changed between two
//! versions, so parsers can re-analyze incrementally instead of from scratch.
//!
//! # Core Features
//!
//! - **Line Index Tree**: persistent n-ary tree of lines, O(log n) line and offset lookups,
//!   untouched subtrees shared between versions
//! - **Batched Edits**: edits are buffered and folded into a new snapshot on demand
//! - **Version History**: a bounded ring of snapshots with collapsed change ranges
//! - **Document Storage**: flat text for read-only documents, versioned text once edited,
//!   lazy reloads from a backing file
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextStorage (plain / versioned, reloads)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  VersionCache (pending edits, snapshots)    │  ← History
//! ├─────────────────────────────────────────────┤
//! │  apply_edit / TextChange                    │  ← Edit Applier
//! ├─────────────────────────────────────────────┤
//! │  LineIndex (persistent line tree)           │  ← Line Access
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use doc_text::{ChangeRange, LineOffset, StorageConfig, TextStorage};
//!
//! let mut storage = TextStorage::from_text("abc\ndef\n", StorageConfig::default());
//! storage.open(None).unwrap();
//!
//! let before = storage.version().unwrap();
//! storage.edit(4, 7, "xyz").unwrap();
//!
//! assert_eq!(storage.text().unwrap(), "abc\nxyz\n");
//! assert_eq!(storage.position_to_line_offset(5).unwrap(), LineOffset { line: 2, column: 2 });
//! assert!(matches!(storage.change_range(before).unwrap(), ChangeRange::Changed(_)));
//! ```
//!
//! # Units
//!
//! All offsets and lengths are counted in `char`s (Unicode scalar values). Lines end with
//! `"\r\n"`, `'\n'`, `'\r'`, U+2028 or U+2029 and keep their terminator.
//!
//! # Module Description
//!
//! - [`line_index`] - Persistent line tree
//! - [`edit`] - Edit records and the edit applier
//! - [`version_cache`] - Batched edits and snapshot history
//! - [`storage`] - Document storage and reloads
//! - [`delta`] - Spans and change ranges
//! - [`line_break`] - Line terminator helpers
//! - [`host`] - Access to backing files

pub mod config;
pub mod delta;
pub mod edit;
pub mod error;
pub mod host;
pub mod line_break;
pub mod line_index;
pub mod storage;
pub mod version_cache;

pub use config::{StorageConfig, VersionCacheConfig};
pub use delta::{ChangeRange, TextChangeRange, TextSpan, collapse_text_change_ranges};
pub use edit::{TextChange, apply_edit};
pub use error::{Result, TextError};
pub use host::{FsHost, TextHost};
pub use line_break::LineStarts;
pub use line_index::{LineIndex, LineInfo, LineOffset};
pub use storage::{DocumentVersion, TextSnapshot, TextStorage};
pub use version_cache::{Snapshot, VersionCache};
