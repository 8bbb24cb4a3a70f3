use thiserror::Error;

/// Errors produced by the line index, the version cache and the document storage.
///
/// Every variant except [`TextError::Io`] describes a caller bug (bad offsets, bad version
/// bookkeeping) or a broken tree invariant. They are reported instead of clamped, so a wrong
/// offset never silently corrupts the document.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("invalid edit: {delete_len} chars deleted at {pos} in a document of {char_count} chars")]
    /// The edit deletes past the end of the document or starts beyond it.
    InvalidEdit {
        /// Start offset of the edit.
        pos: usize,
        /// Number of chars the edit deletes.
        delete_len: usize,
        /// Length of the document the edit was applied to.
        char_count: usize,
    },

    #[error("invalid range: {start}..{end} in a document of {char_count} chars")]
    /// A half-open range is reversed or runs past the end of the document.
    InvalidRange {
        /// Inclusive start offset.
        start: usize,
        /// Exclusive end offset.
        end: usize,
        /// Length of the document.
        char_count: usize,
    },

    #[error("invalid position: {position} in a document of {char_count} chars")]
    /// An absolute position lies beyond the end of the document.
    InvalidPosition {
        /// The offending position.
        position: usize,
        /// Length of the document.
        char_count: usize,
    },

    #[error("invalid line/offset: line {line}, offset {offset} ({line_count} lines)")]
    /// A line/offset pair does not address a character of the document.
    InvalidLine {
        /// The requested line (one-based unless stated otherwise by the caller).
        line: usize,
        /// The requested offset inside the line.
        offset: usize,
        /// Number of lines in the document.
        line_count: usize,
    },

    #[error("text state is corrupted: {0}")]
    /// The edit walk or the storage reached a state that well-formed text cannot produce.
    CorruptTree(&'static str),

    #[error("edit check failed: expected {expected_chars} chars, tree holds {actual_chars} chars")]
    /// Debug edit checking found the rebuilt tree disagreeing with a plain string splice.
    EditCheckFailed {
        /// Length of the text produced by the string splice.
        expected_chars: usize,
        /// Length of the text held by the rebuilt tree.
        actual_chars: usize,
    },

    #[error("document has no backing file")]
    /// A reload from the host was requested for an in-memory document.
    NoBackingFile,

    #[error("I/O error: {0}")]
    /// The host failed to read the backing file.
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TextError>;
