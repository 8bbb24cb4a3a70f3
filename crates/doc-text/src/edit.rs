//! Edits and the edit applier.
//!
//! A [`TextChange`] is one `(pos, delete_len, inserted_text)` replacement in char offsets.
//! [`apply_edit`] is the stateless step that turns a tree and a change into the next tree; the
//! append and line-boundary special cases live in [`LineIndex::edit`].

use crate::delta::{TextChangeRange, TextSpan};
use crate::error::Result;
use crate::line_index::LineIndex;

/// One buffered replacement: delete `delete_len` chars at `pos`, then insert `inserted_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// Start offset, in the text the change applies to.
    pub pos: usize,
    /// Number of chars removed.
    pub delete_len: usize,
    /// Replacement text (may be empty).
    pub inserted_text: String,
}

impl TextChange {
    /// Create a change.
    pub fn new(pos: usize, delete_len: usize, inserted_text: impl Into<String>) -> Self {
        Self {
            pos,
            delete_len,
            inserted_text: inserted_text.into(),
        }
    }

    /// Length of `inserted_text` in chars.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// Exclusive end of the deleted range.
    pub fn end(&self) -> usize {
        self.pos + self.delete_len
    }

    /// Returns `true` if the change neither deletes nor inserts anything.
    pub fn is_noop(&self) -> bool {
        self.delete_len == 0 && self.inserted_text.is_empty()
    }

    /// The change as a [`TextChangeRange`].
    pub fn text_change_range(&self) -> TextChangeRange {
        TextChangeRange::new(TextSpan::new(self.pos, self.delete_len), self.inserted_len())
    }
}

/// Apply `change` to `index`, returning the new tree. `index` is not modified.
///
/// With `check_edits`, the result is verified against a plain string splice.
pub fn apply_edit(index: &LineIndex, change: &TextChange, check_edits: bool) -> Result<LineIndex> {
    if check_edits {
        index.edit_checked(change.pos, change.delete_len, &change.inserted_text)
    } else {
        index.edit(change.pos, change.delete_len, &change.inserted_text)
    }
}
