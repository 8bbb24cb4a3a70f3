//! Change ranges between document versions.
//!
//! Incremental consumers (parsers, semantic analysis) need to know which region of the old text
//! was replaced and how long the replacement is, without diffing the two texts. Everything here
//! is expressed in **char offsets** (Unicode scalar values).

/// A half-open char range `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextSpan {
    /// First char of the span.
    pub start: usize,
    /// Number of chars in the span.
    pub length: usize,
}

impl TextSpan {
    /// Create a span from a start and a length.
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a span from `[start, end)`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "reversed span {start}..{end}");
        Self {
            start,
            length: end - start,
        }
    }

    /// Exclusive end of the span.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Returns `true` if the span covers no chars.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// A region of the old text (`span`) replaced by `new_length` chars of new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextChangeRange {
    /// Replaced region, in old-text offsets.
    pub span: TextSpan,
    /// Length of the text that replaced `span`.
    pub new_length: usize,
}

impl TextChangeRange {
    /// Create a change range.
    pub fn new(span: TextSpan, new_length: usize) -> Self {
        Self { span, new_length }
    }

    /// The range that changes nothing.
    pub const UNCHANGED: TextChangeRange = TextChangeRange {
        span: TextSpan {
            start: 0,
            length: 0,
        },
        new_length: 0,
    };

    /// Exclusive end of the replacement, in new-text offsets.
    pub fn new_end(&self) -> usize {
        self.span.start + self.new_length
    }
}

/// Answer to "what changed since version X?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRange {
    /// Nothing changed (same version, or a request that is not older than the current one).
    Unchanged,
    /// The text changed inside the given range.
    Changed(TextChangeRange),
    /// The history needed to answer was evicted or belongs to another text; diff the full text.
    Unavailable,
}

impl ChangeRange {
    /// The change range, if one was computed.
    pub fn changed(self) -> Option<TextChangeRange> {
        match self {
            ChangeRange::Changed(range) => Some(range),
            ChangeRange::Unchanged | ChangeRange::Unavailable => None,
        }
    }

    /// Returns `true` for [`ChangeRange::Unavailable`].
    pub fn is_unavailable(self) -> bool {
        matches!(self, ChangeRange::Unavailable)
    }
}

/// Fold consecutive change ranges into one range covering all of them.
///
/// Each range is expressed in the offsets of the text produced by the ranges before it. The
/// result is expressed in the offsets of the text before the first range; its `new_length`
/// is measured in the text after the last range. An empty slice yields
/// [`TextChangeRange::UNCHANGED`].
pub fn collapse_text_change_ranges(changes: &[TextChangeRange]) -> TextChangeRange {
    let Some((first, rest)) = changes.split_first() else {
        return TextChangeRange::UNCHANGED;
    };

    let mut old_start = first.span.start;
    let mut old_end = first.span.end();
    let mut new_end = first.new_end();

    for next in rest {
        let next_old_start = next.span.start;
        let next_old_end = next.span.end();
        let next_new_end = next.new_end();

        // `next` speaks in offsets of the text produced so far. Map its end back through the
        // accumulated change (old_end <-> new_end) and keep whichever bound reaches further.
        let start = old_start.min(next_old_start);
        let end = if next_old_end > new_end {
            old_end + (next_old_end - new_end)
        } else {
            old_end
        };
        let end_after = if new_end > next_old_end {
            next_new_end + (new_end - next_old_end)
        } else {
            next_new_end
        };

        old_start = start;
        old_end = end;
        new_end = end_after;
    }

    TextChangeRange::new(TextSpan::from_bounds(old_start, old_end), new_end - old_start)
}
