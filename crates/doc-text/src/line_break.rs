//! Line splitting helpers shared by the tree and the plain-text representation.
//!
//! A line terminator is `"\r\n"`, `'\n'`, `'\r'`, U+2028 or U+2029. Lines produced here keep their
//! terminator, so concatenating them gives back the input text.

/// Returns `true` if `c` terminates a line on its own (`'\r'` also starts a `"\r\n"` pair).
pub fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Returns `true` if `text` ends with a line terminator.
pub fn ends_with_line_break(text: &str) -> bool {
    text.chars().next_back().is_some_and(is_line_break)
}

/// Split `text` into lines, each including its terminator.
///
/// A text without a final terminator ends with a partial line; a text with one does **not** get an
/// empty trailing line. `""` yields no lines at all.
pub fn lines_from_text(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        let mut end = idx + c.len_utf8();
        if c == '\r'
            && let Some(&(next_idx, '\n')) = chars.peek()
        {
            end = next_idx + 1;
            chars.next();
        }
        lines.push(text[start..end].to_string());
        start = end;
    }

    if start < text.len() {
        lines.push(text[start..].to_string());
    }
    lines
}

/// Char offsets of every line start in `text`.
///
/// Always starts with `0`; a trailing terminator adds the start of an empty last line, so
/// `"abc\n"` gives `[0, 4]`.
pub fn compute_line_starts(text: &str) -> Vec<usize> {
    LineStarts::new(text).starts.iter().map(|s| s.chars).collect()
}

/// Byte offset of the `char_offset`-th char of `text` (`text.len()` when past the end).
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineStart {
    chars: usize,
    bytes: usize,
}

/// Line-start table over a flat string, used by the plain representation.
///
/// Stores char and byte offsets side by side so slicing by char range only scans one line.
#[derive(Debug, Clone)]
pub struct LineStarts {
    starts: Vec<LineStart>,
    char_count: usize,
}

impl LineStarts {
    /// Scan `text` once and record every line start.
    pub fn new(text: &str) -> Self {
        let mut starts = vec![LineStart { chars: 0, bytes: 0 }];
        let mut char_count = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            char_count += 1;
            if !is_line_break(c) {
                continue;
            }
            let mut bytes = idx + c.len_utf8();
            if c == '\r'
                && let Some(&(next_idx, '\n')) = chars.peek()
            {
                chars.next();
                char_count += 1;
                bytes = next_idx + 1;
            }
            starts.push(LineStart {
                chars: char_count,
                bytes,
            });
        }

        Self { starts, char_count }
    }

    /// Number of lines (never zero).
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Number of chars in the scanned text.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Char offset where the zero-based `line` starts, or `None` past the last line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).map(|s| s.chars)
    }

    /// Char offset where the zero-based `line` ends, terminator included.
    pub fn line_end(&self, line: usize) -> Option<usize> {
        if line >= self.starts.len() {
            return None;
        }
        Some(
            self.starts
                .get(line + 1)
                .map(|s| s.chars)
                .unwrap_or(self.char_count),
        )
    }

    /// Zero-based line containing char offset `position`.
    ///
    /// `position == char_count` maps to the last line.
    pub fn line_of_position(&self, position: usize) -> usize {
        match self.starts.binary_search_by_key(&position, |s| s.chars) {
            Ok(line) => line,
            Err(insert_at) => insert_at - 1,
        }
    }

    /// Byte offset in `text` of char offset `position`. `text` must be the scanned text.
    pub fn byte_offset(&self, text: &str, position: usize) -> usize {
        let line = self.line_of_position(position);
        let start = self.starts[line];
        let line_text = &text[start.bytes..];
        start.bytes + char_to_byte(line_text, position - start.chars)
    }
}
