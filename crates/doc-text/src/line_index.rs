//! Line index tree
//!
//! An n-ary tree over the lines of a document. Leaves hold one line of text (terminator
//! included); interior nodes cache the char and line totals of their subtree. Trees are
//! immutable: [`LineIndex::edit`] rebuilds the nodes on the path of the edited range and shares
//! every other subtree with the tree it was derived from, so older versions stay valid.
//!
//! Invariants of a well-formed tree:
//!
//! - concatenating the leaves left to right yields the document text
//! - leaves are never empty and every leaf except the last ends with a line terminator
//! - all leaves sit at the same depth
//! - interior nodes hold between 1 and [`LINE_COLLECTION_CAPACITY`] children (the root may hold 0)
//! - cached totals equal the sum over the children

use crate::error::{Result, TextError};
use crate::line_break::{char_to_byte, ends_with_line_break, lines_from_text};
use std::sync::Arc;

/// Maximum number of children of an interior node.
pub const LINE_COLLECTION_CAPACITY: usize = 4;

#[derive(Debug)]
enum LineNode {
    Leaf(LineLeaf),
    Interior(LineInterior),
}

impl LineNode {
    fn char_count(&self) -> usize {
        match self {
            LineNode::Leaf(leaf) => leaf.char_count,
            LineNode::Interior(node) => node.total_chars,
        }
    }

    fn line_count(&self) -> usize {
        match self {
            LineNode::Leaf(_) => 1,
            LineNode::Interior(node) => node.total_lines,
        }
    }
}

#[derive(Debug)]
struct LineLeaf {
    text: String,
    char_count: usize,
}

impl LineLeaf {
    fn new(text: String) -> Self {
        let char_count = text.chars().count();
        Self { text, char_count }
    }
}

#[derive(Debug, Clone, Default)]
struct LineInterior {
    children: Vec<Arc<LineNode>>,
    total_chars: usize,
    total_lines: usize,
}

impl LineInterior {
    fn new(children: Vec<Arc<LineNode>>) -> Self {
        let total_chars = children.iter().map(|c| c.char_count()).sum();
        let total_lines = children.iter().map(|c| c.line_count()).sum();
        Self {
            children,
            total_chars,
            total_lines,
        }
    }
}

/// Pack nodes of equal height into parents of at most [`LINE_COLLECTION_CAPACITY`] children.
fn group_nodes(nodes: Vec<Arc<LineNode>>) -> Vec<Arc<LineNode>> {
    let mut grouped = Vec::with_capacity(nodes.len().div_ceil(LINE_COLLECTION_CAPACITY));
    let mut nodes = nodes.into_iter().peekable();
    while nodes.peek().is_some() {
        let chunk: Vec<_> = nodes.by_ref().take(LINE_COLLECTION_CAPACITY).collect();
        grouped.push(Arc::new(LineNode::Interior(LineInterior::new(chunk))));
    }
    grouped
}

/// Build a root over nodes of equal height, adding levels until it fits.
fn build_root(mut nodes: Vec<Arc<LineNode>>) -> LineInterior {
    while nodes.len() > LINE_COLLECTION_CAPACITY {
        nodes = group_nodes(nodes);
    }
    let mut root = LineInterior::new(nodes);
    // Drop levels that only wrap a single interior node.
    while root.children.len() == 1 {
        let next = match root.children[0].as_ref() {
            LineNode::Interior(inner) => inner.clone(),
            LineNode::Leaf(_) => break,
        };
        root = next;
    }
    root
}

/// Result of locating an absolute position: one-based line, zero-based column, and the line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo<'a> {
    /// One-based line number.
    pub line: usize,
    /// Zero-based column (chars from the start of the line).
    pub column: usize,
    /// Text of the line, terminator included; `None` when the position is at or past the end.
    pub text: Option<&'a str>,
}

/// A one-based line number and a zero-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineOffset {
    /// One-based line number.
    pub line: usize,
    /// Column; zero-based for tree queries, one-based at the storage level.
    pub column: usize,
}

/// Start of a line: its absolute position and its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStart<'a> {
    /// Absolute char offset of the first char of the line.
    pub position: usize,
    /// Line text with terminator; `None` means "no such line" (`position` is then the document
    /// length).
    pub text: Option<&'a str>,
}

/// Where a child sits relative to the edited range `[start, start + delete_len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharRangeSection {
    /// Entirely before the range.
    PreStart,
    /// Contains the range start; the range continues past this node.
    Start,
    /// Contains the whole range.
    Entire,
    /// Covered by the range from end to end.
    Mid,
    /// Contains the range end; the range began before this node.
    End,
    /// Entirely after the range.
    PostEnd,
}

impl CharRangeSection {
    /// Turn a section computed inside a node into the section relative to the whole edit.
    ///
    /// Inside a `Start` node the local range runs to the node's end, so nothing there can hold
    /// the real end of the edit; inside an `End` node the local range starts at zero, so nothing
    /// there holds the real start.
    fn refine(self, local: CharRangeSection) -> Result<CharRangeSection> {
        use CharRangeSection::*;
        match (self, local) {
            (Entire, local) => Ok(local),
            (Start, PreStart) => Ok(PreStart),
            (Start, Start | Entire) => Ok(Start),
            (Start, Mid | End) => Ok(Mid),
            (Start, PostEnd) => Err(TextError::CorruptTree("range start node has trailing children")),
            (End, PreStart) => Err(TextError::CorruptTree("range end node has leading children")),
            (End, Start | Mid) => Ok(Mid),
            (End, Entire | End) => Ok(End),
            (End, PostEnd) => Ok(PostEnd),
            (Mid, _) => Ok(Mid),
            (PreStart | PostEnd, _) => {
                Err(TextError::CorruptTree("edit walk descended outside the range"))
            }
        }
    }
}

/// Rebuilds the part of a tree touched by one edit.
///
/// Untouched branches are shared. Leaves before the range keep their place; the leaf holding
/// the range start contributes `initial_text`, the leaf holding the range end contributes
/// `trailing_text`, and the re-split `initial + inserted + trailing` replaces every leaf in
/// between. Replacement happens at the end leaf, once both halves are known.
struct EditWalker<'a> {
    inserted: &'a str,
    suppress_trailing_text: bool,
    initial_text: String,
    trailing_text: String,
    emitted: bool,
}

impl<'a> EditWalker<'a> {
    fn new(inserted: &'a str, suppress_trailing_text: bool) -> Self {
        Self {
            inserted,
            suppress_trailing_text,
            initial_text: String::new(),
            trailing_text: String::new(),
            emitted: false,
        }
    }

    /// Walk `node` for the local range `[start, start + len)`; returns the nodes replacing it.
    fn walk(
        &mut self,
        node: &LineInterior,
        start: usize,
        len: usize,
        section: CharRangeSection,
    ) -> Result<Vec<Arc<LineNode>>> {
        use CharRangeSection::*;

        let children = &node.children;
        let mut out = Vec::with_capacity(children.len() + 1);
        let mut index = 0;
        let mut adjusted_start = start;

        while index < children.len() && adjusted_start >= children[index].char_count() {
            adjusted_start -= children[index].char_count();
            self.visit(&children[index], 0, 0, section.refine(PreStart)?, &mut out)?;
            index += 1;
        }

        let Some(first) = children.get(index) else {
            return Err(TextError::CorruptTree("edit start beyond node end"));
        };
        let first_chars = first.char_count();

        if adjusted_start + len <= first_chars {
            self.visit(first, adjusted_start, len, section.refine(Entire)?, &mut out)?;
        } else {
            let head = first_chars - adjusted_start;
            self.visit(first, adjusted_start, head, section.refine(Start)?, &mut out)?;

            let mut remaining = len - head;
            loop {
                index += 1;
                let Some(child) = children.get(index) else {
                    return Err(TextError::CorruptTree("edit end beyond node end"));
                };
                let chars = child.char_count();
                if remaining > chars {
                    self.visit(child, 0, chars, section.refine(Mid)?, &mut out)?;
                    remaining -= chars;
                } else {
                    self.visit(child, 0, remaining, section.refine(End)?, &mut out)?;
                    break;
                }
            }
        }

        for child in &children[index + 1..] {
            self.visit(child, 0, 0, section.refine(PostEnd)?, &mut out)?;
        }

        Ok(Self::rebalance(out))
    }

    fn visit(
        &mut self,
        child: &Arc<LineNode>,
        start: usize,
        len: usize,
        section: CharRangeSection,
        out: &mut Vec<Arc<LineNode>>,
    ) -> Result<()> {
        use CharRangeSection::*;

        match section {
            PreStart | PostEnd => out.push(Arc::clone(child)),
            Mid => {}
            Start | Entire | End => match child.as_ref() {
                LineNode::Leaf(leaf) => self.visit_leaf(leaf, start, len, section, out)?,
                LineNode::Interior(inner) => out.extend(self.walk(inner, start, len, section)?),
            },
        }
        Ok(())
    }

    fn visit_leaf(
        &mut self,
        leaf: &LineLeaf,
        start: usize,
        len: usize,
        section: CharRangeSection,
        out: &mut Vec<Arc<LineNode>>,
    ) -> Result<()> {
        let text = leaf.text.as_str();
        match section {
            CharRangeSection::Start => {
                self.initial_text = text[..char_to_byte(text, start)].to_string();
                Ok(())
            }
            CharRangeSection::Entire => {
                self.initial_text = text[..char_to_byte(text, start)].to_string();
                self.trailing_text = text[char_to_byte(text, start + len)..].to_string();
                self.emit(out)
            }
            CharRangeSection::End => {
                self.trailing_text = text[char_to_byte(text, len)..].to_string();
                self.emit(out)
            }
            CharRangeSection::PreStart | CharRangeSection::Mid | CharRangeSection::PostEnd => {
                Err(TextError::CorruptTree("leaf outside the edit range was opened"))
            }
        }
    }

    fn emit(&mut self, out: &mut Vec<Arc<LineNode>>) -> Result<()> {
        if self.emitted {
            return Err(TextError::CorruptTree("edit range ended twice"));
        }
        self.emitted = true;

        let mut combined = std::mem::take(&mut self.initial_text);
        combined.push_str(self.inserted);
        if !self.suppress_trailing_text {
            combined.push_str(&self.trailing_text);
        }
        out.extend(
            lines_from_text(&combined)
                .into_iter()
                .map(|line| Arc::new(LineNode::Leaf(LineLeaf::new(line)))),
        );
        Ok(())
    }

    /// Wrap rebuilt children back into interior nodes: none if empty, several on overflow.
    fn rebalance(children: Vec<Arc<LineNode>>) -> Vec<Arc<LineNode>> {
        if children.is_empty() {
            Vec::new()
        } else if children.len() <= LINE_COLLECTION_CAPACITY {
            vec![Arc::new(LineNode::Interior(LineInterior::new(children)))]
        } else {
            group_nodes(children)
        }
    }
}

/// Immutable line index over one version of a document.
///
/// Cloning is cheap: the clone shares every node.
///
/// # Example
///
/// ```rust
/// use doc_text::LineIndex;
///
/// let index = LineIndex::from_text("abc\ndef\n");
/// let edited = index.edit(4, 3, "xyz").unwrap();
///
/// assert_eq!(edited.text(), "abc\nxyz\n");
/// assert_eq!(index.text(), "abc\ndef\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    root: LineInterior,
}

impl LineIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(lines_from_text(text))
    }

    /// Build an index bottom-up from line strings (terminators included). Empty strings are
    /// skipped.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let leaves: Vec<Arc<LineNode>> = lines
            .into_iter()
            .filter(|line| !line.is_empty())
            .map(|line| Arc::new(LineNode::Leaf(LineLeaf::new(line))))
            .collect();
        Self {
            root: build_root(leaves),
        }
    }

    /// Returns `true` if the document holds no text.
    pub fn is_empty(&self) -> bool {
        self.root.total_chars == 0
    }

    /// Total number of chars.
    pub fn char_count(&self) -> usize {
        self.root.total_chars
    }

    /// Number of leaves. A trailing terminator does not add an empty line here; see
    /// [`LineIndex::document_line_count`].
    pub fn line_count(&self) -> usize {
        self.root.total_lines
    }

    /// Number of lines as an editor counts them: at least one, plus an empty last line after a
    /// trailing terminator.
    pub fn document_line_count(&self) -> usize {
        if self.is_empty() || self.ends_with_line_break() {
            self.line_count() + 1
        } else {
            self.line_count()
        }
    }

    /// Returns `true` if the last leaf ends with a line terminator.
    pub fn ends_with_line_break(&self) -> bool {
        self.last_leaf()
            .is_some_and(|leaf| ends_with_line_break(&leaf.text))
    }

    /// Height of the tree (0 for an empty tree, 1 when the root holds leaves).
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = &self.root;
        loop {
            let Some(first) = node.children.first() else {
                return height;
            };
            height += 1;
            match first.as_ref() {
                LineNode::Leaf(_) => return height,
                LineNode::Interior(inner) => node = inner,
            }
        }
    }

    fn last_leaf(&self) -> Option<&LineLeaf> {
        let mut node = &self.root;
        loop {
            match node.children.last()?.as_ref() {
                LineNode::Leaf(leaf) => return Some(leaf),
                LineNode::Interior(inner) => node = inner,
            }
        }
    }

    /// Locate `position`: line, column and the text of the containing line.
    ///
    /// A position at (or past) the end of the document reports the last line, a column equal to
    /// that line's length, and no text.
    pub fn position_to_column_and_line_text(&self, position: usize) -> LineInfo<'_> {
        let mut node = &self.root;
        let mut line = 1;
        let mut relative = position;

        'descend: loop {
            for child in &node.children {
                let chars = child.char_count();
                if chars > relative {
                    match child.as_ref() {
                        LineNode::Leaf(leaf) => {
                            return LineInfo {
                                line,
                                column: relative,
                                text: Some(&leaf.text),
                            };
                        }
                        LineNode::Interior(inner) => {
                            node = inner;
                            continue 'descend;
                        }
                    }
                }
                relative -= chars;
                line += child.line_count();
            }
            break;
        }

        match self.last_leaf() {
            Some(leaf) => LineInfo {
                line: self.line_count(),
                column: leaf.char_count,
                text: None,
            },
            None => LineInfo {
                line: 1,
                column: 0,
                text: None,
            },
        }
    }

    /// One-based line and zero-based column of `position`.
    pub fn position_to_line_offset(&self, position: usize) -> LineOffset {
        let info = self.position_to_column_and_line_text(position);
        LineOffset {
            line: info.line,
            column: info.column,
        }
    }

    /// Absolute position and text of the one-based `line`.
    ///
    /// Lines past the last leaf return the document length and no text.
    pub fn line_to_position_and_text(&self, line: usize) -> LineStart<'_> {
        if line == 0 {
            return LineStart {
                position: 0,
                text: None,
            };
        }

        let mut node = &self.root;
        let mut relative_line = line - 1;
        let mut position = 0;

        'descend: loop {
            for child in &node.children {
                let lines = child.line_count();
                if lines > relative_line {
                    match child.as_ref() {
                        LineNode::Leaf(leaf) => {
                            return LineStart {
                                position,
                                text: Some(&leaf.text),
                            };
                        }
                        LineNode::Interior(inner) => {
                            node = inner;
                            continue 'descend;
                        }
                    }
                }
                relative_line -= lines;
                position += child.char_count();
            }
            break;
        }

        LineStart {
            position: self.char_count(),
            text: None,
        }
    }

    /// Absolute position of the first char of the one-based `line`.
    pub fn absolute_position_of_start_of_line(&self, line: usize) -> usize {
        self.line_to_position_and_text(line).position
    }

    /// The char at `position`, if any.
    pub fn char_at(&self, position: usize) -> Option<char> {
        let info = self.position_to_column_and_line_text(position);
        info.text?.chars().nth(info.column)
    }

    /// Text of the char range `[start, start + len)`, clipped to the document.
    pub fn get_text(&self, start: usize, len: usize) -> String {
        let end = start.saturating_add(len).min(self.char_count());
        let mut out = String::new();
        if start < end {
            Self::collect_text(&self.root, start, end, 0, &mut out);
        }
        out
    }

    fn collect_text(node: &LineInterior, start: usize, end: usize, offset: usize, out: &mut String) {
        let mut child_start = offset;
        for child in &node.children {
            let child_end = child_start + child.char_count();
            if child_start >= end {
                break;
            }
            if child_end > start {
                match child.as_ref() {
                    LineNode::Leaf(leaf) => {
                        let from = start.saturating_sub(child_start);
                        let to = end.min(child_end) - child_start;
                        let text = leaf.text.as_str();
                        out.push_str(&text[char_to_byte(text, from)..char_to_byte(text, to)]);
                    }
                    LineNode::Interior(inner) => {
                        Self::collect_text(inner, start, end, child_start, out);
                    }
                }
            }
            child_start = child_end;
        }
    }

    /// The whole document text.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.char_count());
        for leaf in self.leaves() {
            out.push_str(leaf);
        }
        out
    }

    /// Iterate over leaf texts, left to right.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![self.root.children.iter()],
        }
    }

    /// Replace `delete_len` chars at `pos` with `inserted_text`, returning the new tree.
    ///
    /// `self` is left untouched. Fails with [`TextError::InvalidEdit`] when the range runs past
    /// the end of the document.
    pub fn edit(&self, pos: usize, delete_len: usize, inserted_text: &str) -> Result<Self> {
        let char_count = self.char_count();
        if pos > char_count || delete_len > char_count - pos {
            return Err(TextError::InvalidEdit {
                pos,
                delete_len,
                char_count,
            });
        }

        if char_count == 0 {
            return Ok(Self::from_text(inserted_text));
        }
        if delete_len == 0 && inserted_text.is_empty() {
            return Ok(self.clone());
        }

        let mut pos = pos;
        let mut delete_len = delete_len;
        let mut inserted = inserted_text.to_string();
        let mut suppress_trailing_text = false;

        if pos == char_count {
            // Appending: re-insert the final char so the walk starts inside the last leaf.
            pos = char_count - 1;
            let last = self
                .char_at(pos)
                .ok_or(TextError::CorruptTree("document length disagrees with its leaves"))?;
            inserted.insert(0, last);
            delete_len = 0;
            suppress_trailing_text = true;
        } else {
            if pos > 0 && self.char_at(pos - 1) == Some('\r') {
                // Keep a "\r\n" pair inside one leaf.
                pos -= 1;
                delete_len += 1;
                inserted.insert(0, '\r');
            }
            if delete_len > 0 {
                let end = pos + delete_len;
                let info = self.position_to_column_and_line_text(end);
                if info.column == 0
                    && let Some(line_text) = info.text
                {
                    // The line starting at the range end merges with the edited line.
                    delete_len += line_text.chars().count();
                    inserted.push_str(line_text);
                }
            }
        }

        tracing::trace!(pos, delete_len, suppress_trailing_text, "line index edit");

        let mut walker = EditWalker::new(&inserted, suppress_trailing_text);
        let nodes = walker.walk(&self.root, pos, delete_len, CharRangeSection::Entire)?;
        if !walker.emitted {
            return Err(TextError::CorruptTree("edit range never ended"));
        }

        Ok(Self {
            root: build_root(nodes),
        })
    }

    /// Like [`LineIndex::edit`], but also splices the text as a plain string and verifies the
    /// rebuilt tree against it, leaf by leaf. O(n); meant for tests and debugging.
    pub fn edit_checked(&self, pos: usize, delete_len: usize, inserted_text: &str) -> Result<Self> {
        let edited = self.edit(pos, delete_len, inserted_text)?;

        let source = self.text();
        let start = char_to_byte(&source, pos);
        let end = char_to_byte(&source, pos + delete_len);
        let expected = format!("{}{}{}", &source[..start], inserted_text, &source[end..]);

        let expected_lines = lines_from_text(&expected);
        let matches = edited
            .leaves()
            .eq(expected_lines.iter().map(String::as_str));
        if !matches {
            let actual_chars = edited.char_count();
            let expected_chars = expected.chars().count();
            tracing::error!(
                pos,
                delete_len,
                expected_chars,
                actual_chars,
                "line index edit diverged from string splice"
            );
            return Err(TextError::EditCheckFailed {
                expected_chars,
                actual_chars,
            });
        }

        edited.check_invariants()?;
        Ok(edited)
    }

    /// Verify the structural invariants listed in the module docs.
    pub fn check_invariants(&self) -> Result<()> {
        if self.root.children.len() > LINE_COLLECTION_CAPACITY {
            return Err(TextError::CorruptTree("root exceeds fan-out capacity"));
        }
        let mut leaf_depth = None;
        Self::check_node(&self.root, 1, &mut leaf_depth)?;

        let leaf_count = self.leaves().count();
        for (i, leaf) in self.leaves().enumerate() {
            if i + 1 < leaf_count && !ends_with_line_break(leaf) {
                return Err(TextError::CorruptTree("inner leaf without line terminator"));
            }
        }
        Ok(())
    }

    fn check_node(node: &LineInterior, depth: usize, leaf_depth: &mut Option<usize>) -> Result<()> {
        let chars: usize = node.children.iter().map(|c| c.char_count()).sum();
        let lines: usize = node.children.iter().map(|c| c.line_count()).sum();
        if chars != node.total_chars || lines != node.total_lines {
            return Err(TextError::CorruptTree("cached totals out of date"));
        }

        for child in &node.children {
            match child.as_ref() {
                LineNode::Leaf(leaf) => {
                    if leaf.text.is_empty() || leaf.char_count != leaf.text.chars().count() {
                        return Err(TextError::CorruptTree("empty or miscounted leaf"));
                    }
                    match *leaf_depth {
                        Some(expected) if expected != depth => {
                            return Err(TextError::CorruptTree("leaves at different depths"));
                        }
                        _ => *leaf_depth = Some(depth),
                    }
                }
                LineNode::Interior(inner) => {
                    if inner.children.is_empty() || inner.children.len() > LINE_COLLECTION_CAPACITY {
                        return Err(TextError::CorruptTree("interior node child count out of bounds"));
                    }
                    Self::check_node(inner, depth + 1, leaf_depth)?;
                }
            }
        }
        Ok(())
    }
}

/// Iterator over the leaf texts of a [`LineIndex`].
pub struct Leaves<'a> {
    stack: Vec<std::slice::Iter<'a, Arc<LineNode>>>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                None => {
                    self.stack.pop();
                }
                Some(node) => match node.as_ref() {
                    LineNode::Leaf(leaf) => return Some(&leaf.text),
                    LineNode::Interior(inner) => self.stack.push(inner.children.iter()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(index: &LineIndex) -> Vec<&str> {
        index.leaves().collect()
    }

    #[test]
    fn test_empty_index() {
        let index = LineIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.char_count(), 0);
        assert_eq!(index.line_count(), 0);
        assert_eq!(index.document_line_count(), 1);
        assert_eq!(index.height(), 0);
        assert_eq!(
            index.position_to_column_and_line_text(0),
            LineInfo {
                line: 1,
                column: 0,
                text: None
            }
        );
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_from_text_builds_balanced_tree() {
        let text: String = (0..100).map(|i| format!("line {i}\n")).collect();
        let index = LineIndex::from_text(&text);

        assert_eq!(index.line_count(), 100);
        assert_eq!(index.char_count(), text.chars().count());
        assert_eq!(index.text(), text);
        // 100 leaves, fan-out 4: 25 -> 7 -> 2 -> root
        assert_eq!(index.height(), 4);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_position_to_line_offset() {
        let index = LineIndex::from_text("abc\ndef\n");
        assert_eq!(index.position_to_line_offset(0), LineOffset { line: 1, column: 0 });
        assert_eq!(index.position_to_line_offset(5), LineOffset { line: 2, column: 1 });
        // end of document: last line, column = its length
        assert_eq!(index.position_to_line_offset(8), LineOffset { line: 2, column: 4 });
    }

    #[test]
    fn test_line_to_position_and_text() {
        let index = LineIndex::from_text("abc\ndef\nghi");
        assert_eq!(
            index.line_to_position_and_text(2),
            LineStart {
                position: 4,
                text: Some("def\n")
            }
        );
        assert_eq!(
            index.line_to_position_and_text(4),
            LineStart {
                position: 11,
                text: None
            }
        );
        assert_eq!(index.absolute_position_of_start_of_line(3), 8);
    }

    #[test]
    fn test_get_text_and_char_at() {
        let index = LineIndex::from_text("你好\nworld\n");
        assert_eq!(index.get_text(1, 4), "好\nwo");
        assert_eq!(index.get_text(6, 100), "ld\n");
        assert_eq!(index.char_at(1), Some('好'));
        assert_eq!(index.char_at(9), None);
    }

    #[test]
    fn test_edit_within_line() {
        let index = LineIndex::from_text("hello world");
        let edited = index.edit_checked(5, 1, ", ").unwrap();
        assert_eq!(edited.text(), "hello, world");
        assert_eq!(edited.line_count(), 1);
        assert_eq!(index.text(), "hello world");
    }

    #[test]
    fn test_delete_whole_line() {
        let index = LineIndex::from_text("line1\nline2\nline3");
        let edited = index.edit_checked(6, 6, "").unwrap();
        assert_eq!(lines(&edited), vec!["line1\n", "line3"]);
    }

    #[test]
    fn test_delete_line_break_merges_lines() {
        let index = LineIndex::from_text("ab\ncd\nef");
        let edited = index.edit_checked(2, 1, "").unwrap();
        assert_eq!(lines(&edited), vec!["abcd\n", "ef"]);
    }

    #[test]
    fn test_append_at_end() {
        let index = LineIndex::from_text("abc");
        let edited = index.edit_checked(3, 0, "\ndef").unwrap();
        assert_eq!(lines(&edited), vec!["abc\n", "def"]);

        let edited = edited.edit_checked(7, 0, "\n").unwrap();
        assert_eq!(lines(&edited), vec!["abc\n", "def\n"]);
        assert_eq!(edited.document_line_count(), 3);
    }

    #[test]
    fn test_append_after_trailing_break() {
        let index = LineIndex::from_text("abc\n");
        let edited = index.edit_checked(4, 0, "x").unwrap();
        assert_eq!(lines(&edited), vec!["abc\n", "x"]);
    }

    #[test]
    fn test_edit_empty_tree() {
        let index = LineIndex::new();
        let edited = index.edit(0, 0, "a\nb").unwrap();
        assert_eq!(lines(&edited), vec!["a\n", "b"]);

        let untouched = index.edit(0, 0, "").unwrap();
        assert!(untouched.is_empty());

        assert!(matches!(
            index.edit(0, 1, ""),
            Err(TextError::InvalidEdit { .. })
        ));
    }

    #[test]
    fn test_delete_everything() {
        let index = LineIndex::from_text("abc\ndef\n");
        let edited = index.edit_checked(0, 8, "").unwrap();
        assert!(edited.is_empty());
        assert_eq!(edited.line_count(), 0);
    }

    #[test]
    fn test_invalid_edit_is_rejected() {
        let index = LineIndex::from_text("abc");
        assert!(matches!(
            index.edit(2, 2, ""),
            Err(TextError::InvalidEdit {
                pos: 2,
                delete_len: 2,
                char_count: 3
            })
        ));
        assert!(index.edit(4, 0, "x").is_err());
    }

    #[test]
    fn test_crlf_pair_is_not_split() {
        let index = LineIndex::from_text("a\rb");
        let edited = index.edit_checked(2, 0, "\n").unwrap();
        assert_eq!(lines(&edited), vec!["a\r\n", "b"]);

        let index = LineIndex::from_text("a\rX\nb");
        let edited = index.edit_checked(2, 1, "").unwrap();
        assert_eq!(lines(&edited), vec!["a\r\n", "b"]);
    }

    #[test]
    fn test_insert_after_lone_cr() {
        let index = LineIndex::from_text("a\rb");
        let edited = index.edit_checked(2, 0, "x").unwrap();
        assert_eq!(lines(&edited), vec!["a\r", "xb"]);
        assert_eq!(edited.line_count(), 2);
        edited.check_invariants().unwrap();

        let index = LineIndex::from_text("a\r\rb\n");
        let edited = index.edit_checked(2, 0, "yz").unwrap();
        assert_eq!(lines(&edited), vec!["a\r", "yz\r", "b\n"]);

        let edited = index.edit_checked(3, 1, "").unwrap();
        assert_eq!(lines(&edited), vec!["a\r", "\r\n"]);
    }

    #[test]
    fn test_large_insert_splits_nodes() {
        let index = LineIndex::from_text("start\nend");
        let paste: String = (0..50).map(|i| format!("{i}\n")).collect();
        let edited = index.edit_checked(6, 0, &paste).unwrap();
        assert_eq!(edited.line_count(), 52);
        assert!(edited.height() >= 3);
        edited.check_invariants().unwrap();
    }

    #[test]
    fn test_edit_shares_untouched_subtrees() {
        let text: String = (0..64).map(|i| format!("{i}\n")).collect();
        let index = LineIndex::from_text(&text);
        let edited = index.edit(0, 1, "X").unwrap();

        let shared = index
            .root
            .children
            .iter()
            .zip(edited.root.children.iter())
            .filter(|(a, b)| Arc::ptr_eq(a, b))
            .count();
        assert_eq!(shared, index.root.children.len() - 1);
    }

    #[test]
    fn test_section_refinement() {
        use CharRangeSection::*;
        assert_eq!(Entire.refine(Mid).unwrap(), Mid);
        assert_eq!(Start.refine(Entire).unwrap(), Start);
        assert_eq!(Start.refine(End).unwrap(), Mid);
        assert_eq!(End.refine(Start).unwrap(), Mid);
        assert_eq!(End.refine(Entire).unwrap(), End);
        assert!(Start.refine(PostEnd).is_err());
        assert!(End.refine(PreStart).is_err());
        assert!(PostEnd.refine(Entire).is_err());
    }
}
