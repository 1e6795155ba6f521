//! Text spans, ranges, and the line index.
//!
//! All offsets throughout the engine are byte offsets into the document
//! text, stored as `u32`. The `LineIndex` maps between offsets and
//! line/column positions and hands out per-line slices for the tokenizer.

use memchr::memchr_iter;

/// A half-open span of text identified by start offset and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextSpan {
    pub start: u32,
    pub length: u32,
}

impl TextSpan {
    #[inline]
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Create a span from start and end offsets.
    #[inline]
    pub fn from_bounds(start: u32, end: u32) -> Self {
        debug_assert!(end >= start);
        Self { start, length: end - start }
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `offset` falls inside this span (end exclusive).
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Whether the two spans share at least one offset.
    pub fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// A half-open range of text identified by start and end offsets.
///
/// Same information as [`TextSpan`], in the shape AST nodes carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub pos: u32,
    pub end: u32,
}

impl TextRange {
    #[inline]
    pub fn new(pos: u32, end: u32) -> Self {
        debug_assert!(end >= pos);
        Self { pos, end }
    }

    /// An empty range anchored at `pos`.
    #[inline]
    pub fn empty(pos: u32) -> Self {
        Self { pos, end: pos }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    /// Whether `offset` falls inside this range (end exclusive).
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.pos && offset < self.end
    }

    /// Like [`contains`](Self::contains) but treats the end offset as
    /// inside, which is what cursor queries at the end of a word need.
    #[inline]
    pub fn contains_inclusive(&self, offset: u32) -> bool {
        offset >= self.pos && offset <= self.end
    }

    /// Whether `other` lies entirely within this range.
    pub fn contains_range(&self, other: TextRange) -> bool {
        other.pos >= self.pos && other.end <= self.end
    }

    /// The smallest range covering both.
    pub fn cover(&self, other: TextRange) -> TextRange {
        TextRange::new(self.pos.min(other.pos), self.end.max(other.end))
    }

    pub fn to_span(&self) -> TextSpan {
        TextSpan::from_bounds(self.pos, self.end)
    }
}

/// A zero-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAndColumn {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets to lines and back.
///
/// Line starts are computed once per document revision with a fast newline
/// scan; every query is a binary search or slice index after that. Lines
/// are split on `\n`; a trailing `\r` is left inside the line slice and
/// stripped by [`line_text`](Self::line_text) callers that care.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the first character of each line. Always non-empty;
    /// `line_starts[0] == 0`.
    line_starts: Vec<u32>,
    /// Total length of the indexed text in bytes.
    len: u32,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = Vec::with_capacity(16);
        line_starts.push(0);
        for nl in memchr_iter(b'\n', text.as_bytes()) {
            line_starts.push(nl as u32 + 1);
        }
        Self { line_starts, len: text.len() as u32 }
    }

    /// Number of lines. A document always has at least one line; a trailing
    /// newline starts a final empty line.
    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn text_len(&self) -> u32 {
        self.len
    }

    /// The line containing `offset`. Offsets past the end map to the last
    /// line.
    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line as u32,
            Err(next) => next as u32 - 1,
        }
    }

    /// Byte offset at which `line` starts.
    pub fn line_start(&self, line: u32) -> u32 {
        self.line_starts[line as usize]
    }

    /// Byte offset one past the last character of `line`, excluding the
    /// terminating newline.
    pub fn line_end(&self, line: u32) -> u32 {
        match self.line_starts.get(line as usize + 1) {
            Some(&next_start) => next_start - 1,
            None => self.len,
        }
    }

    /// The range of `line`, newline excluded.
    pub fn line_range(&self, line: u32) -> TextRange {
        TextRange::new(self.line_start(line), self.line_end(line))
    }

    /// Slice `text` down to `line`, newline excluded.
    pub fn line_text<'t>(&self, text: &'t str, line: u32) -> &'t str {
        let range = self.line_range(line);
        &text[range.pos as usize..range.end as usize]
    }

    /// Convert an offset to a line/column position. The column is a byte
    /// column within the line.
    pub fn position_of(&self, offset: u32) -> LineAndColumn {
        let line = self.line_of(offset.min(self.len));
        LineAndColumn { line, column: offset.min(self.len) - self.line_start(line) }
    }

    /// Convert a line/column position back to an offset, clamping the
    /// column to the line length.
    pub fn offset_of(&self, position: LineAndColumn) -> u32 {
        let line = position.line.min(self.line_count() - 1);
        let start = self.line_start(line);
        let end = self.line_end(line);
        (start + position.column).min(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains() {
        let span = TextSpan::new(5, 3);
        assert!(!span.contains(4));
        assert!(span.contains(5));
        assert!(span.contains(7));
        assert!(!span.contains(8));
    }

    #[test]
    fn test_range_cover() {
        let a = TextRange::new(2, 5);
        let b = TextRange::new(4, 9);
        assert_eq!(a.cover(b), TextRange::new(2, 9));
    }

    #[test]
    fn test_line_index_basic() {
        let index = LineIndex::new("let a = 1;\nlet b = 2;\n");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_start(0), 0);
        assert_eq!(index.line_start(1), 11);
        assert_eq!(index.line_end(0), 10);
        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_of(10), 0);
        assert_eq!(index.line_of(11), 1);
    }

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.position_of(4), LineAndColumn { line: 1, column: 1 });
        assert_eq!(index.offset_of(LineAndColumn { line: 1, column: 1 }), 4);
        // Column past the line end clamps.
        assert_eq!(index.offset_of(LineAndColumn { line: 0, column: 99 }), 2);
    }

    #[test]
    fn test_line_text() {
        let text = "first\nsecond\r\nthird";
        let index = LineIndex::new(text);
        assert_eq!(index.line_text(text, 0), "first");
        assert_eq!(index.line_text(text, 1), "second\r");
        assert_eq!(index.line_text(text, 2), "third");
    }

    #[test]
    fn test_empty_document() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_end(0), 0);
    }
}
