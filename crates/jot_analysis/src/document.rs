//! One open document and its incremental token cache.

use jot_core::LineIndex;
use jot_lexer::{jot_grammar, Token, TokenCache};

/// An edit notification from the text-model collaborator: the inclusive
/// line range `start_line..=end_line` was replaced and now holds
/// `new_line_count` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    pub start_line: usize,
    pub end_line: usize,
    pub new_line_count: usize,
}

/// A tracked document: current text, a line index for the current
/// revision, and the per-line token cache that survives edits.
///
/// The cache is the only state reused across revisions. Everything
/// downstream (AST, scopes, types) is rebuilt per query from a fresh
/// arena, so a `Document` never holds stale analysis.
#[derive(Debug)]
pub struct Document {
    file_name: String,
    text: String,
    version: i32,
    line_index: LineIndex,
    tokens: TokenCache,
}

impl Document {
    pub fn new(file_name: String, text: String, version: i32) -> Self {
        let line_index = LineIndex::new(&text);
        Self {
            file_name,
            text,
            version,
            line_index,
            tokens: TokenCache::new(jot_grammar()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Replace the whole text. Without an edit notification every cached
    /// line is suspect, so the cache restarts from line zero.
    pub fn set_text(&mut self, text: String, version: i32) {
        self.text = text;
        self.line_index = LineIndex::new(&self.text);
        self.version = version;
        self.tokens.invalidate_from(0);
    }

    /// Replace the text with a line-edit hint. Cache entries after the
    /// edited region keep their text, so re-lexing can stop as soon as
    /// the entry lexical state matches again.
    pub fn edit(&mut self, text: String, edit: LineEdit, version: i32) {
        self.text = text;
        self.line_index = LineIndex::new(&self.text);
        self.version = version;
        self.tokens
            .apply_edit(edit.start_line, edit.end_line, edit.new_line_count);
    }

    /// All tokens of the current revision with absolute offsets, in the
    /// shape the parser consumes.
    pub fn document_tokens(&mut self) -> Vec<Token> {
        self.tokens.ensure(&self.text, &self.line_index);
        self.tokens.document_tokens(&self.line_index)
    }

    /// Tokens of one line, rebased to absolute offsets. Out-of-range
    /// lines yield nothing.
    pub fn line_tokens(&mut self, line: u32) -> Vec<Token> {
        if line >= self.line_index.line_count() {
            return Vec::new();
        }
        self.tokens.ensure(&self.text, &self.line_index);
        let base = self.line_index.line_start(line);
        self.tokens
            .line_tokens(line as usize)
            .iter()
            .map(|token| Token::new(token.kind, base + token.start, base + token.end))
            .collect()
    }

    /// Lines with a current token cache entry. Exposed for tests that
    /// assert on cache reuse.
    pub fn cached_line_count(&self) -> usize {
        self.tokens.valid_line_count()
    }
}
