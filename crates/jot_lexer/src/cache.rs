//! Per-line token cache with incremental invalidation.
//!
//! The cache stores, for every line, the lexical state the line was entered
//! with, its tokens (line-relative offsets, so they survive edits to other
//! lines), and the state it ended with. After an edit, re-tokenization
//! resumes at the first invalid line and stops as soon as the freshly
//! computed entry state matches what a still-clean later line recorded;
//! from there on the cached suffix is known good.

use crate::grammar::{tokenize_line, Grammar, LexState};
use crate::token::Token;
use jot_core::LineIndex;

#[derive(Debug, Clone)]
struct CachedLine {
    start_state: LexState,
    end_state: LexState,
    /// Offsets relative to the line start.
    tokens: Vec<Token>,
    /// The line's text changed since this entry was computed; a state match
    /// cannot prove it current.
    dirty: bool,
}

impl CachedLine {
    fn placeholder() -> Self {
        Self {
            start_state: LexState::root(),
            end_state: LexState::root(),
            tokens: Vec::new(),
            dirty: true,
        }
    }
}

/// Incremental tokenizer over one document, one grammar.
#[derive(Debug)]
pub struct TokenCache {
    grammar: &'static Grammar,
    lines: Vec<CachedLine>,
    /// Lines `0..valid` are current. Everything after may be stale until
    /// the next [`ensure`](Self::ensure).
    valid: usize,
}

impl TokenCache {
    pub fn new(grammar: &'static Grammar) -> Self {
        Self { grammar, lines: Vec::new(), valid: 0 }
    }

    #[inline]
    pub fn grammar(&self) -> &'static Grammar {
        self.grammar
    }

    /// Number of lines with a current cache entry.
    #[inline]
    pub fn valid_line_count(&self) -> usize {
        self.valid
    }

    /// Drop cached results for `line` and everything after it. Used when
    /// the caller cannot say which later lines kept their text.
    pub fn invalidate_from(&mut self, line: usize) {
        for entry in self.lines.iter_mut().skip(line) {
            entry.dirty = true;
        }
        self.valid = self.valid.min(line);
    }

    /// Apply an edit notification: the inclusive line range
    /// `start_line..=end_line` was replaced and now holds `new_line_count`
    /// lines. Lines after the edited region keep their text, so their
    /// entries stay clean and the resume optimization can stop at them.
    pub fn apply_edit(&mut self, start_line: usize, end_line: usize, new_line_count: usize) {
        let start = start_line.min(self.lines.len());
        let end = (end_line + 1).min(self.lines.len()).max(start);
        self.lines
            .splice(start..end, (0..new_line_count).map(|_| CachedLine::placeholder()));
        self.valid = self.valid.min(start);
    }

    /// Bring the cache up to date with `text`. Runs the tokenizer from the
    /// first invalid line, reusing any clean entry whose recorded entry
    /// state equals the freshly computed one.
    pub fn ensure(&mut self, text: &str, index: &LineIndex) {
        let line_count = index.line_count() as usize;
        // A host that skipped an edit notification still converges: excess
        // entries are dropped, missing ones appear dirty.
        if self.lines.len() > line_count {
            self.lines.truncate(line_count);
            self.valid = self.valid.min(line_count);
        }
        while self.lines.len() < line_count {
            self.lines.push(CachedLine::placeholder());
        }

        let mut state = if self.valid == 0 {
            LexState::root()
        } else {
            self.lines[self.valid - 1].end_state.clone()
        };

        for i in self.valid..line_count {
            let entry = &self.lines[i];
            if !entry.dirty && entry.start_state == state {
                // States converged on unchanged text: entry is current.
                state = entry.end_state.clone();
                continue;
            }
            let out = tokenize_line(self.grammar, index.line_text(text, i as u32), &state);
            let end_state = out.end_state;
            self.lines[i] = CachedLine {
                start_state: state,
                end_state: end_state.clone(),
                tokens: out.tokens,
                dirty: false,
            };
            state = end_state;
        }
        self.valid = line_count;
    }

    /// Tokens of `line`, offsets relative to the line start. The cache must
    /// be [`ensure`](Self::ensure)d first.
    pub fn line_tokens(&self, line: usize) -> &[Token] {
        debug_assert!(line < self.valid, "line {} not tokenized", line);
        &self.lines[line].tokens
    }

    /// The lexical state at the end of `line`.
    pub fn end_state(&self, line: usize) -> &LexState {
        debug_assert!(line < self.valid);
        &self.lines[line].end_state
    }

    /// All tokens of the document with absolute byte offsets, trivia
    /// included. This is what the parser consumes.
    pub fn document_tokens(&self, index: &LineIndex) -> Vec<Token> {
        let mut tokens = Vec::new();
        for line in 0..self.valid {
            let base = index.line_start(line as u32);
            tokens.extend(
                self.lines[line]
                    .tokens
                    .iter()
                    .map(|t| Token::new(t.kind, base + t.start, base + t.end)),
            );
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::jot_grammar;
    use crate::token::TokenKind;

    fn fresh(text: &str) -> (TokenCache, LineIndex) {
        let index = LineIndex::new(text);
        let mut cache = TokenCache::new(jot_grammar());
        cache.ensure(text, &index);
        (cache, index)
    }

    #[test]
    fn test_tokenizes_whole_document() {
        let text = "let a = 1;\nlet b = a + 2;\n";
        let (cache, index) = fresh(text);
        assert_eq!(cache.valid_line_count(), 3);
        let all = cache.document_tokens(&index);
        let a = all.iter().find(|t| t.text(text) == "a").unwrap();
        assert_eq!(a.kind, TokenKind::Identifier);
        assert_eq!(a.start, 4);
    }

    #[test]
    fn test_edit_resumes_until_state_stabilizes() {
        let text = "let a = 1;\nlet b = 2;\nlet c = 3;\nlet d = 4;";
        let (mut cache, _) = fresh(text);
        let untouched = cache.lines[3].tokens.as_ptr();

        // Replace line 1 with text of the same shape.
        let edited = "let a = 1;\nlet bb = 2;\nlet c = 3;\nlet d = 4;";
        cache.apply_edit(1, 1, 1);
        cache.ensure(edited, &LineIndex::new(edited));

        assert_eq!(cache.valid_line_count(), 4);
        // Line 3 still holds the very same token buffer: the resume stopped
        // once the state matched at line 2.
        assert_eq!(cache.lines[3].tokens.as_ptr(), untouched);
        assert_eq!(cache.lines[1].tokens[2].text("let bb = 2;"), "bb");
    }

    #[test]
    fn test_edit_that_changes_state_retokenizes_downstream() {
        let text = "let a = 1;\nlet b = 2;\nlet c = 3;";
        let (mut cache, _) = fresh(text);
        let before = cache.lines[2].tokens.clone();

        // Opening a block comment on line 0 drags lines 1 and 2 into it.
        let edited = "let a = 1; /*\nlet b = 2;\nlet c = 3;";
        cache.apply_edit(0, 0, 1);
        cache.ensure(edited, &LineIndex::new(edited));

        assert_ne!(cache.lines[2].tokens, before);
        assert!(cache.lines[2].tokens.iter().all(|t| t.kind == TokenKind::BlockComment));
    }

    #[test]
    fn test_invalidate_from_discards_suffix() {
        let text = "let a = 1;\nlet b = 2;";
        let (mut cache, index) = fresh(text);
        cache.invalidate_from(1);
        assert_eq!(cache.valid_line_count(), 1);
        cache.ensure(text, &index);
        assert_eq!(cache.valid_line_count(), 2);
        assert_eq!(cache.line_tokens(1)[0].kind, TokenKind::LetKeyword);
    }

    #[test]
    fn test_insert_and_delete_lines() {
        let text = "let a = 1;\nlet z = 9;";
        let (mut cache, _) = fresh(text);

        // Typing a new line at the start of line 1 turns that one line
        // into two.
        let grown = "let a = 1;\nlet m = 5;\nlet z = 9;";
        cache.apply_edit(1, 1, 2);
        cache.ensure(grown, &LineIndex::new(grown));
        assert_eq!(cache.valid_line_count(), 3);
        assert_eq!(cache.line_tokens(1)[2].text("let m = 5;"), "m");

        // Deleting the middle line merges the region back to one line.
        let shrunk = "let a = 1;\nlet z = 9;";
        cache.apply_edit(1, 2, 1);
        cache.ensure(shrunk, &LineIndex::new(shrunk));
        assert_eq!(cache.valid_line_count(), 2);
        assert_eq!(cache.line_tokens(1)[2].text("let z = 9;"), "z");
    }

    #[test]
    fn test_ensure_recovers_from_missed_notifications() {
        let text = "let a = 1;";
        let (mut cache, _) = fresh(text);
        // The document changed shape entirely and nobody told the cache.
        let replaced = "class A {\n}\n";
        cache.invalidate_from(0);
        cache.ensure(replaced, &LineIndex::new(replaced));
        assert_eq!(cache.valid_line_count(), 3);
        assert_eq!(cache.line_tokens(0)[0].kind, TokenKind::ClassKeyword);
    }
}
