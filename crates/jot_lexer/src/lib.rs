//! jot_lexer: Incremental table-driven tokenizer.
//!
//! Tokenization is line-oriented: [`tokenize_line`] turns one line of text
//! plus the carry-over [`LexState`] into tokens and the next line's state.
//! Grammars are data ([`Grammar`]), with tables shipped for Jot, a markup
//! dialect, and a stylesheet dialect. [`TokenCache`] layers the per-line
//! results into an incrementally invalidated document view.

pub mod cache;
pub mod grammar;
pub mod languages;
pub mod token;

// Re-export commonly used types
pub use cache::TokenCache;
pub use grammar::{
    tokenize_line, Grammar, GrammarBuilder, LexState, LineTokens, Rule, StateDef, StateId,
    TokenAction, Transition,
};
pub use languages::{grammar_for_path, jot_grammar, markup_grammar, stylesheet_grammar};
pub use token::{Token, TokenKind, JOT_KEYWORDS};
