//! jot_parser: Recursive descent parser for Jot.
//!
//! Parses token streams from the lexer into an arena-allocated AST and
//! collects lexical and syntax diagnostics along the way.

mod parser;
mod precedence;

pub use parser::{ParseOutput, Parser};
