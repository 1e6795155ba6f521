//! jot_core: Shared primitives for the jot analysis engine.
//!
//! Provides text spans and ranges, the line index used for offset/position
//! conversion and line-based incremental tokenization, and string interning.

pub mod intern;
pub mod text;

// Re-export commonly used types
pub use intern::{InternedString, StringInterner};
pub use text::{LineAndColumn, LineIndex, TextRange, TextSpan};
