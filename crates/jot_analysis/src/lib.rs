//! jot_analysis: The analysis session over open documents.
//!
//! Ties the pipeline crates together behind an editor-shaped surface:
//! completions, hover, definition, references, outline, diagnostics, and
//! line tokens, all addressed by byte offset. Documents keep their text
//! and an incrementally maintained token cache between queries; every
//! answer re-parses and re-binds from a fresh arena, so a query can never
//! observe a stale tree. Queries fail soft the way the pipeline does: an
//! unknown document or an untypeable cursor yields an empty answer, not
//! an error.

mod cursor;
mod document;
mod host;
mod output;

pub use cursor::{context_at, member_receiver_end, word_at, CursorContext};
pub use document::{Document, LineEdit};
pub use host::AnalysisHost;
pub use output::{
    CompletionItem, CompletionItemKind, DefinitionInfo, DocumentSymbol, DocumentSymbolKind,
    HoverContent, HoverContentKind, HoverInfo, ReferenceInfo, SpanInfo, TokenInfo,
};
