//! Result types the analysis queries hand to their callers.
//!
//! Everything here is plain owned data with `serde` derives so the CLI can
//! print it as JSON and the LSP adapter can translate it without touching
//! arena lifetimes.

use jot_core::{TextRange, TextSpan};
use serde::Serialize;

/// A half-open byte range `[start, end)` in the queried document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanInfo {
    pub start: u32,
    pub end: u32,
}

impl From<TextRange> for SpanInfo {
    fn from(range: TextRange) -> Self {
        Self { start: range.pos, end: range.end }
    }
}

impl From<TextSpan> for SpanInfo {
    fn from(span: TextSpan) -> Self {
        Self { start: span.start, end: span.end() }
    }
}

/// One completion suggestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    /// Rendered type signature, when one is known.
    pub detail: Option<String>,
    pub insert_text: Option<String>,
    pub sort_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionItemKind {
    Variable,
    Constant,
    Function,
    Class,
    Property,
    Method,
    Module,
    Keyword,
}

/// Hover payload: the word's range plus rendered content blocks.
#[derive(Debug, Clone, Serialize)]
pub struct HoverInfo {
    pub range: SpanInfo,
    pub contents: Vec<HoverContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoverContent {
    pub kind: HoverContentKind,
    pub value: String,
}

/// `Code` renders in a fenced block; `Text` as prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HoverContentKind {
    Code,
    Text,
}

impl HoverContent {
    pub fn code(value: impl Into<String>) -> Self {
        Self { kind: HoverContentKind::Code, value: value.into() }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self { kind: HoverContentKind::Text, value: value.into() }
    }
}

/// Declaration site of a resolved symbol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionInfo {
    pub file_name: String,
    pub span: SpanInfo,
}

/// One use (or the declaration) of a resolved symbol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceInfo {
    pub file_name: String,
    pub span: SpanInfo,
    pub is_definition: bool,
}

/// Outline entry for a declaration, with nested children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: DocumentSymbolKind,
    /// Full declaration range.
    pub range: SpanInfo,
    /// Range of just the declared name.
    pub selection_range: SpanInfo,
    pub children: Vec<DocumentSymbol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentSymbolKind {
    Variable,
    Constant,
    Function,
    Class,
    Method,
    Property,
}

/// One token of a line, with absolute byte offsets.
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub kind: String,
    pub text: String,
    pub start: u32,
    pub end: u32,
}
