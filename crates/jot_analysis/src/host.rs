//! The analysis host: tracked documents plus every cursor query.
//!
//! Each query runs the full pipeline against the document's current text:
//! cached tokens feed the parser, the parsed tree feeds scope binding, and
//! an inference engine answers type questions on top. The arena, tree,
//! scopes, and engine are all request-local; only the text and the token
//! cache persist between queries, so answers can never be stale.

use jot_ast::node::{ClassMember, Expression, SourceFile, Statement};
use jot_ast::types::DeclarationForm;
use jot_ast::AstArena;
use jot_diagnostics::Diagnostic;
use jot_infer::InferenceEngine;
use jot_lexer::{TokenKind, JOT_KEYWORDS};
use jot_parser::Parser;
use jot_scopes::{ScopeBuilder, ScopeTree, Symbol, SymbolKind};
use jot_types::{TypeId, TypeKind, TypeTable};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cursor;
use crate::document::{Document, LineEdit};
use crate::output::{
    CompletionItem, CompletionItemKind, DefinitionInfo, DocumentSymbol, DocumentSymbolKind,
    HoverContent, HoverInfo, ReferenceInfo, SpanInfo, TokenInfo,
};

/// Tracks open documents and answers IDE queries against them.
pub struct AnalysisHost {
    documents: FxHashMap<String, Document>,
}

impl AnalysisHost {
    pub fn new() -> Self {
        Self { documents: FxHashMap::default() }
    }

    // ========================================================================
    // Document lifecycle
    // ========================================================================

    /// Open or replace a document.
    pub fn open_document(&mut self, uri: String, text: String, version: i32) {
        let document = Document::new(uri.clone(), text, version);
        self.documents.insert(uri, document);
    }

    /// Replace a document's text wholesale. Unknown documents are ignored.
    pub fn update_document(&mut self, uri: &str, text: String, version: i32) {
        if let Some(document) = self.documents.get_mut(uri) {
            document.set_text(text, version);
        }
    }

    /// Replace a document's text with a line-edit hint, letting the token
    /// cache keep everything outside the edited line range.
    pub fn edit_document(&mut self, uri: &str, text: String, edit: LineEdit, version: i32) {
        if let Some(document) = self.documents.get_mut(uri) {
            document.edit(text, edit, version);
        }
    }

    pub fn close_document(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    pub fn document_text(&self, uri: &str) -> Option<&str> {
        self.documents.get(uri).map(|document| document.text())
    }

    pub fn document(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Parse and binding diagnostics for one document, sorted and deduped.
    pub fn diagnostics(&mut self, uri: &str) -> Vec<Diagnostic> {
        let document = match self.documents.get_mut(uri) {
            Some(document) => document,
            None => return Vec::new(),
        };
        let raw = document.document_tokens();
        let arena = AstArena::new();
        let parsed =
            Parser::with_tokens(&arena, document.file_name(), document.text(), &raw).parse();
        let bound = ScopeBuilder::bind(&parsed.source_file);
        let mut all = parsed.diagnostics;
        all.extend(bound.diagnostics);
        all.sort_and_dedupe();
        all.into_diagnostics()
    }

    /// Completion items at `offset`. A `prefix` of `None` means "derive it
    /// from the text left of the cursor".
    ///
    /// After a `.` the receiver expression is typed in context and its
    /// members (own first, then builtin prototype) are offered. Everywhere
    /// else the visible scope symbols come first in declaration order with
    /// inner scopes beating outer ones, then ambient globals, then
    /// keywords. The prefix filter is case-insensitive throughout.
    pub fn completions_at(
        &mut self,
        uri: &str,
        offset: u32,
        prefix: Option<&str>,
    ) -> Vec<CompletionItem> {
        let document = match self.documents.get_mut(uri) {
            Some(document) => document,
            None => return Vec::new(),
        };
        let raw = document.document_tokens();
        let arena = AstArena::new();
        let parsed =
            Parser::with_tokens(&arena, document.file_name(), document.text(), &raw).parse();
        let bound = ScopeBuilder::bind(&parsed.source_file);
        let mut engine = InferenceEngine::new(&bound.scope_tree);

        let text = document.text();
        let (prefix, prefix_start) = match prefix {
            Some(prefix) => (prefix.to_string(), offset.saturating_sub(prefix.len() as u32)),
            None => typed_prefix(text, offset),
        };

        if let Some(receiver_end) = cursor::member_receiver_end(text, prefix_start) {
            return member_completions(&parsed.source_file, &mut engine, receiver_end, &prefix);
        }
        scope_completions(&bound.scope_tree, &mut engine, offset, &prefix)
    }

    /// Hover content for the word at `offset`: a rendered type signature
    /// for identifiers, members, `this`, and `super`, and a keyword note
    /// for keywords.
    pub fn hover_at(&mut self, uri: &str, offset: u32) -> Option<HoverInfo> {
        let document = self.documents.get_mut(uri)?;
        let raw = document.document_tokens();
        let arena = AstArena::new();
        let parsed =
            Parser::with_tokens(&arena, document.file_name(), document.text(), &raw).parse();
        let bound = ScopeBuilder::bind(&parsed.source_file);
        let mut engine = InferenceEngine::new(&bound.scope_tree);

        let text = document.text();
        let (word_start, word_end) = cursor::word_at(text, offset)?;
        let word = &text[word_start as usize..word_end as usize];
        let range = SpanInfo { start: word_start, end: word_end };
        let context = cursor::context_at(&parsed.source_file, word_start);

        if let Some(target) = context.target {
            match target {
                // A member name: type the whole access in context.
                Expression::Member(member)
                    if member.name.data.range.contains_inclusive(offset) =>
                {
                    let member_type = engine.infer_in_context(&context.path, target);
                    let value = format!(
                        "(member) {}: {}",
                        member.name.text,
                        engine.types.display(member_type)
                    );
                    return Some(HoverInfo { range, contents: vec![HoverContent::code(value)] });
                }
                Expression::Identifier(identifier) => {
                    if let Some(symbol_id) = bound.scope_tree.symbol_at(word_start) {
                        let symbol_type = engine.symbol_type(symbol_id);
                        let symbol = bound.scope_tree.symbol(symbol_id);
                        let value = symbol_hover(symbol, &engine.types, symbol_type);
                        return Some(HoverInfo {
                            range,
                            contents: vec![HoverContent::code(value)],
                        });
                    }
                    if let Some(global) = engine.registry().global_type(identifier.text) {
                        let value = format!(
                            "(global) {}: {}",
                            identifier.text,
                            engine.types.display(global)
                        );
                        return Some(HoverInfo {
                            range,
                            contents: vec![HoverContent::code(value)],
                        });
                    }
                    // Unresolved names still answer; inference treats them
                    // as `any` and hover says so.
                    let value = format!("(identifier) {}: any", identifier.text);
                    return Some(HoverInfo { range, contents: vec![HoverContent::code(value)] });
                }
                Expression::This(_) | Expression::Super(_) => {
                    let self_type = engine.infer_in_context(&context.path, target);
                    let value = format!("{}: {}", word, engine.types.display(self_type));
                    return Some(HoverInfo { range, contents: vec![HoverContent::code(value)] });
                }
                _ => {}
            }
        }

        // Declaration names (`let port`, `function f`, `class C`, loop and
        // catch bindings) are name fields, not expressions; resolve them
        // through the symbol table directly.
        if let Some(symbol_id) = bound.scope_tree.symbol_at(word_start) {
            let symbol_type = engine.symbol_type(symbol_id);
            let symbol = bound.scope_tree.symbol(symbol_id);
            let value = symbol_hover(symbol, &engine.types, symbol_type);
            return Some(HoverInfo { range, contents: vec![HoverContent::code(value)] });
        }

        if TokenKind::from_keyword(word).is_some() {
            let value = format!("(keyword) {}", word);
            return Some(HoverInfo { range, contents: vec![HoverContent::code(value)] });
        }
        None
    }

    /// The declaration name range of the symbol under `offset`, whether
    /// the cursor is on the declaration itself or on a reference.
    pub fn definition_at(&mut self, uri: &str, offset: u32) -> Option<DefinitionInfo> {
        let document = self.documents.get_mut(uri)?;
        let raw = document.document_tokens();
        let arena = AstArena::new();
        let parsed =
            Parser::with_tokens(&arena, document.file_name(), document.text(), &raw).parse();
        let bound = ScopeBuilder::bind(&parsed.source_file);
        let symbol_id = bound.scope_tree.symbol_at(offset)?;
        let symbol = bound.scope_tree.symbol(symbol_id);
        Some(DefinitionInfo {
            file_name: document.file_name().to_string(),
            span: symbol.name_range.into(),
        })
    }

    /// Every recorded reference to the symbol under `offset`, in binding
    /// order, optionally preceded by the declaration itself.
    pub fn references_at(
        &mut self,
        uri: &str,
        offset: u32,
        include_declaration: bool,
    ) -> Vec<ReferenceInfo> {
        let document = match self.documents.get_mut(uri) {
            Some(document) => document,
            None => return Vec::new(),
        };
        let raw = document.document_tokens();
        let arena = AstArena::new();
        let parsed =
            Parser::with_tokens(&arena, document.file_name(), document.text(), &raw).parse();
        let bound = ScopeBuilder::bind(&parsed.source_file);
        let symbol_id = match bound.scope_tree.symbol_at(offset) {
            Some(symbol_id) => symbol_id,
            None => return Vec::new(),
        };
        let symbol = bound.scope_tree.symbol(symbol_id);
        let file_name = document.file_name();
        let mut references = Vec::new();
        if include_declaration {
            references.push(ReferenceInfo {
                file_name: file_name.to_string(),
                span: symbol.name_range.into(),
                is_definition: true,
            });
        }
        for reference in &symbol.references {
            references.push(ReferenceInfo {
                file_name: file_name.to_string(),
                span: (*reference).into(),
                is_definition: false,
            });
        }
        references
    }

    /// Outline of the document: classes with their members, functions
    /// with their nested declarations, and top-level bindings.
    pub fn document_symbols(&mut self, uri: &str) -> Vec<DocumentSymbol> {
        let document = match self.documents.get_mut(uri) {
            Some(document) => document,
            None => return Vec::new(),
        };
        let raw = document.document_tokens();
        let arena = AstArena::new();
        let parsed =
            Parser::with_tokens(&arena, document.file_name(), document.text(), &raw).parse();
        statement_symbols(parsed.source_file.statements)
    }

    /// Tokens of one line with kinds, source text, and absolute offsets.
    pub fn tokens_for_line(&mut self, uri: &str, line: u32) -> Vec<TokenInfo> {
        let document = match self.documents.get_mut(uri) {
            Some(document) => document,
            None => return Vec::new(),
        };
        let tokens = document.line_tokens(line);
        let text = document.text();
        tokens
            .into_iter()
            .map(|token| TokenInfo {
                kind: format!("{:?}", token.kind),
                text: text[token.start as usize..token.end as usize].to_string(),
                start: token.start,
                end: token.end,
            })
            .collect()
    }

    /// Every token of the document, trivia included.
    pub fn tokens(&mut self, uri: &str) -> Vec<TokenInfo> {
        let document = match self.documents.get_mut(uri) {
            Some(document) => document,
            None => return Vec::new(),
        };
        let tokens = document.document_tokens();
        let text = document.text();
        tokens
            .into_iter()
            .map(|token| TokenInfo {
                kind: format!("{:?}", token.kind),
                text: text[token.start as usize..token.end as usize].to_string(),
                start: token.start,
                end: token.end,
            })
            .collect()
    }
}

impl Default for AnalysisHost {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Completion helpers
// ============================================================================

/// The word fragment the user has typed left of the cursor, plus where it
/// starts. Empty when the cursor does not touch a word from the right.
fn typed_prefix(text: &str, offset: u32) -> (String, u32) {
    let mut anchor = (offset as usize).min(text.len());
    while anchor > 0 && !text.is_char_boundary(anchor) {
        anchor -= 1;
    }
    match cursor::word_at(text, anchor as u32) {
        Some((start, _)) if (start as usize) <= anchor => {
            (text[start as usize..anchor].to_string(), start)
        }
        _ => (String::new(), anchor as u32),
    }
}

fn member_completions<'a>(
    source_file: &SourceFile<'a>,
    engine: &mut InferenceEngine<'a>,
    receiver_end: u32,
    prefix: &str,
) -> Vec<CompletionItem> {
    let context = cursor::context_at(source_file, receiver_end.saturating_sub(1));
    let (depth, receiver) = match context.expression_ending_at(receiver_end) {
        Some(found) => found,
        None => return Vec::new(),
    };
    let receiver_type = engine.infer_in_context(&context.path[..depth], receiver);
    let mut items = Vec::new();
    for name in engine.member_names(receiver_type) {
        if !starts_with_ignore_case(&name, prefix) {
            continue;
        }
        let (kind, detail) = match engine.member_type(receiver_type, &name) {
            Some(member) => {
                let kind = if matches!(engine.types.kind(member), TypeKind::Function(_)) {
                    CompletionItemKind::Method
                } else {
                    CompletionItemKind::Property
                };
                (kind, Some(engine.types.display(member)))
            }
            None => (CompletionItemKind::Property, None),
        };
        let sort_text = Some(format!("0_{}", name));
        items.push(CompletionItem { label: name, kind, detail, insert_text: None, sort_text });
    }
    items
}

fn scope_completions<'a>(
    tree: &'a ScopeTree<'a>,
    engine: &mut InferenceEngine<'a>,
    offset: u32,
    prefix: &str,
) -> Vec<CompletionItem> {
    let scope = tree.scope_at(offset);
    let mut items = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();

    for symbol_id in tree.symbols_with_prefix(scope, prefix) {
        let symbol_type = engine.symbol_type(symbol_id);
        let symbol = tree.symbol(symbol_id);
        seen.insert(symbol.name);
        let kind = match symbol.kind {
            SymbolKind::Variable | SymbolKind::Parameter => CompletionItemKind::Variable,
            SymbolKind::Constant => CompletionItemKind::Constant,
            SymbolKind::Function => CompletionItemKind::Function,
            SymbolKind::Class => CompletionItemKind::Class,
            SymbolKind::Import => CompletionItemKind::Module,
        };
        items.push(CompletionItem {
            label: symbol.name.to_string(),
            kind,
            detail: Some(engine.types.display(symbol_type)),
            insert_text: None,
            sort_text: Some(format!("0_{}", symbol.name)),
        });
    }

    // Ambient globals, unless a scope symbol shadows the name.
    for name in engine.registry().global_names() {
        if !starts_with_ignore_case(name, prefix) || seen.contains(name) {
            continue;
        }
        let global = match engine.registry().global_type(name) {
            Some(global) => global,
            None => continue,
        };
        let kind = match engine.types.kind(global) {
            TypeKind::Function(_) => CompletionItemKind::Function,
            TypeKind::Class(_) => CompletionItemKind::Class,
            _ => CompletionItemKind::Variable,
        };
        items.push(CompletionItem {
            label: name.to_string(),
            kind,
            detail: Some(engine.types.display(global)),
            insert_text: None,
            sort_text: Some(format!("0_{}", name)),
        });
    }

    for keyword in JOT_KEYWORDS {
        if !starts_with_ignore_case(keyword, prefix) {
            continue;
        }
        items.push(CompletionItem {
            label: (*keyword).to_string(),
            kind: CompletionItemKind::Keyword,
            detail: Some("keyword".to_string()),
            insert_text: None,
            sort_text: Some(format!("1_{}", keyword)),
        });
    }
    items
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    name.len() >= prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
}

// ============================================================================
// Hover rendering
// ============================================================================

fn symbol_hover(symbol: &Symbol<'_>, types: &TypeTable, symbol_type: TypeId) -> String {
    let rendered = types.display(symbol_type);
    match symbol.kind {
        SymbolKind::Variable => format!("(variable) {}: {}", symbol.name, rendered),
        SymbolKind::Constant => format!("(constant) {}: {}", symbol.name, rendered),
        SymbolKind::Parameter => format!("(parameter) {}: {}", symbol.name, rendered),
        SymbolKind::Function => format!("(function) {}: {}", symbol.name, rendered),
        // The class display already carries the name and heritage.
        SymbolKind::Class => rendered,
        SymbolKind::Import => format!("(import) {}: {}", symbol.name, rendered),
    }
}

// ============================================================================
// Document outline
// ============================================================================

fn statement_symbols(statements: &[Statement<'_>]) -> Vec<DocumentSymbol> {
    let mut out = Vec::new();
    for statement in statements {
        match statement {
            Statement::Variable(node) => {
                let kind = if node.form == DeclarationForm::Const {
                    DocumentSymbolKind::Constant
                } else {
                    DocumentSymbolKind::Variable
                };
                for declarator in node.declarations.iter() {
                    out.push(DocumentSymbol {
                        name: declarator.name.text.to_string(),
                        kind,
                        range: declarator.data.range.into(),
                        selection_range: declarator.name.data.range.into(),
                        children: Vec::new(),
                    });
                }
            }
            Statement::Function(node) => {
                out.push(DocumentSymbol {
                    name: node.name.text.to_string(),
                    kind: DocumentSymbolKind::Function,
                    range: node.data.range.into(),
                    selection_range: node.name.data.range.into(),
                    children: statement_symbols(node.body.statements),
                });
            }
            Statement::Class(node) => {
                out.push(DocumentSymbol {
                    name: node.name.text.to_string(),
                    kind: DocumentSymbolKind::Class,
                    range: node.data.range.into(),
                    selection_range: node.name.data.range.into(),
                    children: member_symbols(node.members),
                });
            }
            _ => {}
        }
    }
    out
}

fn member_symbols(members: &[ClassMember<'_>]) -> Vec<DocumentSymbol> {
    members
        .iter()
        .map(|member| match member {
            ClassMember::Constructor(node) => DocumentSymbol {
                name: "constructor".to_string(),
                kind: DocumentSymbolKind::Method,
                range: node.data.range.into(),
                selection_range: node.data.range.into(),
                children: statement_symbols(node.body.statements),
            },
            ClassMember::Method(node) => DocumentSymbol {
                name: node.name.text.to_string(),
                kind: DocumentSymbolKind::Method,
                range: node.data.range.into(),
                selection_range: node.name.data.range.into(),
                children: statement_symbols(node.body.statements),
            },
            ClassMember::Field(node) => DocumentSymbol {
                name: node.name.text.to_string(),
                kind: DocumentSymbolKind::Property,
                range: node.data.range.into(),
                selection_range: node.name.data.range.into(),
                children: Vec::new(),
            },
        })
        .collect()
}
