//! jot_lsp: Language Server Protocol adapter.
//!
//! A thin tower-lsp shim over the analysis host: documents sync in full,
//! diagnostics publish on open/change/save, and the cursor queries answer
//! completion, hover, definition, references, and the document outline.
//! Position math goes through each document's line index; the protocol
//! layer never re-counts lines itself.

#![allow(clippy::needless_update)]

use jot_analysis::{AnalysisHost, HoverContentKind, SpanInfo};
use jot_core::{LineAndColumn, LineIndex};
use std::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

/// The LSP backend.
pub struct JotLspServer {
    client: Client,
    host: Mutex<AnalysisHost>,
}

impl JotLspServer {
    pub fn new(client: Client) -> Self {
        Self { client, host: Mutex::new(AnalysisHost::new()) }
    }

    fn uri_to_key(uri: &Url) -> String {
        uri.to_string()
    }

    async fn publish_diagnostics(&self, uri: Url) {
        let (diagnostics, version) = {
            let mut host = self.host.lock().unwrap();
            let key = Self::uri_to_key(&uri);
            let raw = host.diagnostics(&key);
            match host.document(&key) {
                Some(document) => {
                    let index = document.line_index();
                    let version = Some(document.version());
                    let list = raw
                        .into_iter()
                        .map(|diagnostic| {
                            let range = match diagnostic.span {
                                Some(span) => index_range(
                                    index,
                                    SpanInfo { start: span.start, end: span.end() },
                                ),
                                None => Range::default(),
                            };
                            Diagnostic {
                                range,
                                severity: Some(if diagnostic.is_error() {
                                    DiagnosticSeverity::ERROR
                                } else {
                                    DiagnosticSeverity::WARNING
                                }),
                                code: Some(NumberOrString::Number(diagnostic.code as i32)),
                                source: Some("jot".to_string()),
                                message: diagnostic.message_text,
                                ..Default::default()
                            }
                        })
                        .collect();
                    (list, version)
                }
                None => (Vec::new(), None),
            }
        };

        self.client.publish_diagnostics(uri, diagnostics, version).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for JotLspServer {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..Default::default()
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "jot".to_string(),
                version: Some("0.1.0".to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "jot language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let key = Self::uri_to_key(&uri);
        {
            let mut host = self.host.lock().unwrap();
            host.open_document(key, params.text_document.text, params.text_document.version);
        }
        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let key = Self::uri_to_key(&uri);
        {
            let mut host = self.host.lock().unwrap();
            // Full sync: the last change carries the whole document.
            if let Some(change) = params.content_changes.into_iter().last() {
                host.update_document(&key, change.text, params.text_document.version);
            }
        }
        self.publish_diagnostics(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let key = Self::uri_to_key(&params.text_document.uri);
        let mut host = self.host.lock().unwrap();
        host.close_document(&key);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.publish_diagnostics(params.text_document.uri).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let key = Self::uri_to_key(&uri);

        let items = {
            let mut host = self.host.lock().unwrap();
            let offset = match document_offset(&host, &key, position) {
                Some(offset) => offset,
                None => return Ok(None),
            };
            host.completions_at(&key, offset, None)
        };

        let lsp_items: Vec<CompletionItem> = items
            .into_iter()
            .map(|item| CompletionItem {
                label: item.label,
                kind: Some(to_lsp_completion_kind(item.kind)),
                detail: item.detail,
                insert_text: item.insert_text,
                sort_text: item.sort_text,
                ..Default::default()
            })
            .collect();

        Ok(Some(CompletionResponse::Array(lsp_items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let key = Self::uri_to_key(&uri);

        let hover = {
            let mut host = self.host.lock().unwrap();
            let offset = match document_offset(&host, &key, position) {
                Some(offset) => offset,
                None => return Ok(None),
            };
            host.hover_at(&key, offset).map(|info| {
                let range = span_range(&host, &key, info.range);
                let value = info
                    .contents
                    .into_iter()
                    .map(|content| match content.kind {
                        HoverContentKind::Code => format!("```jot\n{}\n```", content.value),
                        HoverContentKind::Text => content.value,
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Hover {
                    contents: HoverContents::Markup(MarkupContent {
                        kind: MarkupKind::Markdown,
                        value,
                    }),
                    range: Some(range),
                }
            })
        };

        Ok(hover)
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let key = Self::uri_to_key(&uri);

        let location = {
            let mut host = self.host.lock().unwrap();
            let offset = match document_offset(&host, &key, position) {
                Some(offset) => offset,
                None => return Ok(None),
            };
            host.definition_at(&key, offset).map(|definition| Location {
                uri: Url::parse(&definition.file_name).unwrap_or_else(|_| uri.clone()),
                range: span_range(&host, &key, definition.span),
            })
        };

        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        let key = Self::uri_to_key(&uri);

        let locations = {
            let mut host = self.host.lock().unwrap();
            let offset = match document_offset(&host, &key, position) {
                Some(offset) => offset,
                None => return Ok(None),
            };
            host.references_at(&key, offset, include_declaration)
                .into_iter()
                .map(|reference| Location {
                    uri: Url::parse(&reference.file_name).unwrap_or_else(|_| uri.clone()),
                    range: span_range(&host, &key, reference.span),
                })
                .collect::<Vec<_>>()
        };

        Ok(Some(locations))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let key = Self::uri_to_key(&params.text_document.uri);

        let symbols = {
            let mut host = self.host.lock().unwrap();
            let symbols = host.document_symbols(&key);
            match host.document(&key) {
                Some(document) => {
                    let index = document.line_index();
                    symbols
                        .into_iter()
                        .map(|symbol| outline_symbol(index, symbol))
                        .collect::<Vec<_>>()
                }
                None => Vec::new(),
            }
        };

        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

fn document_offset(host: &AnalysisHost, key: &str, position: Position) -> Option<u32> {
    let index = host.document(key)?.line_index();
    Some(index.offset_of(LineAndColumn { line: position.line, column: position.character }))
}

fn span_range(host: &AnalysisHost, key: &str, span: SpanInfo) -> Range {
    match host.document(key) {
        Some(document) => index_range(document.line_index(), span),
        None => Range::default(),
    }
}

fn index_range(index: &LineIndex, span: SpanInfo) -> Range {
    Range::new(
        lsp_position(index.position_of(span.start)),
        lsp_position(index.position_of(span.end)),
    )
}

fn lsp_position(position: LineAndColumn) -> Position {
    Position::new(position.line, position.column)
}

#[allow(deprecated)]
fn outline_symbol(index: &LineIndex, symbol: jot_analysis::DocumentSymbol) -> DocumentSymbol {
    let children = if symbol.children.is_empty() {
        None
    } else {
        Some(symbol.children.into_iter().map(|child| outline_symbol(index, child)).collect())
    };
    DocumentSymbol {
        name: symbol.name,
        detail: None,
        kind: to_lsp_symbol_kind(symbol.kind),
        tags: None,
        deprecated: None,
        range: index_range(index, symbol.range),
        selection_range: index_range(index, symbol.selection_range),
        children,
    }
}

fn to_lsp_completion_kind(kind: jot_analysis::CompletionItemKind) -> CompletionItemKind {
    match kind {
        jot_analysis::CompletionItemKind::Variable => CompletionItemKind::VARIABLE,
        jot_analysis::CompletionItemKind::Constant => CompletionItemKind::CONSTANT,
        jot_analysis::CompletionItemKind::Function => CompletionItemKind::FUNCTION,
        jot_analysis::CompletionItemKind::Class => CompletionItemKind::CLASS,
        jot_analysis::CompletionItemKind::Property => CompletionItemKind::PROPERTY,
        jot_analysis::CompletionItemKind::Method => CompletionItemKind::METHOD,
        jot_analysis::CompletionItemKind::Module => CompletionItemKind::MODULE,
        jot_analysis::CompletionItemKind::Keyword => CompletionItemKind::KEYWORD,
    }
}

fn to_lsp_symbol_kind(kind: jot_analysis::DocumentSymbolKind) -> SymbolKind {
    match kind {
        jot_analysis::DocumentSymbolKind::Variable => SymbolKind::VARIABLE,
        jot_analysis::DocumentSymbolKind::Constant => SymbolKind::CONSTANT,
        jot_analysis::DocumentSymbolKind::Function => SymbolKind::FUNCTION,
        jot_analysis::DocumentSymbolKind::Class => SymbolKind::CLASS,
        jot_analysis::DocumentSymbolKind::Method => SymbolKind::METHOD,
        jot_analysis::DocumentSymbolKind::Property => SymbolKind::PROPERTY,
    }
}

/// Serve the language server over stdio until the client disconnects.
pub async fn start_lsp_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(JotLspServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
