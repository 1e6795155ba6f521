//! End-to-end tokenizer tests over multi-line documents.

use jot_core::LineIndex;
use jot_lexer::{jot_grammar, tokenize_line, LexState, Token, TokenCache, TokenKind};

/// Tokenize a whole document line by line, returning absolute-offset tokens.
fn scan_all(text: &str) -> Vec<Token> {
    let index = LineIndex::new(text);
    let mut cache = TokenCache::new(jot_grammar());
    cache.ensure(text, &index);
    cache.document_tokens(&index)
}

fn significant_kinds(text: &str) -> Vec<TokenKind> {
    scan_all(text)
        .iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

#[test]
fn test_document_offsets_are_absolute() {
    let text = "let a = 1;\nlet b = 2;";
    let tokens = scan_all(text);
    let b = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Identifier && t.text(text) == "b")
        .unwrap();
    assert_eq!(b.start, 15);
    assert_eq!(b.end, 16);
}

#[test]
fn test_class_declaration_kinds() {
    let text = "class Dog extends Animal {\n  speak() { return 1; }\n}";
    assert_eq!(
        significant_kinds(text),
        vec![
            TokenKind::ClassKeyword,
            TokenKind::Identifier,
            TokenKind::ExtendsKeyword,
            TokenKind::Identifier,
            TokenKind::OpenBrace,
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBrace,
            TokenKind::ReturnKeyword,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::CloseBrace,
            TokenKind::CloseBrace,
        ]
    );
}

#[test]
fn test_multi_line_template_document() {
    let text = "let greeting = `hello\n${name}!\nbye`;\nlet n = 1;";
    let tokens = scan_all(text);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).filter(|k| !k.is_trivia()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::LetKeyword,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::TemplateStart,
            TokenKind::TemplateChunk,
            TokenKind::TemplateExprStart,
            TokenKind::Identifier,
            TokenKind::TemplateExprEnd,
            TokenKind::TemplateChunk,
            TokenKind::TemplateChunk,
            TokenKind::TemplateEnd,
            TokenKind::Semicolon,
            TokenKind::LetKeyword,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Number,
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn test_unterminated_block_comment_swallows_rest() {
    let text = "let a = 1;\n/* never closed\nlet b = 2;";
    let tokens = scan_all(text);
    let after_open: Vec<&Token> = tokens.iter().filter(|t| t.start >= 11).collect();
    assert!(after_open.iter().all(|t| t.kind == TokenKind::BlockComment));
}

#[test]
fn test_invalid_tokens_never_stop_the_scan() {
    let text = "let a = #@ 1;\nlet b = 2;";
    let tokens = scan_all(text);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Invalid));
    // The second line still tokenizes normally.
    assert!(tokens
        .iter()
        .any(|t| t.kind == TokenKind::Identifier && t.text(text) == "b"));
}

#[test]
fn test_tokens_are_stable_for_equal_input() {
    let line = "const n = items.map(x => x * 2);";
    let a = tokenize_line(jot_grammar(), line, &LexState::root());
    let b = tokenize_line(jot_grammar(), line, &LexState::root());
    assert_eq!(a, b);
}

#[test]
fn test_crlf_line_endings() {
    let text = "let a = 1;\r\nlet b = 2;\r\n";
    let kinds = significant_kinds(text);
    assert_eq!(
        kinds,
        vec![
            TokenKind::LetKeyword,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::LetKeyword,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Number,
            TokenKind::Semicolon,
        ]
    );
}
