//! The Jot parser implementation.
//!
//! A recursive descent parser over the lexer's token stream. Trivia is
//! filtered out up front; line-break information survives as a sidecar
//! table so automatic semicolon insertion and postfix operator rules can
//! consult it. All nodes are allocated into a caller-supplied arena.

use jot_ast::node::*;
use jot_ast::types::*;
use jot_ast::AstArena;
use jot_core::text::{LineIndex, TextRange, TextSpan};
use jot_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use jot_lexer::{jot_grammar, Token, TokenCache, TokenKind};

use crate::precedence::{
    assignment_operator, binary_operator, binary_precedence, unary_operator, OperatorPrecedence,
};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// Result of one parse: the tree plus everything the parser had to say
/// about the input. Lexical errors (unterminated literals, stray bytes)
/// are folded in alongside the syntax errors.
#[derive(Debug)]
pub struct ParseOutput<'a> {
    pub source_file: SourceFile<'a>,
    pub diagnostics: DiagnosticCollection,
}

/// The parser produces a [`SourceFile`] AST from Jot source text.
pub struct Parser<'a> {
    arena: &'a AstArena,
    /// Arena-owned copy of the source; node text borrows from it.
    text: &'a str,
    file_name: String,
    tokens: Vec<Token>,
    /// `starts_line[i]` is true when token `i` is the first on its line.
    starts_line: Vec<bool>,
    cursor: usize,
    /// End offset of the last consumed token; node ranges close here.
    prev_end: u32,
    diagnostics: DiagnosticCollection,
    next_node_id: u32,
    recursion_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a AstArena, file_name: &str, source: &str) -> Self {
        let index = LineIndex::new(source);
        let mut cache = TokenCache::new(jot_grammar());
        cache.ensure(source, &index);
        let raw = cache.document_tokens(&index);
        Self::with_tokens(arena, file_name, source, &raw)
    }

    /// Build a parser over tokens the caller already produced, typically
    /// from an incrementally maintained [`TokenCache`].
    pub fn with_tokens(arena: &'a AstArena, file_name: &str, source: &str, raw: &[Token]) -> Self {
        let text = arena.alloc_str(source);
        let index = LineIndex::new(source);
        let mut diagnostics = DiagnosticCollection::new();
        let (tokens, starts_line) = prepare_tokens(raw, text, &index, file_name, &mut diagnostics);
        Self {
            arena,
            text,
            file_name: file_name.to_string(),
            tokens,
            starts_line,
            cursor: 0,
            prev_end: 0,
            diagnostics,
            next_node_id: 0,
            recursion_depth: 0,
        }
    }

    pub fn parse(mut self) -> ParseOutput<'a> {
        let mut statements = Vec::new();
        while !self.at(TokenKind::EndOfFile) {
            if self.at(TokenKind::CloseBrace) {
                self.report(messages::DECLARATION_OR_STATEMENT_EXPECTED, self.current_span());
                self.bump();
                continue;
            }
            let before = self.cursor;
            statements.push(self.parse_statement());
            if self.cursor == before {
                self.skip_to_next_statement();
            }
        }
        let statements = self.alloc_slice(&statements);
        let end = self.text.len() as u32;
        let data = NodeData::new(self.fresh_node_id(), TextRange::new(0, end));
        let source_file = SourceFile { data, file_name: self.file_name, statements };
        let mut diagnostics = self.diagnostics;
        diagnostics.sort_and_dedupe();
        ParseOutput { source_file, diagnostics }
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn token(&self) -> TokenKind {
        self.tokens[self.cursor].kind
    }

    #[inline]
    fn peek(&self) -> TokenKind {
        self.nth(1)
    }

    #[inline]
    fn nth(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.cursor + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EndOfFile)
    }

    #[inline]
    fn token_start(&self) -> u32 {
        self.tokens[self.cursor].start
    }

    #[inline]
    fn token_end(&self) -> u32 {
        self.tokens[self.cursor].end
    }

    fn token_text(&self) -> &'a str {
        let token = self.tokens[self.cursor];
        &self.text[token.start as usize..token.end as usize]
    }

    fn current_span(&self) -> TextSpan {
        TextSpan::from_bounds(self.token_start(), self.token_end())
    }

    fn bump(&mut self) {
        self.prev_end = self.token_end();
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
    }

    #[inline]
    fn at(&self, kind: TokenKind) -> bool {
        self.token() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error_expected(kind.as_str());
            false
        }
    }

    /// Consume a `;`, or apply automatic semicolon insertion: a line break,
    /// a closing brace, or end of file terminates the statement silently.
    fn parse_semicolon(&mut self) {
        if self.eat(TokenKind::Semicolon) {
            return;
        }
        if self.at(TokenKind::CloseBrace) || self.at(TokenKind::EndOfFile) {
            return;
        }
        if self.starts_line[self.cursor] {
            return;
        }
        self.error_expected(";");
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    fn fresh_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn finish_node(&mut self, pos: u32) -> NodeData {
        let end = self.prev_end.max(pos);
        NodeData::new(self.fresh_node_id(), TextRange::new(pos, end))
    }

    fn missing_data(&mut self, pos: u32) -> NodeData {
        NodeData::new(self.fresh_node_id(), TextRange::empty(pos))
    }

    fn alloc_expr(&self, expr: Expression<'a>) -> &'a Expression<'a> {
        self.arena.alloc(expr)
    }

    fn alloc_stmt(&self, stmt: Statement<'a>) -> &'a Statement<'a> {
        self.arena.alloc(stmt)
    }

    fn alloc_slice<T: Copy>(&self, items: &[T]) -> &'a [T] {
        self.arena.alloc_slice_copy(items)
    }

    fn missing_expression(&mut self) -> Expression<'a> {
        let pos = self.token_start();
        Expression::Missing(MissingExpression { data: self.missing_data(pos) })
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn report(&mut self, message: DiagnosticMessage, span: TextSpan) {
        let diagnostic = Diagnostic::new(message, Some(span)).with_file(self.file_name.as_str());
        self.diagnostics.add(diagnostic);
    }

    fn report_args(&mut self, message: DiagnosticMessage, span: TextSpan, args: &[&str]) {
        let diagnostic =
            Diagnostic::with_args(message, Some(span), args).with_file(self.file_name.as_str());
        self.diagnostics.add(diagnostic);
    }

    fn error_expected(&mut self, what: &str) {
        self.report_args(messages::EXPECTED_0, self.current_span(), &[what]);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statements(&mut self) -> &'a [Statement<'a>] {
        let mut statements = Vec::new();
        while !self.at(TokenKind::EndOfFile) && !self.at(TokenKind::CloseBrace) {
            let before = self.cursor;
            statements.push(self.parse_statement());
            if self.cursor == before {
                self.skip_to_next_statement();
            }
        }
        self.alloc_slice(&statements)
    }

    /// Error recovery: skip tokens until one that can start a new statement.
    /// Always consumes at least one token so callers make progress.
    fn skip_to_next_statement(&mut self) {
        self.bump();
        while !self.at(TokenKind::EndOfFile) {
            match self.token() {
                TokenKind::VarKeyword
                | TokenKind::LetKeyword
                | TokenKind::ConstKeyword
                | TokenKind::FunctionKeyword
                | TokenKind::ClassKeyword
                | TokenKind::IfKeyword
                | TokenKind::ForKeyword
                | TokenKind::WhileKeyword
                | TokenKind::DoKeyword
                | TokenKind::ReturnKeyword
                | TokenKind::ThrowKeyword
                | TokenKind::TryKeyword
                | TokenKind::BreakKeyword
                | TokenKind::ContinueKeyword
                | TokenKind::ImportKeyword
                | TokenKind::ExportKeyword
                | TokenKind::Semicolon
                | TokenKind::OpenBrace
                | TokenKind::CloseBrace => return,
                _ => self.bump(),
            }
        }
    }

    fn parse_statement(&mut self) -> Statement<'a> {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            let pos = self.token_start();
            self.report(messages::NESTING_TOO_DEEP, self.current_span());
            self.bump();
            return Statement::Empty(EmptyStatement { data: self.missing_data(pos) });
        }
        self.recursion_depth += 1;
        let stmt = self.parse_statement_inner();
        self.recursion_depth -= 1;
        stmt
    }

    fn parse_statement_inner(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        match self.token() {
            TokenKind::Semicolon => {
                self.bump();
                Statement::Empty(EmptyStatement { data: self.finish_node(pos) })
            }
            TokenKind::OpenBrace => Statement::Block(self.parse_block()),
            TokenKind::VarKeyword | TokenKind::LetKeyword | TokenKind::ConstKeyword => {
                self.parse_variable_statement(pos, ModifierFlags::empty())
            }
            TokenKind::FunctionKeyword => {
                self.parse_function_declaration(pos, ModifierFlags::empty())
            }
            TokenKind::AsyncKeyword if self.peek() == TokenKind::FunctionKeyword => {
                self.parse_function_declaration(pos, ModifierFlags::empty())
            }
            TokenKind::ClassKeyword => self.parse_class_declaration(pos, ModifierFlags::empty()),
            TokenKind::IfKeyword => self.parse_if_statement(),
            TokenKind::WhileKeyword => self.parse_while_statement(),
            TokenKind::DoKeyword => self.parse_do_statement(),
            TokenKind::ForKeyword => self.parse_for_statement(),
            TokenKind::ReturnKeyword => self.parse_return_statement(),
            TokenKind::BreakKeyword => {
                self.bump();
                self.parse_semicolon();
                Statement::Break(BreakStatement { data: self.finish_node(pos) })
            }
            TokenKind::ContinueKeyword => {
                self.bump();
                self.parse_semicolon();
                Statement::Continue(ContinueStatement { data: self.finish_node(pos) })
            }
            TokenKind::ThrowKeyword => self.parse_throw_statement(),
            TokenKind::TryKeyword => self.parse_try_statement(),
            TokenKind::ImportKeyword => self.parse_import_declaration(),
            TokenKind::ExportKeyword => self.parse_exported_declaration(),
            TokenKind::ElseKeyword | TokenKind::CatchKeyword | TokenKind::FinallyKeyword => {
                let text = self.token_text();
                self.report_args(messages::UNEXPECTED_KEYWORD_0, self.current_span(), &[text]);
                self.bump();
                Statement::Empty(EmptyStatement { data: self.missing_data(pos) })
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block(&mut self) -> Block<'a> {
        let pos = self.token_start();
        self.expect(TokenKind::OpenBrace);
        let statements = self.parse_statements();
        self.expect(TokenKind::CloseBrace);
        Block { data: self.finish_node(pos), statements }
    }

    fn parse_block_ref(&mut self) -> &'a Block<'a> {
        let block = self.parse_block();
        self.arena.alloc(block)
    }

    fn parse_variable_statement(&mut self, pos: u32, modifiers: ModifierFlags) -> Statement<'a> {
        let form = match self.token() {
            TokenKind::VarKeyword => DeclarationForm::Var,
            TokenKind::LetKeyword => DeclarationForm::Let,
            _ => DeclarationForm::Const,
        };
        self.bump();
        let mut declarations = Vec::new();
        loop {
            let decl_pos = self.token_start();
            let name = self.parse_identifier();
            let initializer = if self.eat(TokenKind::Equals) {
                let value = self.parse_assignment_expression();
                Some(self.alloc_expr(value))
            } else {
                None
            };
            declarations.push(VariableDeclarator {
                data: self.finish_node(decl_pos),
                name,
                initializer,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.parse_semicolon();
        Statement::Variable(VariableStatement {
            data: self.finish_node(pos),
            form,
            declarations: self.alloc_slice(&declarations),
            modifiers,
        })
    }

    fn parse_function_declaration(&mut self, pos: u32, modifiers: ModifierFlags) -> Statement<'a> {
        let mut flags = FunctionFlags::empty();
        if self.eat(TokenKind::AsyncKeyword) {
            flags |= FunctionFlags::ASYNC;
        }
        self.expect(TokenKind::FunctionKeyword);
        if self.eat(TokenKind::Asterisk) {
            flags |= FunctionFlags::GENERATOR;
        }
        let name = self.parse_identifier();
        let parameters = self.parse_parameters();
        let body = self.parse_block_ref();
        Statement::Function(FunctionDeclaration {
            data: self.finish_node(pos),
            name,
            parameters,
            body,
            flags,
            modifiers,
        })
    }

    fn parse_parameters(&mut self) -> &'a [Parameter<'a>] {
        self.expect(TokenKind::OpenParen);
        let mut parameters = Vec::new();
        while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::EndOfFile) {
            let pos = self.token_start();
            let name = self.parse_identifier();
            let default = if self.eat(TokenKind::Equals) {
                let value = self.parse_assignment_expression();
                Some(self.alloc_expr(value))
            } else {
                None
            };
            parameters.push(Parameter { data: self.finish_node(pos), name, default });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen);
        self.alloc_slice(&parameters)
    }

    fn parse_class_declaration(&mut self, pos: u32, modifiers: ModifierFlags) -> Statement<'a> {
        self.expect(TokenKind::ClassKeyword);
        let name = self.parse_identifier();
        let super_class = if self.eat(TokenKind::ExtendsKeyword) {
            Some(self.parse_identifier())
        } else {
            None
        };
        self.expect(TokenKind::OpenBrace);
        let mut members = Vec::new();
        let mut seen_constructor = false;
        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            let before = self.cursor;
            if let Some(member) = self.parse_class_member(&mut seen_constructor) {
                members.push(member);
            }
            if self.cursor == before {
                self.bump();
            }
        }
        self.expect(TokenKind::CloseBrace);
        Statement::Class(ClassDeclaration {
            data: self.finish_node(pos),
            name,
            super_class,
            members: self.alloc_slice(&members),
            modifiers,
        })
    }

    fn parse_class_member(&mut self, seen_constructor: &mut bool) -> Option<ClassMember<'a>> {
        let pos = self.token_start();
        let mut modifiers = ModifierFlags::empty();
        // `static` and `async` may themselves be member names; only treat
        // them as modifiers when something member-like follows.
        if self.at(TokenKind::StaticKeyword)
            && self.peek() != TokenKind::OpenParen
            && self.peek() != TokenKind::Equals
        {
            modifiers |= ModifierFlags::STATIC;
            self.bump();
        }
        let mut flags = FunctionFlags::empty();
        if self.at(TokenKind::AsyncKeyword)
            && self.peek() != TokenKind::OpenParen
            && self.peek() != TokenKind::Equals
        {
            flags |= FunctionFlags::ASYNC;
            self.bump();
        }
        if self.eat(TokenKind::Asterisk) {
            flags |= FunctionFlags::GENERATOR;
        }
        if self.at(TokenKind::Identifier)
            && self.token_text() == "constructor"
            && self.peek() == TokenKind::OpenParen
        {
            let span = self.current_span();
            self.bump();
            let parameters = self.parse_parameters();
            let body = self.parse_block_ref();
            if *seen_constructor {
                self.report(messages::MULTIPLE_CONSTRUCTORS_NOT_ALLOWED, span);
            }
            *seen_constructor = true;
            return Some(ClassMember::Constructor(ConstructorDeclaration {
                data: self.finish_node(pos),
                parameters,
                body,
            }));
        }
        let name = self.parse_identifier_name();
        if name.text.is_empty() {
            return None;
        }
        if self.at(TokenKind::OpenParen) {
            let parameters = self.parse_parameters();
            let body = self.parse_block_ref();
            return Some(ClassMember::Method(MethodDeclaration {
                data: self.finish_node(pos),
                name,
                parameters,
                body,
                flags,
                modifiers,
            }));
        }
        let initializer = if self.eat(TokenKind::Equals) {
            let value = self.parse_assignment_expression();
            Some(self.alloc_expr(value))
        } else {
            None
        };
        self.parse_semicolon();
        Some(ClassMember::Field(FieldDeclaration {
            data: self.finish_node(pos),
            name,
            initializer,
            modifiers,
        }))
    }

    fn parse_if_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        self.expect(TokenKind::OpenParen);
        let condition = self.parse_expression();
        let condition = self.alloc_expr(condition);
        self.expect(TokenKind::CloseParen);
        let then_branch = self.parse_statement();
        let then_branch = self.alloc_stmt(then_branch);
        let else_branch = if self.eat(TokenKind::ElseKeyword) {
            let stmt = self.parse_statement();
            Some(self.alloc_stmt(stmt))
        } else {
            None
        };
        Statement::If(IfStatement {
            data: self.finish_node(pos),
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        self.expect(TokenKind::OpenParen);
        let condition = self.parse_expression();
        let condition = self.alloc_expr(condition);
        self.expect(TokenKind::CloseParen);
        let body = self.parse_statement();
        let body = self.alloc_stmt(body);
        Statement::While(WhileStatement { data: self.finish_node(pos), condition, body })
    }

    fn parse_do_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        let body = self.parse_statement();
        let body = self.alloc_stmt(body);
        self.expect(TokenKind::WhileKeyword);
        self.expect(TokenKind::OpenParen);
        let condition = self.parse_expression();
        let condition = self.alloc_expr(condition);
        self.expect(TokenKind::CloseParen);
        self.parse_semicolon();
        Statement::DoWhile(DoWhileStatement { data: self.finish_node(pos), body, condition })
    }

    fn parse_for_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        self.expect(TokenKind::OpenParen);

        // `for (let x in obj)` / `for (let x of arr)` need two tokens of
        // lookahead past the declaration form.
        if matches!(
            self.token(),
            TokenKind::VarKeyword | TokenKind::LetKeyword | TokenKind::ConstKeyword
        ) && self.peek() == TokenKind::Identifier
            && matches!(self.nth(2), TokenKind::InKeyword | TokenKind::OfKeyword)
        {
            let form = match self.token() {
                TokenKind::VarKeyword => DeclarationForm::Var,
                TokenKind::LetKeyword => DeclarationForm::Let,
                _ => DeclarationForm::Const,
            };
            self.bump();
            let binding = self.parse_identifier();
            let is_in = self.eat(TokenKind::InKeyword);
            if !is_in {
                self.expect(TokenKind::OfKeyword);
            }
            let object = self.parse_expression();
            let object = self.alloc_expr(object);
            self.expect(TokenKind::CloseParen);
            let body = self.parse_statement();
            let body = self.alloc_stmt(body);
            return if is_in {
                Statement::ForIn(ForInStatement {
                    data: self.finish_node(pos),
                    form,
                    binding,
                    object,
                    body,
                })
            } else {
                Statement::ForOf(ForOfStatement {
                    data: self.finish_node(pos),
                    form,
                    binding,
                    iterated: object,
                    body,
                })
            };
        }

        let initializer = if self.eat(TokenKind::Semicolon) {
            None
        } else if matches!(
            self.token(),
            TokenKind::VarKeyword | TokenKind::LetKeyword | TokenKind::ConstKeyword
        ) {
            let init_pos = self.token_start();
            let stmt = self.parse_variable_statement(init_pos, ModifierFlags::empty());
            Some(self.alloc_stmt(stmt))
        } else {
            let init_pos = self.token_start();
            let expr = self.parse_expression();
            let expr = self.alloc_expr(expr);
            let stmt =
                Statement::Expression(ExpressionStatement { data: self.finish_node(init_pos), expression: expr });
            self.expect(TokenKind::Semicolon);
            Some(self.alloc_stmt(stmt))
        };
        let condition = if self.at(TokenKind::Semicolon) {
            None
        } else {
            let expr = self.parse_expression();
            Some(self.alloc_expr(expr))
        };
        self.expect(TokenKind::Semicolon);
        let update = if self.at(TokenKind::CloseParen) {
            None
        } else {
            let expr = self.parse_expression();
            Some(self.alloc_expr(expr))
        };
        self.expect(TokenKind::CloseParen);
        let body = self.parse_statement();
        let body = self.alloc_stmt(body);
        Statement::For(ForStatement {
            data: self.finish_node(pos),
            initializer,
            condition,
            update,
            body,
        })
    }

    fn parse_return_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        // ASI: `return` followed by a line break returns undefined.
        let expression = if self.at(TokenKind::Semicolon)
            || self.at(TokenKind::CloseBrace)
            || self.at(TokenKind::EndOfFile)
            || self.starts_line[self.cursor]
        {
            None
        } else {
            let expr = self.parse_expression();
            Some(self.alloc_expr(expr))
        };
        self.parse_semicolon();
        Statement::Return(ReturnStatement { data: self.finish_node(pos), expression })
    }

    fn parse_throw_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        let expression = self.parse_expression();
        let expression = self.alloc_expr(expression);
        self.parse_semicolon();
        Statement::Throw(ThrowStatement { data: self.finish_node(pos), expression })
    }

    fn parse_try_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        let try_block = self.parse_block_ref();
        let catch_clause = if self.at(TokenKind::CatchKeyword) {
            let catch_pos = self.token_start();
            self.bump();
            let parameter = if self.eat(TokenKind::OpenParen) {
                let param = self.parse_identifier();
                self.expect(TokenKind::CloseParen);
                Some(param)
            } else {
                None
            };
            let block = self.parse_block_ref();
            Some(CatchClause { data: self.finish_node(catch_pos), parameter, block })
        } else {
            None
        };
        let finally_block = if self.eat(TokenKind::FinallyKeyword) {
            Some(self.parse_block_ref())
        } else {
            None
        };
        if catch_clause.is_none() && finally_block.is_none() {
            self.report(messages::MISSING_CATCH_OR_FINALLY, self.current_span());
        }
        Statement::Try(TryStatement {
            data: self.finish_node(pos),
            try_block,
            catch_clause,
            finally_block,
        })
    }

    fn parse_import_declaration(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        // Side-effect import: `import "module";`
        if self.at(TokenKind::String) {
            let module = self.parse_string_literal();
            self.parse_semicolon();
            return Statement::Import(ImportDeclaration {
                data: self.finish_node(pos),
                default_binding: None,
                named_bindings: &[],
                module,
            });
        }
        let default_binding = if self.at(TokenKind::Identifier) {
            Some(self.parse_identifier())
        } else {
            None
        };
        let has_comma = default_binding.is_some() && self.eat(TokenKind::Comma);
        let mut named = Vec::new();
        if (default_binding.is_none() || has_comma) && self.eat(TokenKind::OpenBrace) {
            while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
                named.push(self.parse_identifier());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseBrace);
        }
        self.expect(TokenKind::FromKeyword);
        let module = self.parse_string_literal();
        self.parse_semicolon();
        Statement::Import(ImportDeclaration {
            data: self.finish_node(pos),
            default_binding,
            named_bindings: self.alloc_slice(&named),
            module,
        })
    }

    fn parse_exported_declaration(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        self.bump();
        match self.token() {
            TokenKind::VarKeyword | TokenKind::LetKeyword | TokenKind::ConstKeyword => {
                self.parse_variable_statement(pos, ModifierFlags::EXPORT)
            }
            TokenKind::FunctionKeyword => {
                self.parse_function_declaration(pos, ModifierFlags::EXPORT)
            }
            TokenKind::AsyncKeyword if self.peek() == TokenKind::FunctionKeyword => {
                self.parse_function_declaration(pos, ModifierFlags::EXPORT)
            }
            TokenKind::ClassKeyword => self.parse_class_declaration(pos, ModifierFlags::EXPORT),
            _ => {
                self.report(messages::DECLARATION_OR_STATEMENT_EXPECTED, self.current_span());
                Statement::Empty(EmptyStatement { data: self.missing_data(pos) })
            }
        }
    }

    fn parse_expression_statement(&mut self) -> Statement<'a> {
        let pos = self.token_start();
        let expression = self.parse_expression();
        let expression = self.alloc_expr(expression);
        self.parse_semicolon();
        Statement::Expression(ExpressionStatement { data: self.finish_node(pos), expression })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> Expression<'a> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> Expression<'a> {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            self.report(messages::NESTING_TOO_DEEP, self.current_span());
            let expr = self.missing_expression();
            self.bump();
            return expr;
        }
        self.recursion_depth += 1;
        let expr = self.parse_assignment_expression_inner();
        self.recursion_depth -= 1;
        expr
    }

    fn parse_assignment_expression_inner(&mut self) -> Expression<'a> {
        // Arrow forms need lookahead before committing to anything else.
        if self.at(TokenKind::Identifier) && self.peek() == TokenKind::Arrow {
            let pos = self.token_start();
            return self.parse_simple_arrow_function(pos, FunctionFlags::empty());
        }
        if self.at(TokenKind::AsyncKeyword) {
            match self.peek() {
                TokenKind::Identifier if self.nth(2) == TokenKind::Arrow => {
                    let pos = self.token_start();
                    self.bump();
                    return self.parse_simple_arrow_function(pos, FunctionFlags::ASYNC);
                }
                TokenKind::OpenParen if self.is_parenthesized_arrow_at(self.cursor + 1) => {
                    let pos = self.token_start();
                    self.bump();
                    return self.parse_parenthesized_arrow_function(pos, FunctionFlags::ASYNC);
                }
                _ => {}
            }
        }
        if self.at(TokenKind::OpenParen) && self.is_parenthesized_arrow_at(self.cursor) {
            let pos = self.token_start();
            return self.parse_parenthesized_arrow_function(pos, FunctionFlags::empty());
        }

        let expr = self.parse_conditional_expression();
        if let Some(operator) = assignment_operator(self.token()) {
            if !is_valid_assignment_target(&expr) {
                self.report(messages::INVALID_ASSIGNMENT_TARGET, expr.range().to_span());
            }
            let pos = expr.range().pos;
            self.bump();
            let value = self.parse_assignment_expression();
            let target = self.alloc_expr(expr);
            let value = self.alloc_expr(value);
            return Expression::Assignment(AssignmentExpression {
                data: self.finish_node(pos),
                operator,
                target,
                value,
            });
        }
        expr
    }

    fn parse_conditional_expression(&mut self) -> Expression<'a> {
        let expr = self.parse_binary_expression(OperatorPrecedence::Lowest);
        if !self.at(TokenKind::Question) {
            return expr;
        }
        let pos = expr.range().pos;
        self.bump();
        let when_true = self.parse_assignment_expression();
        self.expect(TokenKind::Colon);
        let when_false = self.parse_assignment_expression();
        let condition = self.alloc_expr(expr);
        let when_true = self.alloc_expr(when_true);
        let when_false = self.alloc_expr(when_false);
        Expression::Conditional(ConditionalExpression {
            data: self.finish_node(pos),
            condition,
            when_true,
            when_false,
        })
    }

    fn parse_binary_expression(&mut self, min_precedence: OperatorPrecedence) -> Expression<'a> {
        let mut left = self.parse_unary_expression();
        loop {
            let precedence = binary_precedence(self.token());
            if precedence == OperatorPrecedence::Invalid || precedence <= min_precedence {
                break;
            }
            let operator = match binary_operator(self.token()) {
                Some(op) => op,
                None => break,
            };
            let pos = left.range().pos;
            self.bump();
            let right = self.parse_binary_expression(precedence);
            let left_ref = self.alloc_expr(left);
            let right_ref = self.alloc_expr(right);
            left = Expression::Binary(BinaryExpression {
                data: self.finish_node(pos),
                operator,
                left: left_ref,
                right: right_ref,
            });
        }
        left
    }

    fn parse_unary_expression(&mut self) -> Expression<'a> {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            self.report(messages::NESTING_TOO_DEEP, self.current_span());
            let expr = self.missing_expression();
            self.bump();
            return expr;
        }
        self.recursion_depth += 1;
        let expr = self.parse_unary_expression_inner();
        self.recursion_depth -= 1;
        expr
    }

    fn parse_unary_expression_inner(&mut self) -> Expression<'a> {
        if self.at(TokenKind::PlusPlus) || self.at(TokenKind::MinusMinus) {
            let pos = self.token_start();
            let operator = if self.at(TokenKind::PlusPlus) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.bump();
            let operand = self.parse_unary_expression();
            let operand = self.alloc_expr(operand);
            return Expression::Update(UpdateExpression {
                data: self.finish_node(pos),
                operator,
                operand,
                prefix: true,
            });
        }
        if let Some(operator) = unary_operator(self.token()) {
            let pos = self.token_start();
            self.bump();
            let operand = self.parse_unary_expression();
            let operand = self.alloc_expr(operand);
            return Expression::Unary(UnaryExpression {
                data: self.finish_node(pos),
                operator,
                operand,
            });
        }
        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Expression<'a> {
        let expr = self.parse_left_hand_side_expression();
        // Postfix ++/-- must sit on the same line as the operand.
        if (self.at(TokenKind::PlusPlus) || self.at(TokenKind::MinusMinus))
            && !self.starts_line[self.cursor]
        {
            let pos = expr.range().pos;
            let operator = if self.at(TokenKind::PlusPlus) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.bump();
            let operand = self.alloc_expr(expr);
            return Expression::Update(UpdateExpression {
                data: self.finish_node(pos),
                operator,
                operand,
                prefix: false,
            });
        }
        expr
    }

    fn parse_left_hand_side_expression(&mut self) -> Expression<'a> {
        let expr = if self.at(TokenKind::NewKeyword) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        self.parse_call_tail(expr)
    }

    fn parse_call_tail(&mut self, mut expr: Expression<'a>) -> Expression<'a> {
        loop {
            match self.token() {
                TokenKind::Dot => {
                    let pos = expr.range().pos;
                    self.bump();
                    let name = self.parse_identifier_name();
                    let object = self.alloc_expr(expr);
                    expr = Expression::Member(MemberExpression {
                        data: self.finish_node(pos),
                        object,
                        name,
                    });
                }
                TokenKind::OpenBracket => {
                    let pos = expr.range().pos;
                    self.bump();
                    let index = self.parse_expression();
                    self.expect(TokenKind::CloseBracket);
                    let object = self.alloc_expr(expr);
                    let index = self.alloc_expr(index);
                    expr = Expression::Index(IndexExpression {
                        data: self.finish_node(pos),
                        object,
                        index,
                    });
                }
                TokenKind::OpenParen => {
                    let pos = expr.range().pos;
                    let arguments = self.parse_arguments();
                    let callee = self.alloc_expr(expr);
                    expr = Expression::Call(CallExpression {
                        data: self.finish_node(pos),
                        callee,
                        arguments,
                    });
                }
                _ => return expr,
            }
        }
    }

    fn parse_new_expression(&mut self) -> Expression<'a> {
        let pos = self.token_start();
        self.bump();
        let mut callee = self.parse_primary_expression();
        while self.at(TokenKind::Dot) {
            let callee_pos = callee.range().pos;
            self.bump();
            let name = self.parse_identifier_name();
            let object = self.alloc_expr(callee);
            callee = Expression::Member(MemberExpression {
                data: self.finish_node(callee_pos),
                object,
                name,
            });
        }
        let arguments: &'a [&'a Expression<'a>] = if self.at(TokenKind::OpenParen) {
            self.parse_arguments()
        } else {
            &[]
        };
        let callee = self.alloc_expr(callee);
        Expression::New(NewExpression { data: self.finish_node(pos), callee, arguments })
    }

    fn parse_arguments(&mut self) -> &'a [&'a Expression<'a>] {
        self.expect(TokenKind::OpenParen);
        let mut arguments = Vec::new();
        while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::EndOfFile) {
            let argument = self.parse_assignment_expression();
            arguments.push(self.alloc_expr(argument));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen);
        self.alloc_slice(&arguments)
    }

    fn parse_primary_expression(&mut self) -> Expression<'a> {
        let pos = self.token_start();
        match self.token() {
            TokenKind::Identifier => {
                let text = self.token_text();
                self.bump();
                Expression::Identifier(Identifier { data: self.finish_node(pos), text })
            }
            TokenKind::Number => {
                let text = self.token_text();
                self.bump();
                Expression::Number(NumberLiteral { data: self.finish_node(pos), text })
            }
            TokenKind::String => {
                let raw = self.token_text();
                self.bump();
                Expression::String(StringLiteral { data: self.finish_node(pos), raw })
            }
            TokenKind::TemplateStart => self.parse_template_literal(),
            TokenKind::TrueKeyword | TokenKind::FalseKeyword => {
                let value = self.at(TokenKind::TrueKeyword);
                self.bump();
                Expression::Boolean(BooleanLiteral { data: self.finish_node(pos), value })
            }
            TokenKind::NullKeyword => {
                self.bump();
                Expression::Null(NullLiteral { data: self.finish_node(pos) })
            }
            TokenKind::UndefinedKeyword => {
                self.bump();
                Expression::Undefined(UndefinedLiteral { data: self.finish_node(pos) })
            }
            TokenKind::ThisKeyword => {
                self.bump();
                Expression::This(ThisExpression { data: self.finish_node(pos) })
            }
            TokenKind::SuperKeyword => {
                self.bump();
                Expression::Super(SuperExpression { data: self.finish_node(pos) })
            }
            TokenKind::OpenParen => {
                self.bump();
                let inner = self.parse_expression();
                self.expect(TokenKind::CloseParen);
                let expression = self.alloc_expr(inner);
                Expression::Paren(ParenExpression { data: self.finish_node(pos), expression })
            }
            TokenKind::OpenBracket => self.parse_array_literal(),
            TokenKind::OpenBrace => self.parse_object_literal(),
            TokenKind::FunctionKeyword => {
                self.parse_function_expression(pos, FunctionFlags::empty())
            }
            TokenKind::AsyncKeyword if self.peek() == TokenKind::FunctionKeyword => {
                self.bump();
                self.parse_function_expression(pos, FunctionFlags::ASYNC)
            }
            TokenKind::EndOfFile => {
                self.report(messages::UNEXPECTED_END_OF_FILE, self.current_span());
                self.missing_expression()
            }
            _ => {
                self.report(messages::EXPECTED_EXPRESSION, self.current_span());
                self.missing_expression()
            }
        }
    }

    fn parse_template_literal(&mut self) -> Expression<'a> {
        let pos = self.token_start();
        self.bump();
        let mut chunks: Vec<&'a str> = Vec::new();
        let mut expressions: Vec<&'a Expression<'a>> = Vec::new();
        let mut chunk_start = self.prev_end;
        loop {
            match self.token() {
                TokenKind::TemplateChunk => self.bump(),
                TokenKind::TemplateExprStart => {
                    chunks.push(&self.text[chunk_start as usize..self.token_start() as usize]);
                    self.bump();
                    let expr = self.parse_expression();
                    expressions.push(self.alloc_expr(expr));
                    self.expect(TokenKind::TemplateExprEnd);
                    chunk_start = self.prev_end;
                }
                TokenKind::TemplateEnd => {
                    chunks.push(&self.text[chunk_start as usize..self.token_start() as usize]);
                    self.bump();
                    break;
                }
                TokenKind::EndOfFile => {
                    chunks.push(&self.text[chunk_start as usize..self.token_start() as usize]);
                    self.report(
                        messages::UNTERMINATED_TEMPLATE_LITERAL,
                        TextSpan::from_bounds(pos, self.token_start()),
                    );
                    break;
                }
                // A parse error inside an interpolation left us desynced.
                _ => self.bump(),
            }
        }
        let chunks = self.alloc_slice(&chunks);
        let expressions = self.alloc_slice(&expressions);
        Expression::Template(TemplateLiteral { data: self.finish_node(pos), chunks, expressions })
    }

    fn parse_array_literal(&mut self) -> Expression<'a> {
        let pos = self.token_start();
        self.bump();
        let mut elements = Vec::new();
        while !self.at(TokenKind::CloseBracket) && !self.at(TokenKind::EndOfFile) {
            if self.eat(TokenKind::Comma) {
                continue;
            }
            let element = self.parse_assignment_expression();
            elements.push(self.alloc_expr(element));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseBracket);
        Expression::Array(ArrayLiteral {
            data: self.finish_node(pos),
            elements: self.alloc_slice(&elements),
        })
    }

    fn parse_object_literal(&mut self) -> Expression<'a> {
        let pos = self.token_start();
        self.bump();
        let mut properties = Vec::new();
        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
            let prop_pos = self.token_start();
            let name = self.parse_property_key();
            let value = if self.eat(TokenKind::Colon) {
                let value = self.parse_assignment_expression();
                Some(self.alloc_expr(value))
            } else if self.at(TokenKind::OpenParen) {
                // Method shorthand: `{ greet() { ... } }`.
                let parameters = self.parse_parameters();
                let body = self.parse_block_ref();
                let function = Expression::Function(FunctionExpression {
                    data: self.finish_node(prop_pos),
                    name: None,
                    parameters,
                    body,
                    flags: FunctionFlags::empty(),
                });
                Some(self.alloc_expr(function))
            } else {
                None
            };
            properties.push(ObjectProperty { data: self.finish_node(prop_pos), name, value });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseBrace);
        Expression::Object(ObjectLiteral {
            data: self.finish_node(pos),
            properties: self.alloc_slice(&properties),
        })
    }

    fn parse_property_key(&mut self) -> PropertyKey<'a> {
        match self.token() {
            TokenKind::Identifier => PropertyKey::Identifier(self.parse_identifier()),
            TokenKind::String => PropertyKey::String(self.parse_string_literal()),
            TokenKind::Number => {
                let pos = self.token_start();
                let text = self.token_text();
                self.bump();
                PropertyKey::Number(NumberLiteral { data: self.finish_node(pos), text })
            }
            TokenKind::OpenBracket => {
                self.bump();
                let key = self.parse_assignment_expression();
                self.expect(TokenKind::CloseBracket);
                PropertyKey::Computed(self.alloc_expr(key))
            }
            kind if kind.is_keyword() => PropertyKey::Identifier(self.parse_identifier_name()),
            _ => {
                self.report(messages::EXPECTED_IDENTIFIER, self.current_span());
                let pos = self.token_start();
                PropertyKey::Identifier(Identifier { data: self.missing_data(pos), text: "" })
            }
        }
    }

    fn parse_function_expression(&mut self, pos: u32, mut flags: FunctionFlags) -> Expression<'a> {
        self.expect(TokenKind::FunctionKeyword);
        if self.eat(TokenKind::Asterisk) {
            flags |= FunctionFlags::GENERATOR;
        }
        let name = if self.at(TokenKind::Identifier) {
            Some(self.parse_identifier())
        } else {
            None
        };
        let parameters = self.parse_parameters();
        let body = self.parse_block_ref();
        Expression::Function(FunctionExpression {
            data: self.finish_node(pos),
            name,
            parameters,
            body,
            flags,
        })
    }

    // ========================================================================
    // Arrow functions
    // ========================================================================

    fn parse_simple_arrow_function(&mut self, pos: u32, flags: FunctionFlags) -> Expression<'a> {
        let param_pos = self.token_start();
        let name = self.parse_identifier();
        let param = Parameter { data: self.finish_node(param_pos), name, default: None };
        let parameters = self.alloc_slice(&[param]);
        self.parse_arrow_tail(pos, parameters, flags)
    }

    fn parse_parenthesized_arrow_function(
        &mut self,
        pos: u32,
        flags: FunctionFlags,
    ) -> Expression<'a> {
        let parameters = self.parse_parameters();
        self.parse_arrow_tail(pos, parameters, flags)
    }

    fn parse_arrow_tail(
        &mut self,
        pos: u32,
        parameters: &'a [Parameter<'a>],
        flags: FunctionFlags,
    ) -> Expression<'a> {
        self.expect(TokenKind::Arrow);
        let body = if self.at(TokenKind::OpenBrace) {
            ArrowBody::Block(self.parse_block_ref())
        } else {
            let expr = self.parse_assignment_expression();
            ArrowBody::Expression(self.alloc_expr(expr))
        };
        Expression::Arrow(ArrowFunction { data: self.finish_node(pos), parameters, body, flags })
    }

    /// Look ahead from an `(` token: does its matching `)` lead to `=>`?
    fn is_parenthesized_arrow_at(&self, start: usize) -> bool {
        debug_assert_eq!(self.tokens[start].kind, TokenKind::OpenParen);
        let mut depth = 0usize;
        let mut i = start;
        while i < self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::OpenParen => depth += 1,
                TokenKind::CloseParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.tokens.get(i + 1).map(|t| t.kind)
                            == Some(TokenKind::Arrow);
                    }
                }
                TokenKind::EndOfFile => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    // ========================================================================
    // Identifiers and literals
    // ========================================================================

    fn parse_identifier(&mut self) -> Identifier<'a> {
        if self.at(TokenKind::Identifier) {
            let pos = self.token_start();
            let text = self.token_text();
            self.bump();
            Identifier { data: self.finish_node(pos), text }
        } else {
            self.report(messages::EXPECTED_IDENTIFIER, self.current_span());
            let pos = self.token_start();
            Identifier { data: self.missing_data(pos), text: "" }
        }
    }

    /// Like [`Parser::parse_identifier`], but keywords are acceptable.
    /// Used for member names and property keys, where `point.of` is fine.
    fn parse_identifier_name(&mut self) -> Identifier<'a> {
        if self.at(TokenKind::Identifier) || self.token().is_keyword() {
            let pos = self.token_start();
            let text = self.token_text();
            self.bump();
            Identifier { data: self.finish_node(pos), text }
        } else {
            self.report(messages::EXPECTED_IDENTIFIER, self.current_span());
            let pos = self.token_start();
            Identifier { data: self.missing_data(pos), text: "" }
        }
    }

    fn parse_string_literal(&mut self) -> StringLiteral<'a> {
        if self.at(TokenKind::String) {
            let pos = self.token_start();
            let raw = self.token_text();
            self.bump();
            StringLiteral { data: self.finish_node(pos), raw }
        } else {
            self.error_expected("string literal");
            let pos = self.token_start();
            StringLiteral { data: self.missing_data(pos), raw: "\"\"" }
        }
    }
}

fn is_valid_assignment_target(expr: &Expression<'_>) -> bool {
    match expr.unwrap_parens() {
        Expression::Identifier(_) | Expression::Member(_) | Expression::Index(_) => true,
        _ => false,
    }
}

/// Strip trivia and rewrite lexer error tokens into diagnostics. Invalid
/// tokens that look like unterminated strings are retained as string
/// literals so downstream analysis still sees a value there.
fn prepare_tokens(
    raw: &[Token],
    text: &str,
    index: &LineIndex,
    file_name: &str,
    diagnostics: &mut DiagnosticCollection,
) -> (Vec<Token>, Vec<bool>) {
    let mut tokens = Vec::with_capacity(raw.len());
    let mut starts_line = Vec::with_capacity(raw.len() + 1);
    let mut prev_line = u32::MAX;
    for &token in raw {
        if token.kind.is_trivia() {
            continue;
        }
        let mut kept = token;
        if token.kind == TokenKind::Invalid {
            let token_text = &text[token.start as usize..token.end as usize];
            let span = TextSpan::from_bounds(token.start, token.end);
            if token_text.starts_with('"') || token_text.starts_with('\'') {
                diagnostics.add(
                    Diagnostic::new(messages::UNTERMINATED_STRING_LITERAL, Some(span))
                        .with_file(file_name),
                );
                kept.kind = TokenKind::String;
            } else {
                diagnostics.add(
                    Diagnostic::with_args(messages::UNEXPECTED_CHARACTER_0, Some(span), &[
                        token_text,
                    ])
                    .with_file(file_name),
                );
                continue;
            }
        }
        let line = index.line_of(kept.start);
        starts_line.push(line != prev_line);
        prev_line = line;
        tokens.push(kept);
    }
    // An unterminated block comment swallows the rest of the file as
    // trivia, so it can only be detected here.
    if let Some(last) = raw.last() {
        if last.kind == TokenKind::BlockComment {
            // The lexer never emits a comment token ending in `*/` unless it
            // actually closed the comment.
            let comment = &text[last.start as usize..last.end as usize];
            if !comment.ends_with("*/") {
                diagnostics.add(
                    Diagnostic::new(
                        messages::UNTERMINATED_BLOCK_COMMENT,
                        Some(TextSpan::from_bounds(last.start, last.end)),
                    )
                    .with_file(file_name),
                );
            }
        }
    }
    let end = text.len() as u32;
    tokens.push(Token::new(TokenKind::EndOfFile, end, end));
    starts_line.push(true);
    (tokens, starts_line)
}
