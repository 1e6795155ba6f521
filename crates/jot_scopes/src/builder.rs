//! The scope builder.
//!
//! Walks the AST top-down and builds the scope tree and symbol table.
//! Handles:
//! - Symbol creation for all declarations
//! - Scope creation (global, function, lambda, block, catch, class)
//! - `var` and `function` hoisting to the nearest function/global scope
//! - Redeclaration and duplicate-class-member diagnostics
//! - Identifier reference recording for find-references
//!
//! Each function body gets a hoisting pre-pass before its statements are
//! bound, so hoisted names resolve ahead of their textual position. Member
//! names of a dot access are not references; they resolve against the
//! object's type during inference.

use crate::scope::{ScopeId, ScopeKind, ScopeTree};
use crate::symbol::{Symbol, SymbolDeclaration, SymbolId, SymbolKind};
use jot_ast::node::*;
use jot_ast::types::ModifierFlags;
use jot_core::{TextRange, TextSpan};
use jot_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use rustc_hash::FxHashSet;

/// Scope nesting deeper than this is diagnosed once; the tree is still
/// built.
const MAX_SCOPE_DEPTH: u32 = 200;

/// Result of one binding walk: the queryable scope tree plus everything
/// the builder had to say about the declarations.
#[derive(Debug)]
pub struct BindOutput<'a> {
    pub scope_tree: ScopeTree<'a>,
    pub diagnostics: DiagnosticCollection,
}

/// Builds a [`ScopeTree`] from a parsed source file in one walk.
pub struct ScopeBuilder<'a> {
    tree: ScopeTree<'a>,
    file_name: String,
    current_scope: ScopeId,
    /// Nearest enclosing function/global scope; hoisted names land here.
    hoist_scope: ScopeId,
    scope_depth: u32,
    depth_reported: bool,
    diagnostics: DiagnosticCollection,
}

impl<'a> ScopeBuilder<'a> {
    pub fn bind(source_file: &SourceFile<'a>) -> BindOutput<'a> {
        let tree = ScopeTree::new(source_file.data.range);
        let root = tree.root();
        let mut builder = Self {
            tree,
            file_name: source_file.file_name.clone(),
            current_scope: root,
            hoist_scope: root,
            scope_depth: 0,
            depth_reported: false,
            diagnostics: DiagnosticCollection::new(),
        };
        builder.hoist_declarations(source_file.statements);
        builder.bind_statements(source_file.statements);
        let mut diagnostics = builder.diagnostics;
        diagnostics.sort_and_dedupe();
        BindOutput { scope_tree: builder.tree, diagnostics }
    }

    // ========================================================================
    // Scope and symbol management
    // ========================================================================

    fn push_scope(&mut self, kind: ScopeKind, range: TextRange) {
        let id = self.tree.push_scope(self.current_scope, kind, range);
        self.current_scope = id;
        if kind.is_hoist_target() {
            self.hoist_scope = id;
        }
        self.scope_depth += 1;
        if self.scope_depth > MAX_SCOPE_DEPTH && !self.depth_reported {
            self.depth_reported = true;
            self.report(messages::SCOPE_NESTING_TOO_DEEP, range.to_span());
        }
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.tree.scope(self.current_scope).parent {
            self.current_scope = parent;
            self.hoist_scope = self.tree.hoist_target(parent);
            self.scope_depth -= 1;
        }
    }

    /// Insert a symbol, merging legal re-declarations (`var` after `var`,
    /// repeated `function`) and reporting the rest.
    fn declare(&mut self, scope: ScopeId, symbol: Symbol<'a>) -> SymbolId {
        if let Some(existing) = self.tree.scope(scope).symbol(symbol.name) {
            let merges =
                self.tree.symbol(existing).is_function_scoped() && symbol.is_function_scoped();
            if !merges {
                self.report_args(
                    messages::DUPLICATE_DECLARATION_0,
                    symbol.name_range.to_span(),
                    &[symbol.name],
                );
            }
            return existing;
        }
        self.tree.define_symbol(scope, symbol)
    }

    /// Resolve an identifier in expression position and record the use on
    /// the symbol it names. Unresolved names are left for inference, which
    /// treats them as globals or `any`.
    fn record_reference(&mut self, identifier: &Identifier<'a>) {
        if let Some(symbol) = self.tree.resolve_in(self.current_scope, identifier.text) {
            self.tree.symbol_mut(symbol).references.push(identifier.data.range);
        }
    }

    fn report(&mut self, message: DiagnosticMessage, span: TextSpan) {
        let diagnostic = Diagnostic::new(message, Some(span)).with_file(self.file_name.as_str());
        self.diagnostics.add(diagnostic);
    }

    fn report_args(&mut self, message: DiagnosticMessage, span: TextSpan, args: &[&str]) {
        let diagnostic =
            Diagnostic::with_args(message, Some(span), args).with_file(self.file_name.as_str());
        self.diagnostics.add(diagnostic);
    }

    // ========================================================================
    // Hoisting
    // ========================================================================

    /// Declare the hoisted names of one function (or global) body: every
    /// `function` declaration and `var` declarator, however deeply nested
    /// in blocks, short of crossing into another function body.
    fn hoist_declarations(&mut self, statements: &'a [Statement<'a>]) {
        for statement in statements {
            self.hoist_statement(statement);
        }
    }

    fn hoist_statement(&mut self, stmt: &'a Statement<'a>) {
        match stmt {
            Statement::Variable(n) if n.form.is_hoisted() => {
                let exported = n.modifiers.contains(ModifierFlags::EXPORT);
                for declarator in n.declarations.iter() {
                    let symbol = Symbol::new(
                        declarator.name.text,
                        SymbolKind::Variable,
                        SymbolDeclaration::Variable { form: n.form, declarator },
                        declarator.name.data.range,
                        declarator.data.range,
                        exported,
                    );
                    self.declare(self.hoist_scope, symbol);
                }
            }
            Statement::Function(n) => {
                let symbol = Symbol::new(
                    n.name.text,
                    SymbolKind::Function,
                    SymbolDeclaration::Function(n),
                    n.name.data.range,
                    n.data.range,
                    n.modifiers.contains(ModifierFlags::EXPORT),
                );
                self.declare(self.hoist_scope, symbol);
            }
            Statement::Block(n) => self.hoist_declarations(n.statements),
            Statement::If(n) => {
                self.hoist_statement(n.then_branch);
                if let Some(else_branch) = n.else_branch {
                    self.hoist_statement(else_branch);
                }
            }
            Statement::While(n) => self.hoist_statement(n.body),
            Statement::DoWhile(n) => self.hoist_statement(n.body),
            Statement::For(n) => {
                if let Some(initializer) = n.initializer {
                    self.hoist_statement(initializer);
                }
                self.hoist_statement(n.body);
            }
            Statement::ForIn(n) => {
                if n.form.is_hoisted() {
                    let symbol = Symbol::new(
                        n.binding.text,
                        SymbolKind::Variable,
                        SymbolDeclaration::ForInBinding { form: n.form },
                        n.binding.data.range,
                        n.binding.data.range,
                        false,
                    );
                    self.declare(self.hoist_scope, symbol);
                }
                self.hoist_statement(n.body);
            }
            Statement::ForOf(n) => {
                if n.form.is_hoisted() {
                    let symbol = Symbol::new(
                        n.binding.text,
                        SymbolKind::Variable,
                        SymbolDeclaration::ForOfBinding { form: n.form, iterated: n.iterated },
                        n.binding.data.range,
                        n.binding.data.range,
                        false,
                    );
                    self.declare(self.hoist_scope, symbol);
                }
                self.hoist_statement(n.body);
            }
            Statement::Try(n) => {
                self.hoist_declarations(n.try_block.statements);
                if let Some(catch) = &n.catch_clause {
                    self.hoist_declarations(catch.block.statements);
                }
                if let Some(finally) = n.finally_block {
                    self.hoist_declarations(finally.statements);
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Statement binding
    // ========================================================================

    fn bind_statements(&mut self, statements: &'a [Statement<'a>]) {
        for statement in statements {
            self.bind_statement(statement);
        }
    }

    fn bind_statement(&mut self, stmt: &'a Statement<'a>) {
        match stmt {
            Statement::Variable(n) => self.bind_variable_statement(n),
            Statement::Function(n) => self.bind_function_declaration(n),
            Statement::Class(n) => self.bind_class_declaration(n),
            Statement::Block(n) => {
                self.push_scope(ScopeKind::Block, n.data.range);
                self.bind_statements(n.statements);
                self.pop_scope();
            }
            Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => {}
            Statement::Expression(n) => self.bind_expression(n.expression),
            Statement::If(n) => {
                self.bind_expression(n.condition);
                self.bind_statement(n.then_branch);
                if let Some(else_branch) = n.else_branch {
                    self.bind_statement(else_branch);
                }
            }
            Statement::While(n) => {
                self.bind_expression(n.condition);
                self.bind_statement(n.body);
            }
            Statement::DoWhile(n) => {
                self.bind_statement(n.body);
                self.bind_expression(n.condition);
            }
            Statement::For(n) => self.bind_for_statement(n),
            Statement::ForIn(n) => self.bind_for_in_statement(n),
            Statement::ForOf(n) => self.bind_for_of_statement(n),
            Statement::Return(n) => {
                if let Some(expression) = n.expression {
                    self.bind_expression(expression);
                }
            }
            Statement::Throw(n) => self.bind_expression(n.expression),
            Statement::Try(n) => self.bind_try_statement(n),
            Statement::Import(n) => self.bind_import_declaration(n),
        }
    }

    fn bind_variable_statement(&mut self, node: &'a VariableStatement<'a>) {
        let exported = node.modifiers.contains(ModifierFlags::EXPORT);
        for declarator in node.declarations.iter() {
            // `var` declarators were already placed by the hoisting pass.
            if !node.form.is_hoisted() {
                let symbol = Symbol::new(
                    declarator.name.text,
                    SymbolKind::of_declaration_form(node.form),
                    SymbolDeclaration::Variable { form: node.form, declarator },
                    declarator.name.data.range,
                    declarator.data.range,
                    exported,
                );
                self.declare(self.current_scope, symbol);
            }
            if let Some(initializer) = declarator.initializer {
                self.bind_expression(initializer);
            }
        }
    }

    /// The function's own name was hoisted; only its body remains.
    fn bind_function_declaration(&mut self, node: &'a FunctionDeclaration<'a>) {
        self.push_scope(ScopeKind::Function, node.data.range);
        self.bind_parameters(node.parameters);
        self.hoist_declarations(node.body.statements);
        self.bind_statements(node.body.statements);
        self.pop_scope();
    }

    fn bind_parameters(&mut self, parameters: &'a [Parameter<'a>]) {
        for parameter in parameters.iter() {
            let symbol = Symbol::new(
                parameter.name.text,
                SymbolKind::Parameter,
                SymbolDeclaration::Parameter(parameter),
                parameter.name.data.range,
                parameter.data.range,
                false,
            );
            self.declare(self.current_scope, symbol);
            if let Some(default) = parameter.default {
                self.bind_expression(default);
            }
        }
    }

    fn bind_class_declaration(&mut self, node: &'a ClassDeclaration<'a>) {
        let symbol = Symbol::new(
            node.name.text,
            SymbolKind::Class,
            SymbolDeclaration::Class(node),
            node.name.data.range,
            node.data.range,
            node.modifiers.contains(ModifierFlags::EXPORT),
        );
        self.declare(self.current_scope, symbol);

        if let Some(super_class) = &node.super_class {
            self.record_reference(super_class);
        }

        self.check_duplicate_members(node);

        self.push_scope(ScopeKind::Class, node.data.range);
        for member in node.members.iter() {
            self.bind_class_member(member);
        }
        self.pop_scope();
    }

    /// Members live in the class's type, not the scope table, so the only
    /// binding-time check is for repeated names.
    fn check_duplicate_members(&mut self, node: &ClassDeclaration<'a>) {
        let mut seen: FxHashSet<(&str, bool)> = FxHashSet::default();
        for member in node.members.iter() {
            let (name, is_static, range) = match member {
                ClassMember::Method(m) => {
                    (m.name.text, m.modifiers.contains(ModifierFlags::STATIC), m.name.data.range)
                }
                ClassMember::Field(f) => {
                    (f.name.text, f.modifiers.contains(ModifierFlags::STATIC), f.name.data.range)
                }
                // A repeated constructor is a parse error, not a binding one.
                ClassMember::Constructor(_) => continue,
            };
            if !seen.insert((name, is_static)) {
                self.report_args(messages::DUPLICATE_CLASS_MEMBER_0, range.to_span(), &[name]);
            }
        }
    }

    fn bind_class_member(&mut self, member: &'a ClassMember<'a>) {
        match member {
            ClassMember::Constructor(n) => {
                self.push_scope(ScopeKind::Function, n.data.range);
                self.bind_parameters(n.parameters);
                self.hoist_declarations(n.body.statements);
                self.bind_statements(n.body.statements);
                self.pop_scope();
            }
            ClassMember::Method(n) => {
                self.push_scope(ScopeKind::Function, n.data.range);
                self.bind_parameters(n.parameters);
                self.hoist_declarations(n.body.statements);
                self.bind_statements(n.body.statements);
                self.pop_scope();
            }
            ClassMember::Field(n) => {
                if let Some(initializer) = n.initializer {
                    self.bind_expression(initializer);
                }
            }
        }
    }

    fn bind_for_statement(&mut self, node: &'a ForStatement<'a>) {
        // The header scope makes `let i` visible in condition, update, and
        // body alike.
        self.push_scope(ScopeKind::Block, node.data.range);
        if let Some(initializer) = node.initializer {
            self.bind_statement(initializer);
        }
        if let Some(condition) = node.condition {
            self.bind_expression(condition);
        }
        if let Some(update) = node.update {
            self.bind_expression(update);
        }
        self.bind_statement(node.body);
        self.pop_scope();
    }

    fn bind_for_in_statement(&mut self, node: &'a ForInStatement<'a>) {
        self.push_scope(ScopeKind::Block, node.data.range);
        if !node.form.is_hoisted() {
            let symbol = Symbol::new(
                node.binding.text,
                SymbolKind::of_declaration_form(node.form),
                SymbolDeclaration::ForInBinding { form: node.form },
                node.binding.data.range,
                node.binding.data.range,
                false,
            );
            self.declare(self.current_scope, symbol);
        }
        self.bind_expression(node.object);
        self.bind_statement(node.body);
        self.pop_scope();
    }

    fn bind_for_of_statement(&mut self, node: &'a ForOfStatement<'a>) {
        self.push_scope(ScopeKind::Block, node.data.range);
        if !node.form.is_hoisted() {
            let symbol = Symbol::new(
                node.binding.text,
                SymbolKind::of_declaration_form(node.form),
                SymbolDeclaration::ForOfBinding { form: node.form, iterated: node.iterated },
                node.binding.data.range,
                node.binding.data.range,
                false,
            );
            self.declare(self.current_scope, symbol);
        }
        self.bind_expression(node.iterated);
        self.bind_statement(node.body);
        self.pop_scope();
    }

    fn bind_try_statement(&mut self, node: &'a TryStatement<'a>) {
        self.push_scope(ScopeKind::Block, node.try_block.data.range);
        self.bind_statements(node.try_block.statements);
        self.pop_scope();

        if let Some(catch) = &node.catch_clause {
            self.push_scope(ScopeKind::Catch, catch.data.range);
            if let Some(parameter) = &catch.parameter {
                let symbol = Symbol::new(
                    parameter.text,
                    SymbolKind::Variable,
                    SymbolDeclaration::CatchBinding,
                    parameter.data.range,
                    parameter.data.range,
                    false,
                );
                self.declare(self.current_scope, symbol);
            }
            self.bind_statements(catch.block.statements);
            self.pop_scope();
        }

        if let Some(finally) = node.finally_block {
            self.push_scope(ScopeKind::Block, finally.data.range);
            self.bind_statements(finally.statements);
            self.pop_scope();
        }
    }

    fn bind_import_declaration(&mut self, node: &'a ImportDeclaration<'a>) {
        if let Some(default_binding) = &node.default_binding {
            let symbol = Symbol::new(
                default_binding.text,
                SymbolKind::Import,
                SymbolDeclaration::Import(node),
                default_binding.data.range,
                node.data.range,
                false,
            );
            self.declare(self.current_scope, symbol);
        }
        for binding in node.named_bindings.iter() {
            let symbol = Symbol::new(
                binding.text,
                SymbolKind::Import,
                SymbolDeclaration::Import(node),
                binding.data.range,
                node.data.range,
                false,
            );
            self.declare(self.current_scope, symbol);
        }
    }

    // ========================================================================
    // Expression binding
    // ========================================================================

    fn bind_expression(&mut self, expr: &'a Expression<'a>) {
        match expr {
            Expression::Identifier(n) => self.record_reference(n),
            Expression::Number(_)
            | Expression::String(_)
            | Expression::Boolean(_)
            | Expression::Null(_)
            | Expression::Undefined(_)
            | Expression::This(_)
            | Expression::Super(_)
            | Expression::Missing(_) => {}
            Expression::Template(n) => {
                for piece in n.expressions.iter().copied() {
                    self.bind_expression(piece);
                }
            }
            Expression::Array(n) => {
                for element in n.elements.iter().copied() {
                    self.bind_expression(element);
                }
            }
            Expression::Object(n) => {
                for property in n.properties.iter() {
                    self.bind_object_property(property);
                }
            }
            Expression::Paren(n) => self.bind_expression(n.expression),
            // Member names resolve against the object's type, not the scope.
            Expression::Member(n) => self.bind_expression(n.object),
            Expression::Index(n) => {
                self.bind_expression(n.object);
                self.bind_expression(n.index);
            }
            Expression::Call(n) => {
                self.bind_expression(n.callee);
                for argument in n.arguments.iter().copied() {
                    self.bind_expression(argument);
                }
            }
            Expression::New(n) => {
                self.bind_expression(n.callee);
                for argument in n.arguments.iter().copied() {
                    self.bind_expression(argument);
                }
            }
            Expression::Unary(n) => self.bind_expression(n.operand),
            Expression::Update(n) => self.bind_expression(n.operand),
            Expression::Binary(n) => {
                self.bind_expression(n.left);
                self.bind_expression(n.right);
            }
            Expression::Conditional(n) => {
                self.bind_expression(n.condition);
                self.bind_expression(n.when_true);
                self.bind_expression(n.when_false);
            }
            Expression::Assignment(n) => {
                self.bind_expression(n.target);
                self.bind_expression(n.value);
            }
            Expression::Arrow(n) => self.bind_arrow_function(n),
            Expression::Function(n) => self.bind_function_expression(n),
        }
    }

    fn bind_object_property(&mut self, property: &'a ObjectProperty<'a>) {
        if let PropertyKey::Computed(key) = property.name {
            self.bind_expression(key);
        }
        match property.value {
            Some(value) => self.bind_expression(value),
            // Shorthand `{ name }` reads the binding called `name`.
            None => {
                if let PropertyKey::Identifier(name) = &property.name {
                    self.record_reference(name);
                }
            }
        }
    }

    fn bind_arrow_function(&mut self, node: &'a ArrowFunction<'a>) {
        self.push_scope(ScopeKind::Lambda, node.data.range);
        self.bind_parameters(node.parameters);
        match node.body {
            ArrowBody::Expression(body) => self.bind_expression(body),
            ArrowBody::Block(body) => {
                self.hoist_declarations(body.statements);
                self.bind_statements(body.statements);
            }
        }
        self.pop_scope();
    }

    fn bind_function_expression(&mut self, node: &'a FunctionExpression<'a>) {
        self.push_scope(ScopeKind::Function, node.data.range);
        // A named function expression can call itself by that name.
        if let Some(name) = &node.name {
            let symbol = Symbol::new(
                name.text,
                SymbolKind::Function,
                SymbolDeclaration::FunctionExpression(node),
                name.data.range,
                node.data.range,
                false,
            );
            self.declare(self.current_scope, symbol);
        }
        self.bind_parameters(node.parameters);
        self.hoist_declarations(node.body.statements);
        self.bind_statements(node.body.statements);
        self.pop_scope();
    }
}
