//! AST node definitions.
//!
//! Nodes are plain structs allocated in a bump arena and wired together
//! with `&'a` references; the enums [`Expression`] and [`Statement`] are
//! closed variant sets so a forgotten node kind is a compile error, not a
//! runtime surprise. Every node carries a [`NodeData`] with its id and
//! source range. Identifier and literal text is sliced straight from the
//! source, which the arena outlives for the duration of one analysis.

use crate::types::{
    AssignmentOperator, BinaryOperator, DeclarationForm, FunctionFlags, ModifierFlags, NodeData,
    UnaryOperator, UpdateOperator,
};
use jot_core::TextRange;

/// The root of one parsed document.
#[derive(Debug)]
pub struct SourceFile<'a> {
    pub data: NodeData,
    pub file_name: String,
    pub statements: &'a [Statement<'a>],
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    Number(NumberLiteral<'a>),
    String(StringLiteral<'a>),
    Template(TemplateLiteral<'a>),
    Boolean(BooleanLiteral),
    Null(NullLiteral),
    Undefined(UndefinedLiteral),
    Array(ArrayLiteral<'a>),
    Object(ObjectLiteral<'a>),
    Identifier(Identifier<'a>),
    This(ThisExpression),
    Super(SuperExpression),
    Paren(ParenExpression<'a>),
    Member(MemberExpression<'a>),
    Index(IndexExpression<'a>),
    Call(CallExpression<'a>),
    New(NewExpression<'a>),
    Unary(UnaryExpression<'a>),
    Update(UpdateExpression<'a>),
    Binary(BinaryExpression<'a>),
    Conditional(ConditionalExpression<'a>),
    Assignment(AssignmentExpression<'a>),
    Arrow(ArrowFunction<'a>),
    Function(FunctionExpression<'a>),
    /// Placeholder produced by error recovery where an expression was
    /// required but none could be parsed.
    Missing(MissingExpression),
}

impl<'a> Expression<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Expression::Number(n) => &n.data,
            Expression::String(n) => &n.data,
            Expression::Template(n) => &n.data,
            Expression::Boolean(n) => &n.data,
            Expression::Null(n) => &n.data,
            Expression::Undefined(n) => &n.data,
            Expression::Array(n) => &n.data,
            Expression::Object(n) => &n.data,
            Expression::Identifier(n) => &n.data,
            Expression::This(n) => &n.data,
            Expression::Super(n) => &n.data,
            Expression::Paren(n) => &n.data,
            Expression::Member(n) => &n.data,
            Expression::Index(n) => &n.data,
            Expression::Call(n) => &n.data,
            Expression::New(n) => &n.data,
            Expression::Unary(n) => &n.data,
            Expression::Update(n) => &n.data,
            Expression::Binary(n) => &n.data,
            Expression::Conditional(n) => &n.data,
            Expression::Assignment(n) => &n.data,
            Expression::Arrow(n) => &n.data,
            Expression::Function(n) => &n.data,
            Expression::Missing(n) => &n.data,
        }
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        self.data().range
    }

    /// Strip grouping parentheses.
    pub fn unwrap_parens(&self) -> &Expression<'a> {
        let mut current = self;
        while let Expression::Paren(paren) = current {
            current = paren.expression;
        }
        current
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NumberLiteral<'a> {
    pub data: NodeData,
    /// Raw source spelling (`0xFF`, `3.25`, `1e9`, ...).
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct StringLiteral<'a> {
    pub data: NodeData,
    /// Raw source spelling, quotes included.
    pub raw: &'a str,
}

impl StringLiteral<'_> {
    /// The string's value: quotes stripped, escapes resolved.
    pub fn value(&self) -> String {
        let inner = if self.raw.len() >= 2 { &self.raw[1..self.raw.len() - 1] } else { self.raw };
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }
}

/// A template literal: chunks of raw text interleaved with interpolated
/// expressions. `chunks` always has one more entry than `expressions`.
#[derive(Debug, Clone, Copy)]
pub struct TemplateLiteral<'a> {
    pub data: NodeData,
    pub chunks: &'a [&'a str],
    pub expressions: &'a [&'a Expression<'a>],
}

#[derive(Debug, Clone, Copy)]
pub struct BooleanLiteral {
    pub data: NodeData,
    pub value: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct NullLiteral {
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy)]
pub struct UndefinedLiteral {
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy)]
pub struct ArrayLiteral<'a> {
    pub data: NodeData,
    pub elements: &'a [&'a Expression<'a>],
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectLiteral<'a> {
    pub data: NodeData,
    pub properties: &'a [ObjectProperty<'a>],
}

/// One `name: value` entry of an object literal. A `None` value is the
/// shorthand form `{ name }`.
#[derive(Debug, Clone, Copy)]
pub struct ObjectProperty<'a> {
    pub data: NodeData,
    pub name: PropertyKey<'a>,
    pub value: Option<&'a Expression<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub enum PropertyKey<'a> {
    Identifier(Identifier<'a>),
    String(StringLiteral<'a>),
    Number(NumberLiteral<'a>),
    Computed(&'a Expression<'a>),
}

#[derive(Debug, Clone, Copy)]
pub struct Identifier<'a> {
    pub data: NodeData,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct ThisExpression {
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy)]
pub struct SuperExpression {
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy)]
pub struct ParenExpression<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
}

/// Dot access `object.name`.
#[derive(Debug, Clone, Copy)]
pub struct MemberExpression<'a> {
    pub data: NodeData,
    pub object: &'a Expression<'a>,
    pub name: Identifier<'a>,
}

/// Computed access `object[index]`.
#[derive(Debug, Clone, Copy)]
pub struct IndexExpression<'a> {
    pub data: NodeData,
    pub object: &'a Expression<'a>,
    pub index: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct CallExpression<'a> {
    pub data: NodeData,
    pub callee: &'a Expression<'a>,
    pub arguments: &'a [&'a Expression<'a>],
}

#[derive(Debug, Clone, Copy)]
pub struct NewExpression<'a> {
    pub data: NodeData,
    pub callee: &'a Expression<'a>,
    pub arguments: &'a [&'a Expression<'a>],
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryExpression<'a> {
    pub data: NodeData,
    pub operator: UnaryOperator,
    pub operand: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateExpression<'a> {
    pub data: NodeData,
    pub operator: UpdateOperator,
    pub operand: &'a Expression<'a>,
    pub prefix: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryExpression<'a> {
    pub data: NodeData,
    pub operator: BinaryOperator,
    pub left: &'a Expression<'a>,
    pub right: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ConditionalExpression<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub when_true: &'a Expression<'a>,
    pub when_false: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct AssignmentExpression<'a> {
    pub data: NodeData,
    pub operator: AssignmentOperator,
    pub target: &'a Expression<'a>,
    pub value: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ArrowFunction<'a> {
    pub data: NodeData,
    pub parameters: &'a [Parameter<'a>],
    pub body: ArrowBody<'a>,
    pub flags: FunctionFlags,
}

#[derive(Debug, Clone, Copy)]
pub enum ArrowBody<'a> {
    /// `x => expr`: the expression is the sole return value.
    Expression(&'a Expression<'a>),
    Block(&'a Block<'a>),
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionExpression<'a> {
    pub data: NodeData,
    pub name: Option<Identifier<'a>>,
    pub parameters: &'a [Parameter<'a>],
    pub body: &'a Block<'a>,
    pub flags: FunctionFlags,
}

#[derive(Debug, Clone, Copy)]
pub struct MissingExpression {
    pub data: NodeData,
}

/// A function parameter. Jot has no type annotations; the default value is
/// the only local evidence of a parameter's type.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub default: Option<&'a Expression<'a>>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    Variable(VariableStatement<'a>),
    Function(FunctionDeclaration<'a>),
    Class(ClassDeclaration<'a>),
    Block(Block<'a>),
    Empty(EmptyStatement),
    Expression(ExpressionStatement<'a>),
    If(IfStatement<'a>),
    While(WhileStatement<'a>),
    DoWhile(DoWhileStatement<'a>),
    For(ForStatement<'a>),
    ForIn(ForInStatement<'a>),
    ForOf(ForOfStatement<'a>),
    Return(ReturnStatement<'a>),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Throw(ThrowStatement<'a>),
    Try(TryStatement<'a>),
    Import(ImportDeclaration<'a>),
}

impl<'a> Statement<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Statement::Variable(n) => &n.data,
            Statement::Function(n) => &n.data,
            Statement::Class(n) => &n.data,
            Statement::Block(n) => &n.data,
            Statement::Empty(n) => &n.data,
            Statement::Expression(n) => &n.data,
            Statement::If(n) => &n.data,
            Statement::While(n) => &n.data,
            Statement::DoWhile(n) => &n.data,
            Statement::For(n) => &n.data,
            Statement::ForIn(n) => &n.data,
            Statement::ForOf(n) => &n.data,
            Statement::Return(n) => &n.data,
            Statement::Break(n) => &n.data,
            Statement::Continue(n) => &n.data,
            Statement::Throw(n) => &n.data,
            Statement::Try(n) => &n.data,
            Statement::Import(n) => &n.data,
        }
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        self.data().range
    }
}

/// `var`/`let`/`const` with one or more declarators.
#[derive(Debug, Clone, Copy)]
pub struct VariableStatement<'a> {
    pub data: NodeData,
    pub form: DeclarationForm,
    pub declarations: &'a [VariableDeclarator<'a>],
    pub modifiers: ModifierFlags,
}

#[derive(Debug, Clone, Copy)]
pub struct VariableDeclarator<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub initializer: Option<&'a Expression<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub parameters: &'a [Parameter<'a>],
    pub body: &'a Block<'a>,
    pub flags: FunctionFlags,
    pub modifiers: ModifierFlags,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub super_class: Option<Identifier<'a>>,
    pub members: &'a [ClassMember<'a>],
    pub modifiers: ModifierFlags,
}

#[derive(Debug, Clone, Copy)]
pub enum ClassMember<'a> {
    Constructor(ConstructorDeclaration<'a>),
    Method(MethodDeclaration<'a>),
    Field(FieldDeclaration<'a>),
}

impl<'a> ClassMember<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            ClassMember::Constructor(n) => &n.data,
            ClassMember::Method(n) => &n.data,
            ClassMember::Field(n) => &n.data,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstructorDeclaration<'a> {
    pub data: NodeData,
    pub parameters: &'a [Parameter<'a>],
    pub body: &'a Block<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct MethodDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub parameters: &'a [Parameter<'a>],
    pub body: &'a Block<'a>,
    pub flags: FunctionFlags,
    pub modifiers: ModifierFlags,
}

/// A field with an optional initializer, e.g. `count = 0;`.
#[derive(Debug, Clone, Copy)]
pub struct FieldDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub initializer: Option<&'a Expression<'a>>,
    pub modifiers: ModifierFlags,
}

#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub data: NodeData,
    pub statements: &'a [Statement<'a>],
}

#[derive(Debug, Clone, Copy)]
pub struct EmptyStatement {
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy)]
pub struct ExpressionStatement<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct IfStatement<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub then_branch: &'a Statement<'a>,
    pub else_branch: Option<&'a Statement<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct WhileStatement<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct DoWhileStatement<'a> {
    pub data: NodeData,
    pub body: &'a Statement<'a>,
    pub condition: &'a Expression<'a>,
}

/// Classic `for (init; condition; update)`.
#[derive(Debug, Clone, Copy)]
pub struct ForStatement<'a> {
    pub data: NodeData,
    pub initializer: Option<&'a Statement<'a>>,
    pub condition: Option<&'a Expression<'a>>,
    pub update: Option<&'a Expression<'a>>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ForInStatement<'a> {
    pub data: NodeData,
    pub form: DeclarationForm,
    pub binding: Identifier<'a>,
    pub object: &'a Expression<'a>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ForOfStatement<'a> {
    pub data: NodeData,
    pub form: DeclarationForm,
    pub binding: Identifier<'a>,
    pub iterated: &'a Expression<'a>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnStatement<'a> {
    pub data: NodeData,
    pub expression: Option<&'a Expression<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakStatement {
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy)]
pub struct ContinueStatement {
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy)]
pub struct ThrowStatement<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct TryStatement<'a> {
    pub data: NodeData,
    pub try_block: &'a Block<'a>,
    pub catch_clause: Option<CatchClause<'a>>,
    pub finally_block: Option<&'a Block<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct CatchClause<'a> {
    pub data: NodeData,
    pub parameter: Option<Identifier<'a>>,
    pub block: &'a Block<'a>,
}

/// `import d from "m"`, `import { a, b } from "m"`, or both. Bindings are
/// local names typed `any`; no cross-document analysis happens.
#[derive(Debug, Clone, Copy)]
pub struct ImportDeclaration<'a> {
    pub data: NodeData,
    pub default_binding: Option<Identifier<'a>>,
    pub named_bindings: &'a [Identifier<'a>],
    pub module: StringLiteral<'a>,
}
