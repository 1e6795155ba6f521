//! Symbol definitions.

use crate::scope::ScopeId;
use jot_ast::node::{
    ClassDeclaration, Expression, FunctionDeclaration, FunctionExpression, ImportDeclaration,
    Parameter, VariableDeclarator,
};
use jot_ast::types::DeclarationForm;
use jot_core::TextRange;

/// Index of a symbol within its scope tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const INVALID: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of entity a symbol names. Drives completion item kinds and
/// default typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Class,
    Parameter,
    Import,
}

impl SymbolKind {
    pub fn of_declaration_form(form: DeclarationForm) -> SymbolKind {
        match form {
            DeclarationForm::Const => SymbolKind::Constant,
            DeclarationForm::Var | DeclarationForm::Let => SymbolKind::Variable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Import => "import",
        }
    }
}

/// The AST construct a symbol was declared by. Inference walks through
/// this to type the symbol lazily.
#[derive(Debug, Clone, Copy)]
pub enum SymbolDeclaration<'a> {
    Variable {
        form: DeclarationForm,
        declarator: &'a VariableDeclarator<'a>,
    },
    Function(&'a FunctionDeclaration<'a>),
    /// Name of a named function expression, visible only in its own body.
    FunctionExpression(&'a FunctionExpression<'a>),
    Class(&'a ClassDeclaration<'a>),
    Parameter(&'a Parameter<'a>),
    CatchBinding,
    /// `for (k in o)`: keys enumerate as strings.
    ForInBinding { form: DeclarationForm },
    /// `for (x of xs)`: the binding takes the element type of `xs`.
    ForOfBinding {
        form: DeclarationForm,
        iterated: &'a Expression<'a>,
    },
    Import(&'a ImportDeclaration<'a>),
}

/// A named entity: one variable, function, class, parameter, or import
/// binding. Owned by exactly one scope.
#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    pub id: SymbolId,
    pub name: &'a str,
    pub kind: SymbolKind,
    /// The scope that owns this symbol.
    pub scope: ScopeId,
    /// Range of the declaring identifier.
    pub name_range: TextRange,
    /// Range of the full declaring construct.
    pub declaration_range: TextRange,
    pub declaration: SymbolDeclaration<'a>,
    pub is_exported: bool,
    /// Identifier uses resolved to this symbol, in binding order.
    pub references: Vec<TextRange>,
}

impl<'a> Symbol<'a> {
    /// A symbol ready to hand to [`crate::ScopeTree::define_symbol`], which
    /// fills in `id` and `scope`.
    pub fn new(
        name: &'a str,
        kind: SymbolKind,
        declaration: SymbolDeclaration<'a>,
        name_range: TextRange,
        declaration_range: TextRange,
        is_exported: bool,
    ) -> Self {
        Self {
            id: SymbolId::INVALID,
            name,
            kind,
            scope: ScopeId::INVALID,
            name_range,
            declaration_range,
            declaration,
            is_exported,
            references: Vec::new(),
        }
    }

    /// `var` and `function` declarations attach to the nearest function or
    /// global scope and may repeat without a redeclaration error.
    pub fn is_function_scoped(&self) -> bool {
        match self.declaration {
            SymbolDeclaration::Variable { form, .. } => form.is_hoisted(),
            SymbolDeclaration::ForInBinding { form } => form.is_hoisted(),
            SymbolDeclaration::ForOfBinding { form, .. } => form.is_hoisted(),
            SymbolDeclaration::Function(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_kind_of_declaration_form() {
        assert_eq!(
            SymbolKind::of_declaration_form(DeclarationForm::Const),
            SymbolKind::Constant
        );
        assert_eq!(
            SymbolKind::of_declaration_form(DeclarationForm::Let),
            SymbolKind::Variable
        );
        assert_eq!(
            SymbolKind::of_declaration_form(DeclarationForm::Var),
            SymbolKind::Variable
        );
    }

    #[test]
    fn test_catch_binding_is_block_scoped() {
        let symbol = Symbol::new(
            "err",
            SymbolKind::Variable,
            SymbolDeclaration::CatchBinding,
            TextRange::new(10, 13),
            TextRange::new(10, 13),
            false,
        );
        assert!(!symbol.is_function_scoped());
        assert_eq!(symbol.id, SymbolId::INVALID);
    }

    #[test]
    fn test_for_in_binding_scoping_follows_form() {
        let hoisted = Symbol::new(
            "k",
            SymbolKind::Variable,
            SymbolDeclaration::ForInBinding { form: DeclarationForm::Var },
            TextRange::new(9, 10),
            TextRange::new(9, 10),
            false,
        );
        assert!(hoisted.is_function_scoped());
        let block = Symbol::new(
            "k",
            SymbolKind::Constant,
            SymbolDeclaration::ForInBinding { form: DeclarationForm::Const },
            TextRange::new(9, 10),
            TextRange::new(9, 10),
            false,
        );
        assert!(!block.is_function_scoped());
    }
}
