//! Node identity, flags, and the closed operator sets.

use bitflags::bitflags;
use jot_core::TextRange;
use std::fmt;

/// Identity of one AST node within one parse. Assigned sequentially by the
/// parser; never reused across parses, never stable across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// The fields every node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    pub id: NodeId,
    pub range: TextRange,
}

impl NodeData {
    #[inline]
    pub fn new(id: NodeId, range: TextRange) -> Self {
        Self { id, range }
    }
}

bitflags! {
    /// Function-shaped node properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FunctionFlags: u8 {
        const ASYNC = 1 << 0;
        const GENERATOR = 1 << 1;
    }
}

bitflags! {
    /// Declaration modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModifierFlags: u8 {
        const EXPORT = 1 << 0;
        const STATIC = 1 << 1;
    }
}

/// Which keyword introduced a variable binding. Drives hoisting (`var`) and
/// symbol kind (`const`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationForm {
    Var,
    Let,
    Const,
}

impl DeclarationForm {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationForm::Var => "var",
            DeclarationForm::Let => "let",
            DeclarationForm::Const => "const",
        }
    }

    /// `var` declarations hoist to the enclosing function/global scope.
    #[inline]
    pub fn is_hoisted(self) -> bool {
        matches!(self, DeclarationForm::Var)
    }
}

/// Binary operators, grouped the way inference treats them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Exponent,
    // Shift
    LeftShift,
    RightShift,
    UnsignedRightShift,
    // Relational
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    // Equality
    Equals,
    NotEquals,
    StrictEquals,
    StrictNotEquals,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    // Logical
    LogicalAnd,
    LogicalOr,
    NullishCoalesce,
    // Keyword relational
    InstanceOf,
    In,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Exponent => "**",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
            BinaryOperator::UnsignedRightShift => ">>>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::StrictEquals => "===",
            BinaryOperator::StrictNotEquals => "!==",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::NullishCoalesce => "??",
            BinaryOperator::InstanceOf => "instanceof",
            BinaryOperator::In => "in",
        }
    }

    /// Relational, equality, `instanceof`, and `in`; always boolean-typed.
    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::LessThan
                | BinaryOperator::GreaterThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThanOrEqual
                | BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::StrictEquals
                | BinaryOperator::StrictNotEquals
                | BinaryOperator::InstanceOf
                | BinaryOperator::In
        )
    }

    /// `&&`, `||`, and `??`; typed as the union of both operands.
    #[inline]
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr | BinaryOperator::NullishCoalesce
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    BitNot,
    Plus,
    Minus,
    TypeOf,
    Void,
    Delete,
    Await,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::TypeOf => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
            UnaryOperator::Await => "await",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

impl UpdateOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    RemainderAssign,
    ExponentAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LogicalAndAssign,
    LogicalOrAssign,
    NullishAssign,
}

impl AssignmentOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubtractAssign => "-=",
            AssignmentOperator::MultiplyAssign => "*=",
            AssignmentOperator::DivideAssign => "/=",
            AssignmentOperator::RemainderAssign => "%=",
            AssignmentOperator::ExponentAssign => "**=",
            AssignmentOperator::LeftShiftAssign => "<<=",
            AssignmentOperator::RightShiftAssign => ">>=",
            AssignmentOperator::UnsignedRightShiftAssign => ">>>=",
            AssignmentOperator::BitAndAssign => "&=",
            AssignmentOperator::BitOrAssign => "|=",
            AssignmentOperator::BitXorAssign => "^=",
            AssignmentOperator::LogicalAndAssign => "&&=",
            AssignmentOperator::LogicalOrAssign => "||=",
            AssignmentOperator::NullishAssign => "??=",
        }
    }

    /// The binary operator a compound assignment applies, if any.
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractAssign => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyAssign => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideAssign => Some(BinaryOperator::Divide),
            AssignmentOperator::RemainderAssign => Some(BinaryOperator::Remainder),
            AssignmentOperator::ExponentAssign => Some(BinaryOperator::Exponent),
            AssignmentOperator::LeftShiftAssign => Some(BinaryOperator::LeftShift),
            AssignmentOperator::RightShiftAssign => Some(BinaryOperator::RightShift),
            AssignmentOperator::UnsignedRightShiftAssign => {
                Some(BinaryOperator::UnsignedRightShift)
            }
            AssignmentOperator::BitAndAssign => Some(BinaryOperator::BitAnd),
            AssignmentOperator::BitOrAssign => Some(BinaryOperator::BitOr),
            AssignmentOperator::BitXorAssign => Some(BinaryOperator::BitXor),
            AssignmentOperator::LogicalAndAssign => Some(BinaryOperator::LogicalAnd),
            AssignmentOperator::LogicalOrAssign => Some(BinaryOperator::LogicalOr),
            AssignmentOperator::NullishAssign => Some(BinaryOperator::NullishCoalesce),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_classification() {
        assert!(BinaryOperator::StrictEquals.is_comparison());
        assert!(BinaryOperator::In.is_comparison());
        assert!(!BinaryOperator::Add.is_comparison());
        assert!(BinaryOperator::NullishCoalesce.is_logical());
        assert!(!BinaryOperator::BitOr.is_logical());
    }

    #[test]
    fn test_compound_assignment_mapping() {
        assert_eq!(AssignmentOperator::Assign.binary_operator(), None);
        assert_eq!(
            AssignmentOperator::AddAssign.binary_operator(),
            Some(BinaryOperator::Add)
        );
        assert_eq!(
            AssignmentOperator::NullishAssign.binary_operator(),
            Some(BinaryOperator::NullishCoalesce)
        );
    }

    #[test]
    fn test_declaration_form_hoisting() {
        assert!(DeclarationForm::Var.is_hoisted());
        assert!(!DeclarationForm::Let.is_hoisted());
        assert!(!DeclarationForm::Const.is_hoisted());
    }
}
