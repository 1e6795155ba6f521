//! Operator precedence and token-to-operator mapping.

use jot_ast::types::{AssignmentOperator, BinaryOperator, UnaryOperator};
use jot_lexer::TokenKind;

/// Binary operator precedence levels, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Lowest = 0,
    NullishCoalescing,
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    Exponentiation,
    Invalid = 255,
}

pub fn binary_precedence(kind: TokenKind) -> OperatorPrecedence {
    match kind {
        TokenKind::QuestionQuestion => OperatorPrecedence::NullishCoalescing,
        TokenKind::BarBar => OperatorPrecedence::LogicalOr,
        TokenKind::AmpersandAmpersand => OperatorPrecedence::LogicalAnd,
        TokenKind::Bar => OperatorPrecedence::BitwiseOr,
        TokenKind::Caret => OperatorPrecedence::BitwiseXor,
        TokenKind::Ampersand => OperatorPrecedence::BitwiseAnd,
        TokenKind::EqualsEquals
        | TokenKind::ExclamationEquals
        | TokenKind::EqualsEqualsEquals
        | TokenKind::ExclamationEqualsEquals => OperatorPrecedence::Equality,
        TokenKind::LessThan
        | TokenKind::GreaterThan
        | TokenKind::LessThanEquals
        | TokenKind::GreaterThanEquals
        | TokenKind::InstanceOfKeyword
        | TokenKind::InKeyword => OperatorPrecedence::Relational,
        TokenKind::LessThanLessThan
        | TokenKind::GreaterThanGreaterThan
        | TokenKind::GreaterThanGreaterThanGreaterThan => OperatorPrecedence::Shift,
        TokenKind::Plus | TokenKind::Minus => OperatorPrecedence::Additive,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => {
            OperatorPrecedence::Multiplicative
        }
        TokenKind::AsteriskAsterisk => OperatorPrecedence::Exponentiation,
        _ => OperatorPrecedence::Invalid,
    }
}

pub fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    Some(match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Asterisk => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Remainder,
        TokenKind::AsteriskAsterisk => BinaryOperator::Exponent,
        TokenKind::LessThanLessThan => BinaryOperator::LeftShift,
        TokenKind::GreaterThanGreaterThan => BinaryOperator::RightShift,
        TokenKind::GreaterThanGreaterThanGreaterThan => BinaryOperator::UnsignedRightShift,
        TokenKind::LessThan => BinaryOperator::LessThan,
        TokenKind::GreaterThan => BinaryOperator::GreaterThan,
        TokenKind::LessThanEquals => BinaryOperator::LessThanOrEqual,
        TokenKind::GreaterThanEquals => BinaryOperator::GreaterThanOrEqual,
        TokenKind::EqualsEquals => BinaryOperator::Equals,
        TokenKind::ExclamationEquals => BinaryOperator::NotEquals,
        TokenKind::EqualsEqualsEquals => BinaryOperator::StrictEquals,
        TokenKind::ExclamationEqualsEquals => BinaryOperator::StrictNotEquals,
        TokenKind::Ampersand => BinaryOperator::BitAnd,
        TokenKind::Bar => BinaryOperator::BitOr,
        TokenKind::Caret => BinaryOperator::BitXor,
        TokenKind::AmpersandAmpersand => BinaryOperator::LogicalAnd,
        TokenKind::BarBar => BinaryOperator::LogicalOr,
        TokenKind::QuestionQuestion => BinaryOperator::NullishCoalesce,
        TokenKind::InstanceOfKeyword => BinaryOperator::InstanceOf,
        TokenKind::InKeyword => BinaryOperator::In,
        _ => return None,
    })
}

pub fn assignment_operator(kind: TokenKind) -> Option<AssignmentOperator> {
    Some(match kind {
        TokenKind::Equals => AssignmentOperator::Assign,
        TokenKind::PlusEquals => AssignmentOperator::AddAssign,
        TokenKind::MinusEquals => AssignmentOperator::SubtractAssign,
        TokenKind::AsteriskEquals => AssignmentOperator::MultiplyAssign,
        TokenKind::SlashEquals => AssignmentOperator::DivideAssign,
        TokenKind::PercentEquals => AssignmentOperator::RemainderAssign,
        TokenKind::AsteriskAsteriskEquals => AssignmentOperator::ExponentAssign,
        TokenKind::LessThanLessThanEquals => AssignmentOperator::LeftShiftAssign,
        TokenKind::GreaterThanGreaterThanEquals => AssignmentOperator::RightShiftAssign,
        TokenKind::GreaterThanGreaterThanGreaterThanEquals => {
            AssignmentOperator::UnsignedRightShiftAssign
        }
        TokenKind::AmpersandEquals => AssignmentOperator::BitAndAssign,
        TokenKind::BarEquals => AssignmentOperator::BitOrAssign,
        TokenKind::CaretEquals => AssignmentOperator::BitXorAssign,
        TokenKind::AmpersandAmpersandEquals => AssignmentOperator::LogicalAndAssign,
        TokenKind::BarBarEquals => AssignmentOperator::LogicalOrAssign,
        TokenKind::QuestionQuestionEquals => AssignmentOperator::NullishAssign,
        _ => return None,
    })
}

pub fn unary_operator(kind: TokenKind) -> Option<UnaryOperator> {
    Some(match kind {
        TokenKind::Exclamation => UnaryOperator::Not,
        TokenKind::Tilde => UnaryOperator::BitNot,
        TokenKind::Plus => UnaryOperator::Plus,
        TokenKind::Minus => UnaryOperator::Minus,
        TokenKind::TypeOfKeyword => UnaryOperator::TypeOf,
        TokenKind::VoidKeyword => UnaryOperator::Void,
        TokenKind::DeleteKeyword => UnaryOperator::Delete,
        TokenKind::AwaitKeyword => UnaryOperator::Await,
        _ => return None,
    })
}
