//! Token kinds shared by every shipped grammar.
//!
//! One flat enum covers the Jot language plus the markup and stylesheet
//! dialects; each grammar simply uses the subset it needs. Keywords are not
//! matched by dedicated rules; the identifier rule fires and the matched
//! text is resolved through [`TokenKind::from_keyword`].

use std::fmt;

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum TokenKind {
    // ========================================================================
    // Specials
    // ========================================================================
    /// Text no rule recognized. Lexical errors degrade to this kind; the
    /// tokenizer itself never fails.
    Invalid = 0,
    EndOfFile = 1,

    // ========================================================================
    // Trivia
    // ========================================================================
    Whitespace,
    LineComment,
    BlockComment,

    // ========================================================================
    // Literals
    // ========================================================================
    Number,
    String,

    // Template literal parts. A template produces Start, then any mix of
    // Chunk and ExprStart..ExprEnd runs, then End.
    TemplateStart,
    TemplateChunk,
    TemplateExprStart,
    TemplateExprEnd,
    TemplateEnd,

    // ========================================================================
    // Markup / stylesheet kinds
    // ========================================================================
    TagName,
    TagClose,
    AttributeName,
    AttributeValue,
    Text,
    Selector,
    PropertyName,
    PropertyValue,

    // ========================================================================
    // Identifiers and keywords
    // ========================================================================
    Identifier,

    AsyncKeyword,
    AwaitKeyword,
    BreakKeyword,
    CatchKeyword,
    ClassKeyword,
    ConstKeyword,
    ContinueKeyword,
    DeleteKeyword,
    DoKeyword,
    ElseKeyword,
    ExportKeyword,
    ExtendsKeyword,
    FalseKeyword,
    FinallyKeyword,
    ForKeyword,
    FromKeyword,
    FunctionKeyword,
    IfKeyword,
    ImportKeyword,
    InKeyword,
    InstanceOfKeyword,
    LetKeyword,
    NewKeyword,
    NullKeyword,
    OfKeyword,
    ReturnKeyword,
    StaticKeyword,
    SuperKeyword,
    ThisKeyword,
    ThrowKeyword,
    TrueKeyword,
    TryKeyword,
    TypeOfKeyword,
    UndefinedKeyword,
    VarKeyword,
    VoidKeyword,
    WhileKeyword,

    // ========================================================================
    // Punctuation
    // ========================================================================
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
    Dot,
    Question,
    Colon,
    Arrow,

    // ========================================================================
    // Operators
    // ========================================================================
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    AsteriskAsterisk,
    PlusPlus,
    MinusMinus,
    LessThan,
    GreaterThan,
    LessThanEquals,
    GreaterThanEquals,
    EqualsEquals,
    ExclamationEquals,
    EqualsEqualsEquals,
    ExclamationEqualsEquals,
    LessThanLessThan,
    GreaterThanGreaterThan,
    GreaterThanGreaterThanGreaterThan,
    Ampersand,
    Bar,
    Caret,
    Tilde,
    Exclamation,
    AmpersandAmpersand,
    BarBar,
    QuestionQuestion,

    // ========================================================================
    // Assignment operators
    // ========================================================================
    Equals,
    PlusEquals,
    MinusEquals,
    AsteriskEquals,
    SlashEquals,
    PercentEquals,
    AsteriskAsteriskEquals,
    LessThanLessThanEquals,
    GreaterThanGreaterThanEquals,
    GreaterThanGreaterThanGreaterThanEquals,
    AmpersandEquals,
    BarEquals,
    CaretEquals,
    AmpersandAmpersandEquals,
    BarBarEquals,
    QuestionQuestionEquals,
}

/// Every Jot keyword, in the order completion lists present them.
pub const JOT_KEYWORDS: &[&str] = &[
    "async", "await", "break", "catch", "class", "const", "continue", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "from",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "of",
    "return", "static", "super", "this", "throw", "true", "try", "typeof",
    "undefined", "var", "void", "while",
];

impl TokenKind {
    /// Resolve identifier text to a keyword kind, if it is one.
    pub fn from_keyword(text: &str) -> Option<TokenKind> {
        match text {
            "async" => Some(TokenKind::AsyncKeyword),
            "await" => Some(TokenKind::AwaitKeyword),
            "break" => Some(TokenKind::BreakKeyword),
            "catch" => Some(TokenKind::CatchKeyword),
            "class" => Some(TokenKind::ClassKeyword),
            "const" => Some(TokenKind::ConstKeyword),
            "continue" => Some(TokenKind::ContinueKeyword),
            "delete" => Some(TokenKind::DeleteKeyword),
            "do" => Some(TokenKind::DoKeyword),
            "else" => Some(TokenKind::ElseKeyword),
            "export" => Some(TokenKind::ExportKeyword),
            "extends" => Some(TokenKind::ExtendsKeyword),
            "false" => Some(TokenKind::FalseKeyword),
            "finally" => Some(TokenKind::FinallyKeyword),
            "for" => Some(TokenKind::ForKeyword),
            "from" => Some(TokenKind::FromKeyword),
            "function" => Some(TokenKind::FunctionKeyword),
            "if" => Some(TokenKind::IfKeyword),
            "import" => Some(TokenKind::ImportKeyword),
            "in" => Some(TokenKind::InKeyword),
            "instanceof" => Some(TokenKind::InstanceOfKeyword),
            "let" => Some(TokenKind::LetKeyword),
            "new" => Some(TokenKind::NewKeyword),
            "null" => Some(TokenKind::NullKeyword),
            "of" => Some(TokenKind::OfKeyword),
            "return" => Some(TokenKind::ReturnKeyword),
            "static" => Some(TokenKind::StaticKeyword),
            "super" => Some(TokenKind::SuperKeyword),
            "this" => Some(TokenKind::ThisKeyword),
            "throw" => Some(TokenKind::ThrowKeyword),
            "true" => Some(TokenKind::TrueKeyword),
            "try" => Some(TokenKind::TryKeyword),
            "typeof" => Some(TokenKind::TypeOfKeyword),
            "undefined" => Some(TokenKind::UndefinedKeyword),
            "var" => Some(TokenKind::VarKeyword),
            "void" => Some(TokenKind::VoidKeyword),
            "while" => Some(TokenKind::WhileKeyword),
            _ => None,
        }
    }

    /// Whitespace and comments, skipped by the parser.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    #[inline]
    pub fn is_keyword(self) -> bool {
        self >= TokenKind::AsyncKeyword && self <= TokenKind::WhileKeyword
    }

    #[inline]
    pub fn is_assignment_operator(self) -> bool {
        self >= TokenKind::Equals && self <= TokenKind::QuestionQuestionEquals
    }

    /// The source text for fixed-spelling kinds, or a lowercase class name
    /// for the open-ended ones. Used in diagnostics and token dumps.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Invalid => "invalid",
            TokenKind::EndOfFile => "end of file",
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment => "comment",
            TokenKind::BlockComment => "comment",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::TemplateStart => "`",
            TokenKind::TemplateChunk => "template text",
            TokenKind::TemplateExprStart => "${",
            TokenKind::TemplateExprEnd => "}",
            TokenKind::TemplateEnd => "`",
            TokenKind::TagName => "tag",
            TokenKind::TagClose => ">",
            TokenKind::AttributeName => "attribute",
            TokenKind::AttributeValue => "attribute value",
            TokenKind::Text => "text",
            TokenKind::Selector => "selector",
            TokenKind::PropertyName => "property",
            TokenKind::PropertyValue => "value",
            TokenKind::Identifier => "identifier",
            TokenKind::AsyncKeyword => "async",
            TokenKind::AwaitKeyword => "await",
            TokenKind::BreakKeyword => "break",
            TokenKind::CatchKeyword => "catch",
            TokenKind::ClassKeyword => "class",
            TokenKind::ConstKeyword => "const",
            TokenKind::ContinueKeyword => "continue",
            TokenKind::DeleteKeyword => "delete",
            TokenKind::DoKeyword => "do",
            TokenKind::ElseKeyword => "else",
            TokenKind::ExportKeyword => "export",
            TokenKind::ExtendsKeyword => "extends",
            TokenKind::FalseKeyword => "false",
            TokenKind::FinallyKeyword => "finally",
            TokenKind::ForKeyword => "for",
            TokenKind::FromKeyword => "from",
            TokenKind::FunctionKeyword => "function",
            TokenKind::IfKeyword => "if",
            TokenKind::ImportKeyword => "import",
            TokenKind::InKeyword => "in",
            TokenKind::InstanceOfKeyword => "instanceof",
            TokenKind::LetKeyword => "let",
            TokenKind::NewKeyword => "new",
            TokenKind::NullKeyword => "null",
            TokenKind::OfKeyword => "of",
            TokenKind::ReturnKeyword => "return",
            TokenKind::StaticKeyword => "static",
            TokenKind::SuperKeyword => "super",
            TokenKind::ThisKeyword => "this",
            TokenKind::ThrowKeyword => "throw",
            TokenKind::TrueKeyword => "true",
            TokenKind::TryKeyword => "try",
            TokenKind::TypeOfKeyword => "typeof",
            TokenKind::UndefinedKeyword => "undefined",
            TokenKind::VarKeyword => "var",
            TokenKind::VoidKeyword => "void",
            TokenKind::WhileKeyword => "while",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "=>",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::AsteriskAsterisk => "**",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThan => ">",
            TokenKind::LessThanEquals => "<=",
            TokenKind::GreaterThanEquals => ">=",
            TokenKind::EqualsEquals => "==",
            TokenKind::ExclamationEquals => "!=",
            TokenKind::EqualsEqualsEquals => "===",
            TokenKind::ExclamationEqualsEquals => "!==",
            TokenKind::LessThanLessThan => "<<",
            TokenKind::GreaterThanGreaterThan => ">>",
            TokenKind::GreaterThanGreaterThanGreaterThan => ">>>",
            TokenKind::Ampersand => "&",
            TokenKind::Bar => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Exclamation => "!",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::BarBar => "||",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Equals => "=",
            TokenKind::PlusEquals => "+=",
            TokenKind::MinusEquals => "-=",
            TokenKind::AsteriskEquals => "*=",
            TokenKind::SlashEquals => "/=",
            TokenKind::PercentEquals => "%=",
            TokenKind::AsteriskAsteriskEquals => "**=",
            TokenKind::LessThanLessThanEquals => "<<=",
            TokenKind::GreaterThanGreaterThanEquals => ">>=",
            TokenKind::GreaterThanGreaterThanGreaterThanEquals => ">>>=",
            TokenKind::AmpersandEquals => "&=",
            TokenKind::BarEquals => "|=",
            TokenKind::CaretEquals => "^=",
            TokenKind::AmpersandAmpersandEquals => "&&=",
            TokenKind::BarBarEquals => "||=",
            TokenKind::QuestionQuestionEquals => "??=",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexical token. Offsets are byte offsets; whether they are relative
/// to a line or to the whole document depends on who produced the token
/// ([`tokenize_line`](crate::tokenize_line) yields line-relative offsets,
/// [`TokenCache::document_tokens`](crate::TokenCache::document_tokens)
/// yields absolute ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self { kind, start, end }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the token's text out of the source its offsets are relative to.
    #[inline]
    pub fn text<'t>(&self, source: &'t str) -> &'t str {
        &source[self.start as usize..self.end as usize]
    }
}
