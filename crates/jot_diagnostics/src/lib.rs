//! jot_diagnostics: Diagnostic codes, messages, and collection.
//!
//! Analysis never throws. Lexical and syntactic problems are recorded as
//! diagnostics carrying a stable numeric code, a category, and an optional
//! source span, and the pipeline keeps going. Code ranges: 1xxx lexical,
//! 2xxx syntax and binding.

use jot_core::TextSpan;
use std::fmt;

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message template with a stable code.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Define a `DiagnosticMessage` constant.
macro_rules! diag {
    ($code:expr, $category:ident, $message:expr) => {
        DiagnosticMessage {
            code: $code,
            category: DiagnosticCategory::$category,
            message: $message,
        }
    };
}

/// All diagnostic message templates, grouped by pipeline stage.
pub mod messages {
    use super::{DiagnosticCategory, DiagnosticMessage};

    // ========================================================================
    // Lexical (1xxx)
    // ========================================================================

    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage =
        diag!(1001, Error, "Unterminated string literal.");
    pub const UNTERMINATED_TEMPLATE_LITERAL: DiagnosticMessage =
        diag!(1002, Error, "Unterminated template literal.");
    pub const UNTERMINATED_BLOCK_COMMENT: DiagnosticMessage =
        diag!(1003, Error, "Unterminated block comment.");
    pub const UNEXPECTED_CHARACTER_0: DiagnosticMessage =
        diag!(1004, Error, "Unexpected character '{0}'.");

    // ========================================================================
    // Syntax (2xxx)
    // ========================================================================

    pub const EXPECTED_0: DiagnosticMessage = diag!(2001, Error, "'{0}' expected.");
    pub const EXPECTED_EXPRESSION: DiagnosticMessage =
        diag!(2002, Error, "Expression expected.");
    pub const EXPECTED_IDENTIFIER: DiagnosticMessage =
        diag!(2003, Error, "Identifier expected.");
    pub const DECLARATION_OR_STATEMENT_EXPECTED: DiagnosticMessage =
        diag!(2004, Error, "Declaration or statement expected.");
    pub const UNEXPECTED_END_OF_FILE: DiagnosticMessage =
        diag!(2005, Error, "Unexpected end of file.");
    pub const INVALID_ASSIGNMENT_TARGET: DiagnosticMessage =
        diag!(2006, Error, "Invalid assignment target.");
    pub const MISSING_CATCH_OR_FINALLY: DiagnosticMessage =
        diag!(2007, Error, "Missing catch or finally clause after try.");
    pub const NESTING_TOO_DEEP: DiagnosticMessage =
        diag!(2008, Error, "Expression nesting too deep.");
    pub const UNEXPECTED_KEYWORD_0: DiagnosticMessage =
        diag!(2009, Error, "Unexpected keyword '{0}'.");
    pub const MULTIPLE_CONSTRUCTORS_NOT_ALLOWED: DiagnosticMessage =
        diag!(2010, Error, "A class may only have one constructor.");

    // ========================================================================
    // Binding (25xx)
    // ========================================================================

    pub const DUPLICATE_DECLARATION_0: DiagnosticMessage =
        diag!(2501, Error, "Cannot redeclare block-scoped variable '{0}'.");
    pub const SCOPE_NESTING_TOO_DEEP: DiagnosticMessage =
        diag!(2502, Error, "Scope nesting too deep.");
    pub const DUPLICATE_CLASS_MEMBER_0: DiagnosticMessage =
        diag!(2503, Warning, "Duplicate class member '{0}'.");
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), arg);
    }
    out
}

/// One reported problem.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Document the problem was found in, when known.
    pub file: Option<String>,
    /// Source span, when the problem has a location.
    pub span: Option<TextSpan>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    pub fn new(message: DiagnosticMessage, span: Option<TextSpan>) -> Self {
        Self {
            file: None,
            span,
            message_text: message.message.to_string(),
            code: message.code,
            category: message.category,
        }
    }

    pub fn with_args(message: DiagnosticMessage, span: Option<TextSpan>, args: &[&str]) -> Self {
        Self {
            file: None,
            span,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.start)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} J{}: {}", self.category, self.code, self.message_text)
    }
}

/// An ordered collection of diagnostics.
///
/// Diagnostics accumulate in discovery order; callers that present them
/// sort first. Exact duplicates (same file, span, and code) collapse.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self { diagnostics: Vec::new() }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort by file, then span start, then code, and drop exact duplicates.
    pub fn sort_and_dedupe(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            (a.file.as_deref(), a.span.map(|s| s.start), a.code)
                .cmp(&(b.file.as_deref(), b.span.map(|s| s.start), b.code))
        });
        self.diagnostics.dedup_by(|a, b| {
            a.file == b.file && a.span == b.span && a.code == b.code
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
