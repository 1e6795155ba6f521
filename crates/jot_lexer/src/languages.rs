//! The shipped grammar tables: Jot itself, plus a markup dialect and a
//! stylesheet dialect that exercise the same engine.
//!
//! Each table is built once per process behind a `OnceLock`. Rules are
//! evaluated top-to-bottom, so order inside a state is significant: the
//! closed-on-one-line block comment rule must precede the open rule, and
//! complete string literals must precede their unterminated fallbacks.

use crate::grammar::{Grammar, GrammarBuilder, StateId, Transition};
use crate::token::TokenKind;
use std::sync::OnceLock;

use crate::grammar::TokenAction::{Fixed, Lookup};

fn identifier_kind(text: &str) -> TokenKind {
    TokenKind::from_keyword(text).unwrap_or(TokenKind::Identifier)
}

fn operator_kind(text: &str) -> TokenKind {
    match text {
        "{" => TokenKind::OpenBrace,
        "}" => TokenKind::CloseBrace,
        "(" => TokenKind::OpenParen,
        ")" => TokenKind::CloseParen,
        "[" => TokenKind::OpenBracket,
        "]" => TokenKind::CloseBracket,
        ";" => TokenKind::Semicolon,
        "," => TokenKind::Comma,
        "." => TokenKind::Dot,
        "?" => TokenKind::Question,
        ":" => TokenKind::Colon,
        "=>" => TokenKind::Arrow,
        "+" => TokenKind::Plus,
        "-" => TokenKind::Minus,
        "*" => TokenKind::Asterisk,
        "/" => TokenKind::Slash,
        "%" => TokenKind::Percent,
        "**" => TokenKind::AsteriskAsterisk,
        "++" => TokenKind::PlusPlus,
        "--" => TokenKind::MinusMinus,
        "<" => TokenKind::LessThan,
        ">" => TokenKind::GreaterThan,
        "<=" => TokenKind::LessThanEquals,
        ">=" => TokenKind::GreaterThanEquals,
        "==" => TokenKind::EqualsEquals,
        "!=" => TokenKind::ExclamationEquals,
        "===" => TokenKind::EqualsEqualsEquals,
        "!==" => TokenKind::ExclamationEqualsEquals,
        "<<" => TokenKind::LessThanLessThan,
        ">>" => TokenKind::GreaterThanGreaterThan,
        ">>>" => TokenKind::GreaterThanGreaterThanGreaterThan,
        "&" => TokenKind::Ampersand,
        "|" => TokenKind::Bar,
        "^" => TokenKind::Caret,
        "~" => TokenKind::Tilde,
        "!" => TokenKind::Exclamation,
        "&&" => TokenKind::AmpersandAmpersand,
        "||" => TokenKind::BarBar,
        "??" => TokenKind::QuestionQuestion,
        "=" => TokenKind::Equals,
        "+=" => TokenKind::PlusEquals,
        "-=" => TokenKind::MinusEquals,
        "*=" => TokenKind::AsteriskEquals,
        "/=" => TokenKind::SlashEquals,
        "%=" => TokenKind::PercentEquals,
        "**=" => TokenKind::AsteriskAsteriskEquals,
        "<<=" => TokenKind::LessThanLessThanEquals,
        ">>=" => TokenKind::GreaterThanGreaterThanEquals,
        ">>>=" => TokenKind::GreaterThanGreaterThanGreaterThanEquals,
        "&=" => TokenKind::AmpersandEquals,
        "|=" => TokenKind::BarEquals,
        "^=" => TokenKind::CaretEquals,
        "&&=" => TokenKind::AmpersandAmpersandEquals,
        "||=" => TokenKind::BarBarEquals,
        "??=" => TokenKind::QuestionQuestionEquals,
        _ => TokenKind::Invalid,
    }
}

/// All operator and punctuation spellings, longest alternatives first so a
/// prefix never wins over its extension.
const OPERATORS: &str = concat!(
    r">>>=|>>>|\*\*=|<<=|>>=|&&=|\|\|=|\?\?=|===|!==|=>|==|!=|<=|>=",
    r"|\*\*|\+\+|--|&&|\|\||\?\?|<<|>>|\+=|-=|\*=|/=|%=|&=|\|=|\^=",
    r"|[+\-*/%&|^~!<>=?:;,.(){}\[\]]",
);

/// Install the Jot expression-level rules into `state`. The same row set
/// serves the root and both interpolation states; callers add their own
/// overriding rules first.
fn expression_rules(
    g: &mut GrammarBuilder,
    state: StateId,
    block_comment: StateId,
    template: StateId,
) {
    g.rule(state, r"[ \t\r]+", Fixed(TokenKind::Whitespace), Transition::None);
    g.rule(state, r"//.*", Fixed(TokenKind::LineComment), Transition::None);
    // A block comment closed on the same line never changes state.
    g.rule(state, r"/\*.*?\*/", Fixed(TokenKind::BlockComment), Transition::None);
    g.rule(state, r"/\*", Fixed(TokenKind::BlockComment), Transition::Push(block_comment));
    g.rule(
        state,
        r"0[xX][0-9a-fA-F]+|0[bB][01]+|0[oO][0-7]+|(?:\d+(?:\.\d+)?|\.\d+)(?:[eE][+-]?\d+)?",
        Fixed(TokenKind::Number),
        Transition::None,
    );
    g.rule(state, r#""(?:[^"\\]|\\.)*""#, Fixed(TokenKind::String), Transition::None);
    g.rule(state, r"'(?:[^'\\]|\\.)*'", Fixed(TokenKind::String), Transition::None);
    // Unterminated strings run to the end of the line as a single Invalid
    // token; the next line starts fresh.
    g.rule(state, r#""(?:[^"\\]|\\.)*"#, Fixed(TokenKind::Invalid), Transition::None);
    g.rule(state, r"'(?:[^'\\]|\\.)*", Fixed(TokenKind::Invalid), Transition::None);
    g.rule(state, "`", Fixed(TokenKind::TemplateStart), Transition::Push(template));
    g.rule(
        state,
        r"[\p{XID_Start}_$][\p{XID_Continue}$]*",
        Lookup(identifier_kind),
        Transition::None,
    );
    g.rule(state, OPERATORS, Lookup(operator_kind), Transition::None);
}

/// The grammar for Jot source text (`.jot`).
pub fn jot_grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let mut g = GrammarBuilder::new("jot");
        let root = g.state("root");
        let block_comment = g.state("block_comment");
        let template = g.state("template");
        let template_expr = g.state("template_expr");
        let template_nested = g.state("template_nested");

        expression_rules(&mut g, root, block_comment, template);

        g.rule(block_comment, r"\*/", Fixed(TokenKind::BlockComment), Transition::Pop);
        g.rule(block_comment, r"[^*]+", Fixed(TokenKind::BlockComment), Transition::None);
        g.rule(block_comment, r"\*", Fixed(TokenKind::BlockComment), Transition::None);

        g.rule(template, r"\\.", Fixed(TokenKind::TemplateChunk), Transition::None);
        g.rule(template, r"\$\{", Fixed(TokenKind::TemplateExprStart), Transition::Push(template_expr));
        g.rule(template, "`", Fixed(TokenKind::TemplateEnd), Transition::Pop);
        g.rule(template, r"[^`$\\]+", Fixed(TokenKind::TemplateChunk), Transition::None);
        g.rule(template, r"[$\\]", Fixed(TokenKind::TemplateChunk), Transition::None);

        // Interpolations hold full expressions. `{` nests so the closing
        // `}` of an object literal does not end the interpolation.
        g.rule(template_expr, r"\{", Fixed(TokenKind::OpenBrace), Transition::Push(template_nested));
        g.rule(template_expr, r"\}", Fixed(TokenKind::TemplateExprEnd), Transition::Pop);
        expression_rules(&mut g, template_expr, block_comment, template);

        g.rule(template_nested, r"\{", Fixed(TokenKind::OpenBrace), Transition::Push(template_nested));
        g.rule(template_nested, r"\}", Fixed(TokenKind::CloseBrace), Transition::Pop);
        expression_rules(&mut g, template_nested, block_comment, template);

        g.build()
    })
}

/// The grammar for the markup dialect (`.jml`): tags, attributes, quoted
/// values, multi-line comments.
pub fn markup_grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let mut g = GrammarBuilder::new("markup");
        let text = g.state("text");
        let tag = g.state("tag");
        let comment = g.state("comment");

        g.rule(text, r"<!--", Fixed(TokenKind::BlockComment), Transition::Push(comment));
        g.rule(text, r"</?[A-Za-z][A-Za-z0-9-]*", Fixed(TokenKind::TagName), Transition::Push(tag));
        g.rule(text, r"[^<]+", Fixed(TokenKind::Text), Transition::None);
        g.rule(text, r"<", Fixed(TokenKind::Invalid), Transition::None);

        g.rule(tag, r"[ \t\r]+", Fixed(TokenKind::Whitespace), Transition::None);
        g.rule(tag, r"/?>", Fixed(TokenKind::TagClose), Transition::Pop);
        g.rule(tag, r"=", Fixed(TokenKind::Equals), Transition::None);
        g.rule(tag, r#""[^"]*""#, Fixed(TokenKind::AttributeValue), Transition::None);
        g.rule(tag, r"'[^']*'", Fixed(TokenKind::AttributeValue), Transition::None);
        g.rule(tag, r#""[^"]*"#, Fixed(TokenKind::Invalid), Transition::None);
        g.rule(tag, r"'[^']*", Fixed(TokenKind::Invalid), Transition::None);
        g.rule(tag, r"[A-Za-z_:][A-Za-z0-9_:.-]*", Fixed(TokenKind::AttributeName), Transition::None);

        g.rule(comment, r"-->", Fixed(TokenKind::BlockComment), Transition::Pop);
        g.rule(comment, r"[^-]+", Fixed(TokenKind::BlockComment), Transition::None);
        g.rule(comment, r"-", Fixed(TokenKind::BlockComment), Transition::None);

        g.build()
    })
}

/// The grammar for the stylesheet dialect (`.jss`): selectors, declaration
/// blocks, strings, multi-line comments.
pub fn stylesheet_grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let mut g = GrammarBuilder::new("stylesheet");
        let root = g.state("root");
        let declarations = g.state("declarations");
        let value = g.state("value");
        let comment = g.state("comment");

        g.rule(root, r"[ \t\r]+", Fixed(TokenKind::Whitespace), Transition::None);
        g.rule(root, r"/\*", Fixed(TokenKind::BlockComment), Transition::Push(comment));
        g.rule(root, r"\{", Fixed(TokenKind::OpenBrace), Transition::Push(declarations));
        g.rule(root, r"\}", Fixed(TokenKind::CloseBrace), Transition::None);
        g.rule(root, r"[^{}\s/][^{}/]*", Fixed(TokenKind::Selector), Transition::None);
        g.rule(root, r"/", Fixed(TokenKind::Selector), Transition::None);

        g.rule(declarations, r"[ \t\r]+", Fixed(TokenKind::Whitespace), Transition::None);
        g.rule(declarations, r"/\*", Fixed(TokenKind::BlockComment), Transition::Push(comment));
        g.rule(declarations, r"\}", Fixed(TokenKind::CloseBrace), Transition::Pop);
        g.rule(declarations, r"[A-Za-z_-][A-Za-z0-9_-]*", Fixed(TokenKind::PropertyName), Transition::None);
        g.rule(declarations, r":", Fixed(TokenKind::Colon), Transition::Push(value));
        g.rule(declarations, r";", Fixed(TokenKind::Semicolon), Transition::None);

        g.rule(value, r"[ \t\r]+", Fixed(TokenKind::Whitespace), Transition::None);
        g.rule(value, r"/\*", Fixed(TokenKind::BlockComment), Transition::Push(comment));
        g.rule(value, r";", Fixed(TokenKind::Semicolon), Transition::Pop);
        // A `}` in value position closes the value and its whole block.
        g.rule(value, r"\}", Fixed(TokenKind::CloseBrace), Transition::PopN(2));
        g.rule(value, r#""[^"]*""#, Fixed(TokenKind::String), Transition::None);
        g.rule(value, r"'[^']*'", Fixed(TokenKind::String), Transition::None);
        g.rule(
            value,
            r"-?(?:\d+(?:\.\d+)?|\.\d+)[A-Za-z%]*",
            Fixed(TokenKind::Number),
            Transition::None,
        );
        g.rule(value, r#"[^;}/\s"'][^;}/"']*"#, Fixed(TokenKind::PropertyValue), Transition::None);
        g.rule(value, r"/", Fixed(TokenKind::PropertyValue), Transition::None);

        g.rule(comment, r"\*/", Fixed(TokenKind::BlockComment), Transition::Pop);
        g.rule(comment, r"[^*]+", Fixed(TokenKind::BlockComment), Transition::None);
        g.rule(comment, r"\*", Fixed(TokenKind::BlockComment), Transition::None);

        g.build()
    })
}

/// Pick a grammar from a file path's extension. Unknown extensions get the
/// Jot grammar.
pub fn grammar_for_path(path: &str) -> &'static Grammar {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str());
    match extension {
        Some("jml") => markup_grammar(),
        Some("jss") => stylesheet_grammar(),
        _ => jot_grammar(),
    }
}
