//! The table-driven tokenizer engine.
//!
//! A [`Grammar`] is pure data: named lexer states, each holding an ordered
//! list of rules `(anchored pattern, token action, state transition)`.
//! [`tokenize_line`] evaluates the current state's rules top-to-bottom
//! against the remaining line text; the first match wins, emits a token,
//! and applies its transition. The stack of state ids carried across line
//! boundaries is the [`LexState`], the unit of incrementality: two lines
//! with equal output state tokenize identically downstream.
//!
//! Malformed input never fails. If no rule matches, one character is
//! consumed as [`TokenKind::Invalid`], which also guarantees progress.

use crate::token::{Token, TokenKind};
use regex::Regex;

/// Index of a state within one grammar. State 0 is always the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub u16);

impl StateId {
    pub const ROOT: StateId = StateId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a rule does to the state stack after its token is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stay in the current state.
    None,
    /// Enter a nested state.
    Push(StateId),
    /// Leave the current state.
    Pop,
    /// Leave several states at once (e.g. a `}` that closes both a value
    /// and its declaration block).
    PopN(u8),
}

/// How a rule picks the emitted token's kind.
#[derive(Clone, Copy)]
pub enum TokenAction {
    /// Always the same kind.
    Fixed(TokenKind),
    /// Resolve the kind from the matched text (keyword tables, operator
    /// spellings).
    Lookup(fn(&str) -> TokenKind),
}

impl std::fmt::Debug for TokenAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenAction::Fixed(kind) => write!(f, "Fixed({:?})", kind),
            TokenAction::Lookup(_) => write!(f, "Lookup(..)"),
        }
    }
}

/// One `(pattern, action, transition)` row of a state's rule table.
#[derive(Debug)]
pub struct Rule {
    /// The rule pattern as written, for grammar dumps and tests.
    pub pattern: &'static str,
    regex: Regex,
    pub action: TokenAction,
    pub transition: Transition,
}

/// A named state and its ordered rules.
#[derive(Debug)]
pub struct StateDef {
    pub name: &'static str,
    pub rules: Vec<Rule>,
}

/// A complete tokenizer grammar for one analyzed language.
#[derive(Debug)]
pub struct Grammar {
    name: &'static str,
    states: Vec<StateDef>,
}

impl Grammar {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn state(&self, id: StateId) -> &StateDef {
        &self.states[id.index()]
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Look up a state id by name. Test and dump helper.
    pub fn state_named(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(|i| StateId(i as u16))
    }
}

/// Builds a [`Grammar`]. States are declared up front so rules can refer to
/// states defined later in the table.
pub struct GrammarBuilder {
    name: &'static str,
    states: Vec<StateDef>,
}

impl GrammarBuilder {
    pub fn new(name: &'static str) -> Self {
        Self { name, states: Vec::new() }
    }

    /// Declare a state and get its id. The first declared state is the root.
    pub fn state(&mut self, name: &'static str) -> StateId {
        let id = StateId(self.states.len() as u16);
        self.states.push(StateDef { name, rules: Vec::new() });
        id
    }

    /// Append a rule to `state`. `pattern` is implicitly anchored to the
    /// current position.
    pub fn rule(
        &mut self,
        state: StateId,
        pattern: &'static str,
        action: TokenAction,
        transition: Transition,
    ) -> &mut Self {
        let regex = Regex::new(&format!(r"\A(?:{})", pattern))
            .expect("grammar rule pattern must compile");
        self.states[state.index()].rules.push(Rule { pattern, regex, action, transition });
        self
    }

    pub fn build(self) -> Grammar {
        debug_assert!(!self.states.is_empty(), "a grammar needs a root state");
        Grammar { name: self.name, states: self.states }
    }
}

/// The tokenizer's carry-over state at a line boundary: a stack of grammar
/// state ids. Comparable and hashable so the incremental cache can test two
/// line boundaries for interchangeability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LexState {
    stack: Vec<StateId>,
}

impl LexState {
    /// The state at the start of a document: root, nothing pushed.
    pub const fn root() -> Self {
        Self { stack: Vec::new() }
    }

    /// The state whose rules apply next.
    #[inline]
    pub fn current(&self) -> StateId {
        self.stack.last().copied().unwrap_or(StateId::ROOT)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.stack.is_empty()
    }

    fn push(&mut self, state: StateId) {
        self.stack.push(state);
    }

    /// Popping past the root is ignored; unbalanced input degrades instead
    /// of failing.
    fn pop(&mut self) {
        self.stack.pop();
    }
}

/// The result of tokenizing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    /// Tokens with offsets relative to the start of the line.
    pub tokens: Vec<Token>,
    /// The lexical state at the end of the line, input to the next one.
    pub end_state: LexState,
}

/// Tokenize a single line of text given the state carried in from the
/// previous line. `line` must not contain `\n`.
pub fn tokenize_line(grammar: &Grammar, line: &str, input_state: &LexState) -> LineTokens {
    let mut state = input_state.clone();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < line.len() {
        let rest = &line[pos..];
        let rules = &grammar.state(state.current()).rules;
        let mut advanced = false;

        for rule in rules {
            let Some(m) = rule.regex.find(rest) else { continue };
            // Empty matches would loop forever; treat them as non-matches.
            if m.end() == 0 {
                continue;
            }
            let kind = match rule.action {
                TokenAction::Fixed(kind) => kind,
                TokenAction::Lookup(resolve) => resolve(&rest[..m.end()]),
            };
            tokens.push(Token::new(kind, pos as u32, (pos + m.end()) as u32));
            match rule.transition {
                Transition::None => {}
                Transition::Push(next) => state.push(next),
                Transition::Pop => state.pop(),
                Transition::PopN(n) => {
                    for _ in 0..n {
                        state.pop();
                    }
                }
            }
            pos += m.end();
            advanced = true;
            break;
        }

        if !advanced {
            // No rule matched: consume one character as Invalid so the
            // tokenizer always makes progress.
            let width = rest.chars().next().map_or(1, |c| c.len_utf8());
            tokens.push(Token::new(TokenKind::Invalid, pos as u32, (pos + width) as u32));
            pos += width;
        }
    }

    LineTokens { tokens, end_state: state }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_grammar() -> Grammar {
        let mut g = GrammarBuilder::new("tiny");
        let root = g.state("root");
        let comment = g.state("comment");
        g.rule(root, r"[ \t]+", TokenAction::Fixed(TokenKind::Whitespace), Transition::None);
        g.rule(root, r"\d+", TokenAction::Fixed(TokenKind::Number), Transition::None);
        g.rule(root, r"\(\*", TokenAction::Fixed(TokenKind::BlockComment), Transition::Push(comment));
        g.rule(comment, r"\*\)", TokenAction::Fixed(TokenKind::BlockComment), Transition::Pop);
        g.rule(comment, r"[^*]+", TokenAction::Fixed(TokenKind::BlockComment), Transition::None);
        g.rule(comment, r"\*", TokenAction::Fixed(TokenKind::BlockComment), Transition::None);
        g.build()
    }

    fn kinds(line: &LineTokens) -> Vec<TokenKind> {
        line.tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_first_match_wins_in_order() {
        let g = tiny_grammar();
        let out = tokenize_line(&g, "12 34", &LexState::root());
        assert_eq!(
            kinds(&out),
            vec![TokenKind::Number, TokenKind::Whitespace, TokenKind::Number]
        );
        assert!(out.end_state.is_root());
    }

    #[test]
    fn test_state_survives_line_boundary() {
        let g = tiny_grammar();
        let first = tokenize_line(&g, "1 (* open", &LexState::root());
        assert_eq!(first.end_state.depth(), 1);

        let second = tokenize_line(&g, "still inside *) 2", &first.end_state);
        assert!(second.end_state.is_root());
        assert_eq!(*kinds(&second).last().unwrap(), TokenKind::Number);
        // Everything before the close marker stays comment-kinded.
        assert_eq!(second.tokens[0].kind, TokenKind::BlockComment);
    }

    #[test]
    fn test_unmatched_input_degrades_to_invalid() {
        let g = tiny_grammar();
        let out = tokenize_line(&g, "1x²3", &LexState::root());
        let ks = kinds(&out);
        assert!(ks.contains(&TokenKind::Invalid));
        // Progress is one char at a time, multi-byte chars included.
        let total: u32 = out.tokens.iter().map(Token::len).sum();
        assert_eq!(total, "1x²3".len() as u32);
    }

    #[test]
    fn test_equal_end_states_compare_equal() {
        let g = tiny_grammar();
        let a = tokenize_line(&g, "(*", &LexState::root());
        let b = tokenize_line(&g, "1 (* trailing", &LexState::root());
        assert_eq!(a.end_state, b.end_state);
        assert_ne!(a.end_state, LexState::root());
    }
}
