//! Offset-to-node reconstruction for cursor queries.
//!
//! Hover and completion requests arrive as byte offsets into the current
//! text. This module turns an offset back into the chain of enclosing AST
//! nodes a full walk would have taken, so the inference engine can replay
//! `this` bindings and callback parameter overlays before typing the node
//! under the cursor. End offsets count as inside a node, matching a cursor
//! sitting right after the last character of a word.

use jot_ast::node::{
    ArrowBody, Block, ClassMember, Expression, Parameter, PropertyKey, SourceFile, Statement,
};
use jot_infer::PathNode;
use unicode_xid::UnicodeXID;

/// The AST neighborhood of one cursor offset.
#[derive(Debug)]
pub struct CursorContext<'a> {
    /// Enclosing nodes, outermost first. Strict ancestors of `target`.
    pub path: Vec<PathNode<'a>>,
    /// The innermost expression covering the offset, if the offset lands
    /// in expression position at all.
    pub target: Option<&'a Expression<'a>>,
}

impl<'a> CursorContext<'a> {
    /// The widest recorded expression ending exactly at `end`, with the
    /// number of path entries above it. Member completion uses this to
    /// recover the receiver left of a freshly typed dot.
    pub fn expression_ending_at(&self, end: u32) -> Option<(usize, &'a Expression<'a>)> {
        for (index, &node) in self.path.iter().enumerate() {
            if let PathNode::Expression(expression) = node {
                if expression.range().end == end {
                    return Some((index, expression));
                }
            }
        }
        let target = self.target?;
        if target.range().end == end {
            return Some((self.path.len(), target));
        }
        None
    }
}

/// Builds the node chain covering `offset`.
pub fn context_at<'a>(source_file: &SourceFile<'a>, offset: u32) -> CursorContext<'a> {
    let mut context = CursorContext { path: Vec::new(), target: None };
    let hit = source_file
        .statements
        .iter()
        .find(|statement| statement.range().contains_inclusive(offset));
    if let Some(statement) = hit {
        descend_statement(statement, offset, &mut context);
    }
    context
}

fn covers(expression: &Expression<'_>, offset: u32) -> bool {
    expression.range().contains_inclusive(offset)
}

fn descend_statement<'a>(
    statement: &'a Statement<'a>,
    offset: u32,
    context: &mut CursorContext<'a>,
) {
    context.path.push(PathNode::Statement(statement));
    match statement {
        Statement::Variable(node) => {
            for declarator in node.declarations.iter() {
                if let Some(initializer) = declarator.initializer {
                    if covers(initializer, offset) {
                        descend_expression(initializer, offset, context);
                        return;
                    }
                }
            }
        }
        Statement::Function(node) => {
            if descend_parameters(node.parameters, offset, context) {
                return;
            }
            descend_block(node.body, offset, context);
        }
        Statement::Class(node) => {
            for member in node.members.iter() {
                if member.data().range.contains_inclusive(offset) {
                    descend_member(member, offset, context);
                    return;
                }
            }
        }
        Statement::Block(node) => descend_block(node, offset, context),
        Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => {}
        Statement::Expression(node) => {
            if covers(node.expression, offset) {
                descend_expression(node.expression, offset, context);
            }
        }
        Statement::If(node) => {
            if covers(node.condition, offset) {
                descend_expression(node.condition, offset, context);
            } else if node.then_branch.range().contains_inclusive(offset) {
                descend_statement(node.then_branch, offset, context);
            } else if let Some(else_branch) = node.else_branch {
                if else_branch.range().contains_inclusive(offset) {
                    descend_statement(else_branch, offset, context);
                }
            }
        }
        Statement::While(node) => {
            if covers(node.condition, offset) {
                descend_expression(node.condition, offset, context);
            } else if node.body.range().contains_inclusive(offset) {
                descend_statement(node.body, offset, context);
            }
        }
        Statement::DoWhile(node) => {
            if node.body.range().contains_inclusive(offset) {
                descend_statement(node.body, offset, context);
            } else if covers(node.condition, offset) {
                descend_expression(node.condition, offset, context);
            }
        }
        Statement::For(node) => {
            if let Some(initializer) = node.initializer {
                if initializer.range().contains_inclusive(offset) {
                    descend_statement(initializer, offset, context);
                    return;
                }
            }
            for clause in [node.condition, node.update].into_iter().flatten() {
                if covers(clause, offset) {
                    descend_expression(clause, offset, context);
                    return;
                }
            }
            if node.body.range().contains_inclusive(offset) {
                descend_statement(node.body, offset, context);
            }
        }
        Statement::ForIn(node) => {
            if covers(node.object, offset) {
                descend_expression(node.object, offset, context);
            } else if node.body.range().contains_inclusive(offset) {
                descend_statement(node.body, offset, context);
            }
        }
        Statement::ForOf(node) => {
            if covers(node.iterated, offset) {
                descend_expression(node.iterated, offset, context);
            } else if node.body.range().contains_inclusive(offset) {
                descend_statement(node.body, offset, context);
            }
        }
        Statement::Return(node) => {
            if let Some(expression) = node.expression {
                if covers(expression, offset) {
                    descend_expression(expression, offset, context);
                }
            }
        }
        Statement::Throw(node) => {
            if covers(node.expression, offset) {
                descend_expression(node.expression, offset, context);
            }
        }
        Statement::Try(node) => {
            if node.try_block.data.range.contains_inclusive(offset) {
                descend_block(node.try_block, offset, context);
                return;
            }
            if let Some(catch) = &node.catch_clause {
                if catch.block.data.range.contains_inclusive(offset) {
                    descend_block(catch.block, offset, context);
                    return;
                }
            }
            if let Some(finally) = node.finally_block {
                if finally.data.range.contains_inclusive(offset) {
                    descend_block(finally, offset, context);
                }
            }
        }
        Statement::Import(_) => {}
    }
}

fn descend_member<'a>(member: &'a ClassMember<'a>, offset: u32, context: &mut CursorContext<'a>) {
    context.path.push(PathNode::Member(member));
    match member {
        ClassMember::Constructor(node) => {
            if !descend_parameters(node.parameters, offset, context) {
                descend_block(node.body, offset, context);
            }
        }
        ClassMember::Method(node) => {
            if !descend_parameters(node.parameters, offset, context) {
                descend_block(node.body, offset, context);
            }
        }
        ClassMember::Field(node) => {
            if let Some(initializer) = node.initializer {
                if covers(initializer, offset) {
                    descend_expression(initializer, offset, context);
                }
            }
        }
    }
}

fn descend_block<'a>(block: &'a Block<'a>, offset: u32, context: &mut CursorContext<'a>) {
    let hit = block
        .statements
        .iter()
        .find(|statement| statement.range().contains_inclusive(offset));
    if let Some(statement) = hit {
        descend_statement(statement, offset, context);
    }
}

fn descend_parameters<'a>(
    parameters: &'a [Parameter<'a>],
    offset: u32,
    context: &mut CursorContext<'a>,
) -> bool {
    for parameter in parameters.iter() {
        if let Some(default) = parameter.default {
            if covers(default, offset) {
                descend_expression(default, offset, context);
                return true;
            }
        }
    }
    false
}

fn descend_expression<'a>(
    expression: &'a Expression<'a>,
    offset: u32,
    context: &mut CursorContext<'a>,
) {
    match covering_child(expression, offset) {
        Some(Child::Expression(child)) => {
            context.path.push(PathNode::Expression(expression));
            descend_expression(child, offset, context);
        }
        Some(Child::Block(block)) => {
            context.path.push(PathNode::Expression(expression));
            descend_block(block, offset, context);
        }
        Some(Child::Default(parameters)) => {
            context.path.push(PathNode::Expression(expression));
            descend_parameters(parameters, offset, context);
        }
        None => context.target = Some(expression),
    }
}

enum Child<'a> {
    Expression(&'a Expression<'a>),
    Block(&'a Block<'a>),
    Default(&'a [Parameter<'a>]),
}

/// The direct child of `expression` covering `offset`, if any. Member
/// names and object property keys are name fields, not children; a cursor
/// on one stays on the containing expression.
fn covering_child<'a>(expression: &'a Expression<'a>, offset: u32) -> Option<Child<'a>> {
    let first = |candidates: &'a [&'a Expression<'a>]| {
        candidates
            .iter()
            .copied()
            .find(|candidate| covers(candidate, offset))
            .map(Child::Expression)
    };
    match expression {
        Expression::Number(_)
        | Expression::String(_)
        | Expression::Boolean(_)
        | Expression::Null(_)
        | Expression::Undefined(_)
        | Expression::Identifier(_)
        | Expression::This(_)
        | Expression::Super(_)
        | Expression::Missing(_) => None,
        Expression::Template(node) => first(node.expressions),
        Expression::Array(node) => first(node.elements),
        Expression::Object(node) => {
            for property in node.properties.iter() {
                if let PropertyKey::Computed(key) = property.name {
                    if covers(key, offset) {
                        return Some(Child::Expression(key));
                    }
                }
                if let Some(value) = property.value {
                    if covers(value, offset) {
                        return Some(Child::Expression(value));
                    }
                }
            }
            None
        }
        Expression::Paren(node) => covers(node.expression, offset)
            .then_some(Child::Expression(node.expression)),
        Expression::Member(node) => {
            covers(node.object, offset).then_some(Child::Expression(node.object))
        }
        Expression::Index(node) => [node.object, node.index]
            .into_iter()
            .find(|candidate| covers(candidate, offset))
            .map(Child::Expression),
        Expression::Call(node) => {
            if covers(node.callee, offset) {
                return Some(Child::Expression(node.callee));
            }
            first(node.arguments)
        }
        Expression::New(node) => {
            if covers(node.callee, offset) {
                return Some(Child::Expression(node.callee));
            }
            first(node.arguments)
        }
        Expression::Unary(node) => {
            covers(node.operand, offset).then_some(Child::Expression(node.operand))
        }
        Expression::Update(node) => {
            covers(node.operand, offset).then_some(Child::Expression(node.operand))
        }
        Expression::Binary(node) => [node.left, node.right]
            .into_iter()
            .find(|candidate| covers(candidate, offset))
            .map(Child::Expression),
        Expression::Conditional(node) => [node.condition, node.when_true, node.when_false]
            .into_iter()
            .find(|candidate| covers(candidate, offset))
            .map(Child::Expression),
        Expression::Assignment(node) => [node.target, node.value]
            .into_iter()
            .find(|candidate| covers(candidate, offset))
            .map(Child::Expression),
        Expression::Arrow(node) => {
            if has_default_at(node.parameters, offset) {
                return Some(Child::Default(node.parameters));
            }
            match node.body {
                ArrowBody::Expression(body) => {
                    covers(body, offset).then_some(Child::Expression(body))
                }
                ArrowBody::Block(body) => body
                    .data
                    .range
                    .contains_inclusive(offset)
                    .then_some(Child::Block(body)),
            }
        }
        Expression::Function(node) => {
            if has_default_at(node.parameters, offset) {
                return Some(Child::Default(node.parameters));
            }
            node.body
                .data
                .range
                .contains_inclusive(offset)
                .then_some(Child::Block(node.body))
        }
    }
}

fn has_default_at(parameters: &[Parameter<'_>], offset: u32) -> bool {
    parameters
        .iter()
        .any(|parameter| parameter.default.is_some_and(|default| covers(default, offset)))
}

// ============================================================================
// Word scanning
// ============================================================================

/// The identifier-shaped word around `offset`, as `(start, end)` byte
/// offsets. `None` when the offset touches no word character.
pub fn word_at(text: &str, offset: u32) -> Option<(u32, u32)> {
    let mut anchor = (offset as usize).min(text.len());
    while anchor > 0 && !text.is_char_boundary(anchor) {
        anchor -= 1;
    }
    let mut start = anchor;
    while start > 0 {
        let previous = text[..start].chars().next_back()?;
        if !is_word_char(previous) {
            break;
        }
        start -= previous.len_utf8();
    }
    let mut end = anchor;
    for next in text[anchor..].chars() {
        if !is_word_char(next) {
            break;
        }
        end += next.len_utf8();
    }
    (start < end).then_some((start as u32, end as u32))
}

/// Where a dot-member completion's receiver ends, given the start of the
/// typed (possibly empty) member prefix. `None` when the prefix does not
/// follow a `.`.
pub fn member_receiver_end(text: &str, prefix_start: u32) -> Option<u32> {
    let bytes = text.as_bytes();
    let mut cursor = (prefix_start as usize).min(bytes.len());
    if cursor == 0 || bytes[cursor - 1] != b'.' {
        return None;
    }
    cursor -= 1;
    while cursor > 0 && bytes[cursor - 1].is_ascii_whitespace() {
        cursor -= 1;
    }
    (cursor > 0).then_some(cursor as u32)
}

fn is_word_char(ch: char) -> bool {
    ch == '$' || ch == '_' || UnicodeXID::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_at_scans_both_directions() {
        let text = "let counter = 1;";
        assert_eq!(word_at(text, 6), Some((4, 11)));
        assert_eq!(word_at(text, 4), Some((4, 11)));
        assert_eq!(word_at(text, 11), Some((4, 11)));
        assert_eq!(word_at(text, 12), None);
    }

    #[test]
    fn test_word_at_handles_dollars_and_unicode() {
        let text = "$häuser + 1";
        let (start, end) = word_at(text, 3).unwrap();
        assert_eq!(&text[start as usize..end as usize], "$häuser");
        assert_eq!(word_at(text, 9), None);
    }

    #[test]
    fn test_word_at_end_of_text() {
        assert_eq!(word_at("abc", 3), Some((0, 3)));
        assert_eq!(word_at("", 0), None);
        assert_eq!(word_at("abc", 99), Some((0, 3)));
    }

    #[test]
    fn test_member_receiver_end_requires_a_dot() {
        let text = "pet.speak";
        assert_eq!(member_receiver_end(text, 4), Some(3));
        assert_eq!(member_receiver_end(text, 0), None);
        assert_eq!(member_receiver_end("pet", 3), None);
    }

    #[test]
    fn test_member_receiver_end_skips_whitespace_before_dot() {
        let text = "pet\n    .speak";
        assert_eq!(member_receiver_end(text, 9), Some(3));
    }

    #[test]
    fn test_member_receiver_end_at_document_start() {
        assert_eq!(member_receiver_end(".x", 1), None);
    }
}
