//! AST visitor trait for traversing the syntax tree.
//!
//! Implement [`AstVisitor`] and override the methods you care about; default
//! implementations walk into children. The free `walk_*` functions perform
//! the default dispatch, so an override can prune a subtree by simply not
//! calling them, or descend by calling them explicitly.
//!
//! Declared names (a declarator's binding, a function's name, member names
//! of a dot access) are plain fields on their nodes and are not dispatched
//! as identifier visits; only identifiers in expression position reach
//! [`AstVisitor::visit_identifier`]. Shorthand object properties are the one
//! exception, since their name doubles as a reference.

use crate::node::*;

pub trait AstVisitor<'a>: Sized {
    fn visit_source_file(&mut self, node: &SourceFile<'a>) {
        for stmt in node.statements.iter() {
            self.visit_statement(stmt);
        }
    }

    fn visit_statement(&mut self, stmt: &Statement<'a>) {
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &Expression<'a>) {
        walk_expression(self, expr);
    }

    fn visit_block(&mut self, block: &Block<'a>) {
        for stmt in block.statements.iter() {
            self.visit_statement(stmt);
        }
    }

    fn visit_identifier(&mut self, _node: &Identifier<'a>) {}

    fn visit_class_member(&mut self, member: &ClassMember<'a>) {
        walk_class_member(self, member);
    }

    fn visit_parameter(&mut self, param: &Parameter<'a>) {
        if let Some(default) = param.default {
            self.visit_expression(default);
        }
    }

    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        if let Some(init) = decl.initializer {
            self.visit_expression(init);
        }
    }

    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        if let PropertyKey::Computed(key) = prop.name {
            self.visit_expression(key);
        }
        match prop.value {
            Some(value) => self.visit_expression(value),
            // Shorthand `{ name }` reads the binding called `name`.
            None => {
                if let PropertyKey::Identifier(name) = &prop.name {
                    self.visit_identifier(name);
                }
            }
        }
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause<'a>) {
        self.visit_block(clause.block);
    }
}

pub fn walk_statement<'a, V: AstVisitor<'a>>(visitor: &mut V, stmt: &Statement<'a>) {
    match stmt {
        Statement::Variable(n) => {
            for decl in n.declarations.iter() {
                visitor.visit_variable_declarator(decl);
            }
        }
        Statement::Function(n) => {
            for param in n.parameters.iter() {
                visitor.visit_parameter(param);
            }
            visitor.visit_block(n.body);
        }
        Statement::Class(n) => {
            for member in n.members.iter() {
                visitor.visit_class_member(member);
            }
        }
        Statement::Block(n) => visitor.visit_block(n),
        Statement::Empty(_) => {}
        Statement::Expression(n) => visitor.visit_expression(n.expression),
        Statement::If(n) => {
            visitor.visit_expression(n.condition);
            visitor.visit_statement(n.then_branch);
            if let Some(else_branch) = n.else_branch {
                visitor.visit_statement(else_branch);
            }
        }
        Statement::While(n) => {
            visitor.visit_expression(n.condition);
            visitor.visit_statement(n.body);
        }
        Statement::DoWhile(n) => {
            visitor.visit_statement(n.body);
            visitor.visit_expression(n.condition);
        }
        Statement::For(n) => {
            if let Some(init) = n.initializer {
                visitor.visit_statement(init);
            }
            if let Some(cond) = n.condition {
                visitor.visit_expression(cond);
            }
            if let Some(update) = n.update {
                visitor.visit_expression(update);
            }
            visitor.visit_statement(n.body);
        }
        Statement::ForIn(n) => {
            visitor.visit_expression(n.object);
            visitor.visit_statement(n.body);
        }
        Statement::ForOf(n) => {
            visitor.visit_expression(n.iterated);
            visitor.visit_statement(n.body);
        }
        Statement::Return(n) => {
            if let Some(expr) = n.expression {
                visitor.visit_expression(expr);
            }
        }
        Statement::Break(_) | Statement::Continue(_) => {}
        Statement::Throw(n) => visitor.visit_expression(n.expression),
        Statement::Try(n) => {
            visitor.visit_block(n.try_block);
            if let Some(catch) = &n.catch_clause {
                visitor.visit_catch_clause(catch);
            }
            if let Some(finally) = n.finally_block {
                visitor.visit_block(finally);
            }
        }
        Statement::Import(_) => {}
    }
}

pub fn walk_expression<'a, V: AstVisitor<'a>>(visitor: &mut V, expr: &Expression<'a>) {
    match expr {
        Expression::Number(_)
        | Expression::String(_)
        | Expression::Boolean(_)
        | Expression::Null(_)
        | Expression::Undefined(_)
        | Expression::This(_)
        | Expression::Super(_)
        | Expression::Missing(_) => {}
        Expression::Identifier(n) => visitor.visit_identifier(n),
        Expression::Template(n) => {
            for piece in n.expressions.iter() {
                visitor.visit_expression(piece);
            }
        }
        Expression::Array(n) => {
            for element in n.elements.iter() {
                visitor.visit_expression(element);
            }
        }
        Expression::Object(n) => {
            for prop in n.properties.iter() {
                visitor.visit_object_property(prop);
            }
        }
        Expression::Paren(n) => visitor.visit_expression(n.expression),
        // Member names resolve against the object's type, not the scope.
        Expression::Member(n) => visitor.visit_expression(n.object),
        Expression::Index(n) => {
            visitor.visit_expression(n.object);
            visitor.visit_expression(n.index);
        }
        Expression::Call(n) => {
            visitor.visit_expression(n.callee);
            for arg in n.arguments.iter() {
                visitor.visit_expression(arg);
            }
        }
        Expression::New(n) => {
            visitor.visit_expression(n.callee);
            for arg in n.arguments.iter() {
                visitor.visit_expression(arg);
            }
        }
        Expression::Unary(n) => visitor.visit_expression(n.operand),
        Expression::Update(n) => visitor.visit_expression(n.operand),
        Expression::Binary(n) => {
            visitor.visit_expression(n.left);
            visitor.visit_expression(n.right);
        }
        Expression::Conditional(n) => {
            visitor.visit_expression(n.condition);
            visitor.visit_expression(n.when_true);
            visitor.visit_expression(n.when_false);
        }
        Expression::Assignment(n) => {
            visitor.visit_expression(n.target);
            visitor.visit_expression(n.value);
        }
        Expression::Arrow(n) => {
            for param in n.parameters.iter() {
                visitor.visit_parameter(param);
            }
            match n.body {
                ArrowBody::Expression(body) => visitor.visit_expression(body),
                ArrowBody::Block(body) => visitor.visit_block(body),
            }
        }
        Expression::Function(n) => {
            for param in n.parameters.iter() {
                visitor.visit_parameter(param);
            }
            visitor.visit_block(n.body);
        }
    }
}

pub fn walk_class_member<'a, V: AstVisitor<'a>>(visitor: &mut V, member: &ClassMember<'a>) {
    match member {
        ClassMember::Constructor(n) => {
            for param in n.parameters.iter() {
                visitor.visit_parameter(param);
            }
            visitor.visit_block(n.body);
        }
        ClassMember::Method(n) => {
            for param in n.parameters.iter() {
                visitor.visit_parameter(param);
            }
            visitor.visit_block(n.body);
        }
        ClassMember::Field(n) => {
            if let Some(init) = n.initializer {
                visitor.visit_expression(init);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BinaryOperator, NodeData, NodeId};
    use jot_core::TextRange;

    struct IdentCollector<'a> {
        seen: Vec<&'a str>,
    }

    impl<'a> AstVisitor<'a> for IdentCollector<'a> {
        fn visit_identifier(&mut self, node: &Identifier<'a>) {
            self.seen.push(node.text);
        }
    }

    fn data(id: u32) -> NodeData {
        NodeData::new(NodeId(id), TextRange::empty(0))
    }

    #[test]
    fn test_member_name_is_not_an_identifier_reference() {
        // a.b(c) should surface `a` and `c` but not `b`.
        let a = Expression::Identifier(Identifier { data: data(0), text: "a" });
        let member = Expression::Member(MemberExpression {
            data: data(1),
            object: &a,
            name: Identifier { data: data(2), text: "b" },
        });
        let c = Expression::Identifier(Identifier { data: data(3), text: "c" });
        let args = [&c];
        let call = Expression::Call(CallExpression {
            data: data(4),
            callee: &member,
            arguments: &args,
        });
        let mut collector = IdentCollector { seen: Vec::new() };
        collector.visit_expression(&call);
        assert_eq!(collector.seen, vec!["a", "c"]);
    }

    #[test]
    fn test_shorthand_property_counts_as_reference() {
        let value = Expression::Identifier(Identifier { data: data(0), text: "explicit" });
        let props = [
            ObjectProperty {
                data: data(1),
                name: PropertyKey::Identifier(Identifier { data: data(2), text: "short" }),
                value: None,
            },
            ObjectProperty {
                data: data(3),
                name: PropertyKey::Identifier(Identifier { data: data(4), text: "key" }),
                value: Some(&value),
            },
        ];
        let object = Expression::Object(ObjectLiteral { data: data(5), properties: &props });
        let mut collector = IdentCollector { seen: Vec::new() };
        collector.visit_expression(&object);
        assert_eq!(collector.seen, vec!["short", "explicit"]);
    }

    #[test]
    fn test_walk_reaches_nested_statements() {
        let x = Expression::Identifier(Identifier { data: data(0), text: "x" });
        let one = Expression::Number(NumberLiteral { data: data(1), text: "1" });
        let cmp = Expression::Binary(BinaryExpression {
            data: data(2),
            operator: BinaryOperator::LessThan,
            left: &x,
            right: &one,
        });
        let y = Expression::Identifier(Identifier { data: data(3), text: "y" });
        let then_stmt = Statement::Expression(ExpressionStatement { data: data(4), expression: &y });
        let if_stmt = Statement::If(IfStatement {
            data: data(5),
            condition: &cmp,
            then_branch: &then_stmt,
            else_branch: None,
        });
        let mut collector = IdentCollector { seen: Vec::new() };
        collector.visit_statement(&if_stmt);
        assert_eq!(collector.seen, vec!["x", "y"]);
    }
}
