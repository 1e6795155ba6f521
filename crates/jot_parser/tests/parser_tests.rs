//! Parser integration tests.
//!
//! Verifies that the parser builds the right AST shapes from Jot source and
//! that malformed input degrades into diagnostics instead of panics.

use jot_ast::node::*;
use jot_ast::types::*;
use jot_ast::AstArena;
use jot_parser::{ParseOutput, Parser};

/// Parse and return (top-level statement count, error count).
fn parse(source: &str) -> (usize, usize) {
    let arena = AstArena::new();
    let output = Parser::new(&arena, "test.jot", source).parse();
    (output.source_file.statements.len(), output.diagnostics.error_count())
}

fn parse_in<'a>(arena: &'a AstArena, source: &str) -> ParseOutput<'a> {
    Parser::new(arena, "test.jot", source).parse()
}

fn assert_statement_count(source: &str, expected: usize) {
    let (count, errors) = parse(source);
    assert_eq!(count, expected, "source: {}", source);
    assert_eq!(errors, 0, "unexpected errors in: {}", source);
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_parse_variable_declarations() {
    assert_statement_count("const x = 42;", 1);
    assert_statement_count("let a = 1, b = 2;", 1);
    assert_statement_count("var uninitialized;", 1);
    assert_statement_count("const a = 1; let b = 2; var c = 3;", 3);
}

#[test]
fn test_parse_function_declaration() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "async function go(a, b = 1) { return a + b; }");
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::Function(f) => {
            assert_eq!(f.name.text, "go");
            assert!(f.flags.contains(FunctionFlags::ASYNC));
            assert_eq!(f.parameters.len(), 2);
            assert!(f.parameters[0].default.is_none());
            assert!(f.parameters[1].default.is_some());
        }
        other => panic!("expected function declaration, got {:?}", other),
    }
}

#[test]
fn test_parse_generator_sets_flag() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "function* numbers() {}");
    match &output.source_file.statements[0] {
        Statement::Function(f) => assert!(f.flags.contains(FunctionFlags::GENERATOR)),
        other => panic!("expected function declaration, got {:?}", other),
    }
}

#[test]
fn test_parse_class_with_members() {
    let source = r#"
        class Person extends Being {
            species = "human";
            static count = 0;
            constructor(name) {
                this.name = name;
            }
            greet() {
                return "Hello, " + this.name;
            }
        }
    "#;
    let arena = AstArena::new();
    let output = parse_in(&arena, source);
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::Class(class) => {
            assert_eq!(class.name.text, "Person");
            assert_eq!(class.super_class.unwrap().text, "Being");
            assert_eq!(class.members.len(), 4);
            match &class.members[1] {
                ClassMember::Field(field) => {
                    assert_eq!(field.name.text, "count");
                    assert!(field.modifiers.contains(ModifierFlags::STATIC));
                }
                other => panic!("expected static field, got {:?}", other),
            }
            assert!(matches!(class.members[2], ClassMember::Constructor(_)));
        }
        other => panic!("expected class declaration, got {:?}", other),
    }
}

#[test]
fn test_second_constructor_is_an_error() {
    let (_count, errors) =
        parse("class A { constructor() {} constructor(x) {} }");
    assert_eq!(errors, 1);
}

#[test]
fn test_parse_export_modifier() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "export const limit = 10;\nexport function f() {}");
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::Variable(v) => assert!(v.modifiers.contains(ModifierFlags::EXPORT)),
        other => panic!("expected variable statement, got {:?}", other),
    }
    match &output.source_file.statements[1] {
        Statement::Function(f) => assert!(f.modifiers.contains(ModifierFlags::EXPORT)),
        other => panic!("expected function declaration, got {:?}", other),
    }
}

#[test]
fn test_parse_import_forms() {
    assert_statement_count("import \"side-effect\";", 1);
    assert_statement_count("import util from \"util\";", 1);
    assert_statement_count("import { a, b } from \"mod\";", 1);
    let arena = AstArena::new();
    let output = parse_in(&arena, "import def, { x, y } from \"mod\";");
    match &output.source_file.statements[0] {
        Statement::Import(import) => {
            assert_eq!(import.default_binding.unwrap().text, "def");
            assert_eq!(import.named_bindings.len(), 2);
            assert_eq!(import.module.value(), "mod");
        }
        other => panic!("expected import, got {:?}", other),
    }
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_parse_control_flow() {
    assert_statement_count("if (a) { b(); } else if (c) { d(); } else { e(); }", 1);
    assert_statement_count("while (x < 10) { x++; }", 1);
    assert_statement_count("do { tick(); } while (running);", 1);
    assert_statement_count("for (let i = 0; i < 10; i++) { log(i); }", 1);
    assert_statement_count("for (;;) { break; }", 1);
    assert_statement_count("try { risky(); } catch (e) { handle(e); } finally { done(); }", 1);
}

#[test]
fn test_parse_for_in_and_for_of() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "for (const key in obj) {}\nfor (let item of list) {}");
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::ForIn(f) => {
            assert_eq!(f.form, DeclarationForm::Const);
            assert_eq!(f.binding.text, "key");
        }
        other => panic!("expected for-in, got {:?}", other),
    }
    match &output.source_file.statements[1] {
        Statement::ForOf(f) => {
            assert_eq!(f.form, DeclarationForm::Let);
            assert_eq!(f.binding.text, "item");
        }
        other => panic!("expected for-of, got {:?}", other),
    }
}

#[test]
fn test_try_without_catch_or_finally_is_an_error() {
    let (count, errors) = parse("try { f(); }");
    assert_eq!(count, 1);
    assert_eq!(errors, 1);
}

#[test]
fn test_semicolon_insertion_at_line_breaks() {
    assert_statement_count("let a = 1\nlet b = 2\na + b", 3);
}

#[test]
fn test_missing_semicolon_without_line_break_is_an_error() {
    let (_count, errors) = parse("let a = 1 let b = 2");
    assert!(errors >= 1);
}

#[test]
fn test_return_before_line_break_returns_nothing() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "function f() { return\n1; }");
    match &output.source_file.statements[0] {
        Statement::Function(f) => match &f.body.statements[0] {
            Statement::Return(r) => assert!(r.expression.is_none()),
            other => panic!("expected return, got {:?}", other),
        },
        other => panic!("expected function, got {:?}", other),
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_binary_precedence_shapes_the_tree() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "a + b * c;");
    match &output.source_file.statements[0] {
        Statement::Expression(stmt) => match stmt.expression {
            Expression::Binary(add) => {
                assert_eq!(add.operator, BinaryOperator::Add);
                match add.right {
                    Expression::Binary(mul) => {
                        assert_eq!(mul.operator, BinaryOperator::Multiply)
                    }
                    other => panic!("expected multiply on the right, got {:?}", other),
                }
            }
            other => panic!("expected binary expression, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "a = b = 1;");
    match &output.source_file.statements[0] {
        Statement::Expression(stmt) => match stmt.expression {
            Expression::Assignment(outer) => {
                assert!(matches!(outer.value, Expression::Assignment(_)));
            }
            other => panic!("expected assignment, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_assignment_to_literal_is_an_error() {
    let (_count, errors) = parse("1 = x;");
    assert_eq!(errors, 1);
}

#[test]
fn test_parse_call_and_member_chain() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "app.router.handle(request)[0];");
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::Expression(stmt) => assert!(matches!(stmt.expression, Expression::Index(_))),
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_member_name_may_be_a_keyword() {
    assert_statement_count("config.import.from;", 1);
    assert_statement_count("let styles = { static: 1, class: \"a\" };", 1);
}

#[test]
fn test_parse_arrow_functions() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let f = x => x * 2;\nlet g = (a, b) => { return a + b; };");
    assert!(output.diagnostics.is_empty());
    let first = match &output.source_file.statements[0] {
        Statement::Variable(v) => v.declarations[0].initializer.unwrap(),
        other => panic!("expected variable, got {:?}", other),
    };
    match first {
        Expression::Arrow(arrow) => {
            assert_eq!(arrow.parameters.len(), 1);
            assert!(matches!(arrow.body, ArrowBody::Expression(_)));
        }
        other => panic!("expected arrow, got {:?}", other),
    }
    let second = match &output.source_file.statements[1] {
        Statement::Variable(v) => v.declarations[0].initializer.unwrap(),
        other => panic!("expected variable, got {:?}", other),
    };
    match second {
        Expression::Arrow(arrow) => {
            assert_eq!(arrow.parameters.len(), 2);
            assert!(matches!(arrow.body, ArrowBody::Block(_)));
        }
        other => panic!("expected arrow, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_expression_is_not_an_arrow() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let x = (a + b) * c;");
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::Variable(v) => match v.declarations[0].initializer.unwrap() {
            Expression::Binary(b) => assert_eq!(b.operator, BinaryOperator::Multiply),
            other => panic!("expected binary, got {:?}", other),
        },
        other => panic!("expected variable, got {:?}", other),
    }
}

#[test]
fn test_parse_template_literal_with_interpolations() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let s = `a${x}b${y}c`;");
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::Variable(v) => match v.declarations[0].initializer.unwrap() {
            Expression::Template(t) => {
                assert_eq!(t.expressions.len(), 2);
                assert_eq!(t.chunks.len(), 3);
                assert_eq!(t.chunks[0], "a");
                assert_eq!(t.chunks[2], "c");
            }
            other => panic!("expected template, got {:?}", other),
        },
        other => panic!("expected variable, got {:?}", other),
    }
}

#[test]
fn test_parse_object_literal_forms() {
    let arena = AstArena::new();
    let output = parse_in(
        &arena,
        "let o = { plain: 1, shorthand, \"quoted\": 2, [computed]: 3, method() { return 4; } };",
    );
    assert!(output.diagnostics.is_empty());
    match &output.source_file.statements[0] {
        Statement::Variable(v) => match v.declarations[0].initializer.unwrap() {
            Expression::Object(o) => {
                assert_eq!(o.properties.len(), 5);
                assert!(o.properties[1].value.is_none());
                assert!(matches!(o.properties[4].value, Some(Expression::Function(_))));
            }
            other => panic!("expected object, got {:?}", other),
        },
        other => panic!("expected variable, got {:?}", other),
    }
}

#[test]
fn test_parse_new_expressions() {
    assert_statement_count("let d = new Date();", 1);
    assert_statement_count("let p = new ns.Point(1, 2);", 1);
    assert_statement_count("let q = new Queue;", 1);
}

#[test]
fn test_conditional_and_logical_operators() {
    assert_statement_count("let r = ok ? a ?? b : c || d;", 1);
    assert_statement_count("let s = x instanceof Foo && \"k\" in bag;", 1);
}

// ============================================================================
// Error recovery
// ============================================================================

#[test]
fn test_recovery_continues_after_garbage() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let a = ;\nlet b = 2;");
    assert!(output.diagnostics.has_errors());
    assert_eq!(output.source_file.statements.len(), 2);
    match &output.source_file.statements[1] {
        Statement::Variable(v) => assert_eq!(v.declarations[0].name.text, "b"),
        other => panic!("expected variable, got {:?}", other),
    }
}

#[test]
fn test_unterminated_string_reports_and_recovers() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let s = \"oops\nlet t = 2;");
    let codes: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&1001), "missing J1001 in {:?}", codes);
    assert_eq!(output.source_file.statements.len(), 2);
}

#[test]
fn test_unterminated_block_comment_reports() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let a = 1;\n/* never closed\nstill comment");
    let codes: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&1003), "missing J1003 in {:?}", codes);
}

#[test]
fn test_closed_multiline_comment_is_not_flagged() {
    let (count, errors) = parse("let a = 1;\n/* fine\nstill fine */");
    assert_eq!(count, 1);
    assert_eq!(errors, 0);
}

#[test]
fn test_unterminated_template_reports() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let s = `no end");
    let codes: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&1002), "missing J1002 in {:?}", codes);
}

#[test]
fn test_unexpected_character_reports_and_skips() {
    let arena = AstArena::new();
    let output = parse_in(&arena, "let a = 1; # let b = 2;");
    let codes: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&1004), "missing J1004 in {:?}", codes);
}

#[test]
fn test_deep_nesting_degrades_gracefully() {
    let mut source = String::from("let x = ");
    for _ in 0..400 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..400 {
        source.push(')');
    }
    source.push(';');
    let arena = AstArena::new();
    let output = parse_in(&arena, &source);
    let codes: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&2008), "missing J2008 in {:?}", codes);
}

#[test]
fn test_node_ranges_cover_their_text() {
    let source = "let answer = 40 + 2;";
    let arena = AstArena::new();
    let output = parse_in(&arena, source);
    let stmt = &output.source_file.statements[0];
    assert_eq!(stmt.range().pos, 0);
    assert_eq!(stmt.range().end, source.len() as u32);
    match stmt {
        Statement::Variable(v) => {
            let name = v.declarations[0].name;
            let range = name.data.range;
            assert_eq!(&source[range.pos as usize..range.end as usize], "answer");
        }
        other => panic!("expected variable, got {:?}", other),
    }
}

#[test]
fn test_empty_source_parses_to_empty_file() {
    let (count, errors) = parse("");
    assert_eq!(count, 0);
    assert_eq!(errors, 0);
}

#[test]
fn test_stray_close_brace_at_top_level() {
    let (count, errors) = parse("}\nlet a = 1;");
    assert_eq!(count, 1);
    assert!(errors >= 1);
}
