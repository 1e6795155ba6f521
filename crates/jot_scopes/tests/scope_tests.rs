//! Scope builder integration tests.
//!
//! Each test runs the parse -> bind pipeline on a small program and
//! queries the resulting scope tree.

use jot_ast::AstArena;
use jot_parser::Parser;
use jot_scopes::{BindOutput, ScopeBuilder, ScopeKind, SymbolKind};

/// Helper: parse and bind source. Panics on parse errors so scope
/// assertions never run against a mangled tree.
fn bind<'a>(arena: &'a AstArena, source: &str) -> BindOutput<'a> {
    let parsed = Parser::new(arena, "test.jot", source).parse();
    assert!(
        !parsed.diagnostics.has_errors(),
        "unexpected parse errors: {:?}",
        parsed.diagnostics.diagnostics()
    );
    ScopeBuilder::bind(&parsed.source_file)
}

/// Byte offset of the first occurrence of `needle`.
fn offset_of(source: &str, needle: &str) -> u32 {
    source.find(needle).expect("needle not found in source") as u32
}

/// Byte offset of the last occurrence of `needle`.
fn last_offset_of(source: &str, needle: &str) -> u32 {
    source.rfind(needle).expect("needle not found in source") as u32
}

// ============================================================================
// Symbol Creation
// ============================================================================

#[test]
fn test_bind_empty_file() {
    let arena = AstArena::new();
    let bound = bind(&arena, "");
    assert_eq!(bound.scope_tree.scope_count(), 1);
    assert_eq!(bound.scope_tree.symbol_count(), 0);
    assert!(bound.diagnostics.is_empty());
}

#[test]
fn test_bind_top_level_declarations() {
    let arena = AstArena::new();
    let source = "let a = 1;\nconst b = 2;\nvar c;\nfunction f() {}\nclass Widget {}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;
    let root = tree.root();

    // Hoisted declarations bind ahead of textual order.
    let names: Vec<&str> = tree.scope(root).symbols().map(|id| tree.symbol(id).name).collect();
    assert_eq!(names, vec!["c", "f", "a", "b", "Widget"]);

    let kind_of = |name: &str| tree.symbol(tree.resolve_in(root, name).unwrap()).kind;
    assert_eq!(kind_of("a"), SymbolKind::Variable);
    assert_eq!(kind_of("b"), SymbolKind::Constant);
    assert_eq!(kind_of("c"), SymbolKind::Variable);
    assert_eq!(kind_of("f"), SymbolKind::Function);
    assert_eq!(kind_of("Widget"), SymbolKind::Class);
    assert!(bound.diagnostics.is_empty());
}

#[test]
fn test_import_bindings() {
    let arena = AstArena::new();
    let source = "import logger, { info, warn } from \"log\";\ninfo(\"hi\");";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    assert_eq!(tree.scope(tree.root()).symbol_count(), 3);
    let info = tree.resolve_in(tree.root(), "info").unwrap();
    assert_eq!(tree.symbol(info).kind, SymbolKind::Import);
    assert_eq!(tree.symbol(info).references.len(), 1);
    assert!(tree.resolve_in(tree.root(), "logger").is_some());
    assert!(tree.resolve_in(tree.root(), "warn").is_some());
}

#[test]
fn test_export_modifier_marks_symbols() {
    let arena = AstArena::new();
    let source = "export const limit = 10;\nexport function run() {}\nlet hidden = 1;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;
    let root = tree.root();

    assert!(tree.symbol(tree.resolve_in(root, "limit").unwrap()).is_exported);
    assert!(tree.symbol(tree.resolve_in(root, "run").unwrap()).is_exported);
    assert!(!tree.symbol(tree.resolve_in(root, "hidden").unwrap()).is_exported);
}

#[test]
fn test_class_members_are_not_scope_symbols() {
    let arena = AstArena::new();
    let source = "class Counter {\n    count = 0;\n    bump() { return this.count; }\n}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    // Members resolve through the class type, not the scope chain.
    assert_eq!(tree.symbol_count(), 1);
    let counter = tree.resolve_in(tree.root(), "Counter").unwrap();
    assert_eq!(tree.symbol(counter).kind, SymbolKind::Class);
}

// ============================================================================
// Scopes and Hoisting
// ============================================================================

#[test]
fn test_scope_tree_shape() {
    let arena = AstArena::new();
    let source = "function outer() {\n    if (true) {\n        let x = 1;\n    }\n}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    // Global, function body, then the if block.
    assert_eq!(tree.scope_count(), 3);
    let function_scope = tree.scope_at(offset_of(source, "if"));
    assert_eq!(tree.scope(function_scope).kind, ScopeKind::Function);
    assert_eq!(tree.scope(function_scope).parent, Some(tree.root()));
    let block_scope = tree.scope_at(offset_of(source, "x = 1"));
    assert_eq!(tree.scope(block_scope).kind, ScopeKind::Block);
    assert_eq!(tree.scope(block_scope).parent, Some(function_scope));
}

#[test]
fn test_block_shadowing() {
    let arena = AstArena::new();
    let source = "let x = 1;\n{\n    let x = 2;\n    x;\n}\nx;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let inner = tree.resolve("x", offset_of(source, "x;")).unwrap();
    let outer = tree.resolve("x", last_offset_of(source, "x;")).unwrap();
    assert_ne!(inner, outer);
    assert_eq!(tree.symbol(inner).references.len(), 1);
    assert_eq!(tree.symbol(outer).references.len(), 1);

    // Only the shadowing `x` is visible from inside the block.
    let visible = tree.visible_symbols_at(offset_of(source, "x;"));
    let xs: Vec<_> = visible.iter().filter(|&&id| tree.symbol(id).name == "x").collect();
    assert_eq!(xs, vec![&inner]);
    assert!(bound.diagnostics.is_empty());
}

#[test]
fn test_var_hoists_to_function_scope() {
    let arena = AstArena::new();
    let source = "function wrap() {\n    {\n        var leaked = 1;\n    }\n    return leaked;\n}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let leaked = tree.resolve("leaked", offset_of(source, "leaked;")).unwrap();
    assert_eq!(tree.scope(tree.symbol(leaked).scope).kind, ScopeKind::Function);
    assert_eq!(tree.symbol(leaked).references.len(), 1);
    assert!(bound.diagnostics.is_empty());
}

#[test]
fn test_function_visible_before_declaration() {
    let arena = AstArena::new();
    let source = "setup();\nfunction setup() {}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let setup = tree.resolve("setup", 0).unwrap();
    assert_eq!(tree.symbol(setup).kind, SymbolKind::Function);
    assert_eq!(tree.symbol(setup).references.len(), 1);
    assert_eq!(tree.symbol(setup).references[0].pos, 0);
}

#[test]
fn test_for_in_var_binding_hoists() {
    let arena = AstArena::new();
    let source = "function keys(obj) {\n    for (var k in obj) {}\n    return k;\n}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let k = tree.resolve("k", offset_of(source, "k;")).unwrap();
    assert_eq!(tree.scope(tree.symbol(k).scope).kind, ScopeKind::Function);
    assert_eq!(tree.symbol(k).references.len(), 1);
}

#[test]
fn test_for_of_binding_scoped_to_loop() {
    let arena = AstArena::new();
    let source = "let items = [1, 2, 3];\nfor (const item of items) {\n    use(item);\n}\nitems;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let item = tree.resolve("item", offset_of(source, "item);")).unwrap();
    assert_eq!(tree.symbol(item).kind, SymbolKind::Constant);
    assert_eq!(tree.symbol(item).references.len(), 1);
    assert!(tree.resolve("item", offset_of(source, "items;")).is_none());

    let items = tree.resolve_in(tree.root(), "items").unwrap();
    assert_eq!(tree.symbol(items).references.len(), 2);
}

#[test]
fn test_catch_binding_scoped_to_catch() {
    let arena = AstArena::new();
    let source = "try {\n    risky();\n} catch (err) {\n    log(err);\n}\nlet after = 1;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let err = tree.resolve("err", offset_of(source, "err);")).unwrap();
    assert_eq!(tree.scope(tree.symbol(err).scope).kind, ScopeKind::Catch);
    assert_eq!(tree.symbol(err).references.len(), 1);
    assert!(tree.resolve("err", offset_of(source, "after")).is_none());
}

#[test]
fn test_parameters_bound_in_function_scope() {
    let arena = AstArena::new();
    let source = "function add(a, b) {\n    return a + b;\n}\nlet total = 0;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let a = tree.resolve("a", offset_of(source, "a + b")).unwrap();
    assert_eq!(tree.symbol(a).kind, SymbolKind::Parameter);
    assert_eq!(tree.symbol(a).references.len(), 1);
    assert!(tree.resolve("a", offset_of(source, "total")).is_none());
}

#[test]
fn test_parameter_default_references_earlier_parameter() {
    let arena = AstArena::new();
    let source = "function pad(width, fill = width) { return fill; }";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let width = tree.resolve("width", offset_of(source, "width)")).unwrap();
    assert_eq!(tree.symbol(width).kind, SymbolKind::Parameter);
    assert_eq!(tree.symbol(width).references.len(), 1);
}

#[test]
fn test_arrow_parameters_live_in_lambda_scope() {
    let arena = AstArena::new();
    let source = "const twice = (n) => n * 2;\nlet n = 10;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let inner = tree.resolve("n", offset_of(source, "n * 2")).unwrap();
    assert_eq!(tree.symbol(inner).kind, SymbolKind::Parameter);
    assert_eq!(tree.scope(tree.symbol(inner).scope).kind, ScopeKind::Lambda);
    let outer = tree.resolve_in(tree.root(), "n").unwrap();
    assert_ne!(inner, outer);
}

#[test]
fn test_named_function_expression_binds_in_own_body() {
    let arena = AstArena::new();
    let source = "const fact = function go(n) {\n    return n > 1 ? n * go(n - 1) : 1;\n};";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let go = tree.resolve("go", offset_of(source, "go(n - 1)")).unwrap();
    assert_eq!(tree.symbol(go).kind, SymbolKind::Function);
    assert_eq!(tree.symbol(go).references.len(), 1);
    // The name is not visible outside the expression's own body.
    assert!(tree.resolve_in(tree.root(), "go").is_none());
}

#[test]
fn test_method_scope_nests_in_class_scope() {
    let arena = AstArena::new();
    let source = "class Greeter {\n    greet(name) {\n        return name;\n    }\n}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let inside = offset_of(source, "name;");
    let method_scope = tree.scope_at(inside);
    assert_eq!(tree.scope(method_scope).kind, ScopeKind::Function);
    let class_scope = tree.scope(method_scope).parent.unwrap();
    assert_eq!(tree.scope(class_scope).kind, ScopeKind::Class);

    let name = tree.resolve("name", inside).unwrap();
    assert_eq!(tree.symbol(name).kind, SymbolKind::Parameter);
}

// ============================================================================
// Redeclaration
// ============================================================================

#[test]
fn test_duplicate_let_reported() {
    let arena = AstArena::new();
    let bound = bind(&arena, "let x = 1;\nlet x = 2;");
    assert_eq!(bound.diagnostics.len(), 1);
    let diagnostic = &bound.diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.code, 2501);
    assert!(diagnostic.message_text.contains("'x'"));
    assert_eq!(bound.scope_tree.symbol_count(), 1);
}

#[test]
fn test_var_redeclaration_merges() {
    let arena = AstArena::new();
    let bound = bind(&arena, "var x = 1;\nvar x = 2;\nfunction f() {}\nfunction f() {}");
    assert!(bound.diagnostics.is_empty());
    let tree = &bound.scope_tree;
    assert_eq!(tree.scope(tree.root()).symbol_count(), 2);
}

#[test]
fn test_let_then_var_clash_reported() {
    let arena = AstArena::new();
    let bound = bind(&arena, "let y = 1;\nvar y = 2;");
    assert_eq!(bound.diagnostics.len(), 1);
    assert_eq!(bound.diagnostics.diagnostics()[0].code, 2501);
}

#[test]
fn test_shadowing_across_scopes_is_not_redeclaration() {
    let arena = AstArena::new();
    let bound = bind(&arena, "let x = 1;\nfunction f(x) {\n    let y = x;\n}");
    assert!(bound.diagnostics.is_empty());
}

#[test]
fn test_duplicate_class_member_warns() {
    let arena = AstArena::new();
    let source = "class Box {\n    size() { return 1; }\n    size() { return 2; }\n    static size() { return 3; }\n}";
    let bound = bind(&arena, source);

    // Static and instance members live in separate slots.
    assert_eq!(bound.diagnostics.len(), 1);
    let diagnostic = &bound.diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.code, 2503);
    assert!(!diagnostic.is_error());
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_super_class_reference_recorded() {
    let arena = AstArena::new();
    let source = "class Animal {}\nclass Dog extends Animal {}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let animal = tree.resolve_in(tree.root(), "Animal").unwrap();
    assert_eq!(tree.symbol(animal).references.len(), 1);
    assert_eq!(tree.symbol(animal).references[0].pos, last_offset_of(source, "Animal"));
}

#[test]
fn test_shorthand_property_is_a_reference() {
    let arena = AstArena::new();
    let source = "let width = 10;\nlet box = { width, height: width * 2 };";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let width = tree.resolve_in(tree.root(), "width").unwrap();
    assert_eq!(tree.symbol(width).references.len(), 2);
}

#[test]
fn test_member_access_names_are_not_references() {
    let arena = AstArena::new();
    let source = "let list = [1];\nlist.push(2);\nlist.length;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    // `push` and `length` never become symbols or references.
    assert_eq!(tree.symbol_count(), 1);
    let list = tree.resolve_in(tree.root(), "list").unwrap();
    assert_eq!(tree.symbol(list).references.len(), 2);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_visible_symbols_include_outer_scopes() {
    let arena = AstArena::new();
    let source =
        "let base = 1;\nfunction scale(factor) {\n    let local = 2;\n    return base * factor * local;\n}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let inside = offset_of(source, "base * factor");
    let names: Vec<&str> =
        tree.visible_symbols_at(inside).iter().map(|&id| tree.symbol(id).name).collect();
    // Innermost scope first; hoisted `scale` binds ahead of `base`.
    assert_eq!(names, vec!["factor", "local", "scale", "base"]);
}

#[test]
fn test_symbols_with_prefix_walks_chain() {
    let arena = AstArena::new();
    let source =
        "let userName = \"a\";\nfunction greet(userId) {\n    let userRole = \"admin\";\n    return userId;\n}";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let scope = tree.scope_at(offset_of(source, "userId;"));
    let names: Vec<&str> =
        tree.symbols_with_prefix(scope, "user").iter().map(|&id| tree.symbol(id).name).collect();
    assert_eq!(names, vec!["userId", "userRole", "userName"]);
}

#[test]
fn test_symbol_at_declaration_and_reference_agree() {
    let arena = AstArena::new();
    let source = "let total = 0;\ntotal = total + 1;";
    let bound = bind(&arena, source);
    let tree = &bound.scope_tree;

    let at_declaration = tree.symbol_at(offset_of(source, "total") + 1);
    let at_use = tree.symbol_at(last_offset_of(source, "total") + 1);
    assert!(at_declaration.is_some());
    assert_eq!(at_declaration, at_use);
    assert!(tree.symbol_at(offset_of(source, "0")).is_none());
}
