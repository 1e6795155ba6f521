//! End-to-end tests for the analysis host: document lifecycle, cursor
//! queries, and the incremental token cache.

use jot_analysis::{
    AnalysisHost, CompletionItem, CompletionItemKind, DocumentSymbolKind, HoverContentKind,
    LineEdit,
};

const URI: &str = "main.jot";

fn host_with(source: &str) -> AnalysisHost {
    let mut host = AnalysisHost::new();
    host.open_document(URI.to_string(), source.to_string(), 1);
    host
}

fn offset_of(source: &str, needle: &str) -> u32 {
    source.find(needle).expect("needle not found") as u32
}

fn offset_after(source: &str, needle: &str) -> u32 {
    offset_of(source, needle) + needle.len() as u32
}

fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}

fn find<'a>(items: &'a [CompletionItem], label: &str) -> &'a CompletionItem {
    items
        .iter()
        .find(|item| item.label == label)
        .unwrap_or_else(|| panic!("no completion '{}'", label))
}

// ============================================================================
// Document lifecycle
// ============================================================================

#[test]
fn test_document_text_follows_updates() {
    let mut host = host_with("let a = 1;\n");
    assert_eq!(host.document_text(URI), Some("let a = 1;\n"));

    host.update_document(URI, "let b = 2;\n".to_string(), 2);
    assert_eq!(host.document_text(URI), Some("let b = 2;\n"));
    assert_eq!(host.document(URI).unwrap().version(), 2);

    host.close_document(URI);
    assert_eq!(host.document_text(URI), None);
}

#[test]
fn test_line_edit_keeps_cache_before_the_edit() {
    let v1 = "let a = 1;\nlet b = 2;\nlet c = 3;\nlet d = 4;\n";
    let mut host = host_with(v1);
    // Touch the last line so every line gets a cache entry.
    assert!(!host.tokens_for_line(URI, 3).is_empty());
    let before = host.document(URI).unwrap().cached_line_count();
    assert!(before >= 4);

    let v2 = "let a = 1;\nlet b = 2;\nlet changed = 30;\nlet d = 4;\n";
    let edit = LineEdit { start_line: 2, end_line: 2, new_line_count: 1 };
    host.edit_document(URI, v2.to_string(), edit, 2);

    // Lines before the edit survive; the rest is re-lexed on demand.
    assert_eq!(host.document(URI).unwrap().cached_line_count(), 2);
    let tokens = host.tokens_for_line(URI, 2);
    assert!(tokens.iter().any(|token| token.text == "changed"));
}

#[test]
fn test_unknown_document_answers_empty() {
    let mut host = AnalysisHost::new();
    assert!(host.diagnostics("nope.jot").is_empty());
    assert!(host.completions_at("nope.jot", 0, None).is_empty());
    assert!(host.hover_at("nope.jot", 0).is_none());
    assert!(host.definition_at("nope.jot", 0).is_none());
    assert!(host.references_at("nope.jot", 0, true).is_empty());
    assert!(host.document_symbols("nope.jot").is_empty());
    assert!(host.tokens_for_line("nope.jot", 0).is_empty());
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_diagnostics_empty_for_clean_source() {
    let mut host = host_with("let answer = 42;\nconsole.log(answer);\n");
    assert!(host.diagnostics(URI).is_empty());
}

#[test]
fn test_diagnostics_report_syntax_errors_with_file() {
    let mut host = host_with("let x = ;\n");
    let diagnostics = host.diagnostics(URI);
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|d| d.file.as_deref() == Some(URI)));
    assert!(diagnostics.iter().any(|d| d.is_error()));
}

#[test]
fn test_diagnostics_include_binding_errors() {
    let mut host = host_with("let twice = 1;\nlet twice = 2;\n");
    let diagnostics = host.diagnostics(URI);
    assert!(diagnostics.iter().any(|d| d.code == 2501));
}

#[test]
fn test_analysis_continues_past_a_bad_statement() {
    let mut host = host_with("let = 5;\nlet survivor = 1;\nsurv");
    assert!(!host.diagnostics(URI).is_empty());
    let source = host.document_text(URI).unwrap().to_string();
    let items = host.completions_at(URI, source.len() as u32, None);
    assert_eq!(find(&items, "survivor").detail.as_deref(), Some("number"));
}

// ============================================================================
// Completions: scope
// ============================================================================

#[test]
fn test_scope_completions_filter_by_typed_prefix() {
    let source = "let apple = 1;\nlet avocado = 2;\nap";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert_eq!(labels(&items), vec!["apple"]);
    let apple = find(&items, "apple");
    assert_eq!(apple.kind, CompletionItemKind::Variable);
    assert_eq!(apple.detail.as_deref(), Some("number"));
    assert_eq!(apple.sort_text.as_deref(), Some("0_apple"));
}

#[test]
fn test_scope_completions_accept_explicit_prefix() {
    let source = "let apple = 1;\n";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, Some("ap"));
    assert_eq!(labels(&items), vec!["apple"]);
}

#[test]
fn test_completion_detail_is_the_type_signature() {
    let source = "function greet(name) {\n    return \"hi \" + name;\n}\ngre";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    let greet = find(&items, "greet");
    assert_eq!(greet.kind, CompletionItemKind::Function);
    assert_eq!(greet.detail.as_deref(), Some("(name: any) => string"));
}

#[test]
fn test_completions_inner_scope_shadows_outer() {
    let source = "let value = \"outer\";\nfunction inner() {\n    let value = 1;\n    val\n}\n";
    let mut host = host_with(source);
    let offset = offset_after(source, "    val");
    let items = host.completions_at(URI, offset, None);
    assert_eq!(labels(&items), vec!["value"]);
    assert_eq!(find(&items, "value").detail.as_deref(), Some("number"));
}

#[test]
fn test_completions_prefix_is_case_insensitive() {
    let source = "let Counter = 1;\ncou";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert_eq!(labels(&items), vec!["Counter"]);
}

#[test]
fn test_keywords_come_after_symbols() {
    let source = "let fortune = 1;\nfo";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert_eq!(labels(&items), vec!["fortune", "for", "from"]);
    let keyword = find(&items, "for");
    assert_eq!(keyword.kind, CompletionItemKind::Keyword);
    assert_eq!(keyword.detail.as_deref(), Some("keyword"));
    assert_eq!(keyword.sort_text.as_deref(), Some("1_for"));
}

#[test]
fn test_completions_offer_ambient_globals() {
    let source = "let total = Ma";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert_eq!(labels(&items), vec!["Math"]);
    assert_eq!(find(&items, "Math").kind, CompletionItemKind::Variable);

    let source = "parse";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    let parse_int = find(&items, "parseInt");
    assert_eq!(parse_int.kind, CompletionItemKind::Function);
}

#[test]
fn test_shadowed_global_is_listed_once() {
    let source = "let Math = 5;\nMa";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    let math: Vec<_> = items.iter().filter(|item| item.label == "Math").collect();
    assert_eq!(math.len(), 1);
    assert_eq!(math[0].detail.as_deref(), Some("number"));
}

// ============================================================================
// Completions: members
// ============================================================================

const DOG_SOURCE: &str = "\
class Dog {
    constructor() {
        this.name = \"rex\";
    }
    bark() {
        return \"woof\";
    }
}
let pet = new Dog();
pet.";

#[test]
fn test_member_completions_after_dot() {
    let mut host = host_with(DOG_SOURCE);
    let items = host.completions_at(URI, DOG_SOURCE.len() as u32, None);
    let name = find(&items, "name");
    assert_eq!(name.kind, CompletionItemKind::Property);
    assert_eq!(name.detail.as_deref(), Some("string"));
    let bark = find(&items, "bark");
    assert_eq!(bark.kind, CompletionItemKind::Method);
    assert_eq!(bark.detail.as_deref(), Some("() => string"));
    // No scope symbols or keywords leak into member position.
    assert!(items.iter().all(|item| item.kind != CompletionItemKind::Keyword));
    assert!(!items.iter().any(|item| item.label == "pet"));
}

#[test]
fn test_member_completions_respect_prefix() {
    let source = format!("{}ba", DOG_SOURCE);
    let mut host = host_with(&source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert_eq!(labels(&items), vec!["bark"]);
}

#[test]
fn test_member_completions_on_string_prototype() {
    let source = "let s = \"abc\";\ns.to";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert!(items.iter().any(|item| item.label == "toUpperCase"));
    assert!(items.iter().any(|item| item.label == "toLowerCase"));
    assert!(!items.iter().any(|item| item.label == "length"));
    assert_eq!(find(&items, "toUpperCase").kind, CompletionItemKind::Method);
}

#[test]
fn test_member_completions_on_array_receiver() {
    let source = "let xs = [1, 2];\nxs.";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert_eq!(find(&items, "length").detail.as_deref(), Some("number"));
    assert_eq!(find(&items, "map").kind, CompletionItemKind::Method);
}

#[test]
fn test_member_completions_on_this_inside_method() {
    let source = "\
class Counter {
    constructor() {
        this.count = 0;
    }
    increment() {
        return this.
    }
}
";
    let mut host = host_with(source);
    let offset = offset_after(source, "return this.");
    let items = host.completions_at(URI, offset, None);
    assert_eq!(find(&items, "count").detail.as_deref(), Some("number"));
    assert!(items.iter().any(|item| item.label == "increment"));
}

#[test]
fn test_member_completions_unknown_receiver_are_empty() {
    let source = "mystery.";
    let mut host = host_with(source);
    let items = host.completions_at(URI, source.len() as u32, None);
    assert!(items.is_empty());
}

// ============================================================================
// Hover
// ============================================================================

#[test]
fn test_hover_variable_shows_inferred_type() {
    let source = "let port = 8080;\n";
    let mut host = host_with(source);
    let hover = host.hover_at(URI, offset_of(source, "port")).unwrap();
    assert_eq!(hover.range.start, 4);
    assert_eq!(hover.range.end, 8);
    assert_eq!(hover.contents.len(), 1);
    assert_eq!(hover.contents[0].kind, HoverContentKind::Code);
    assert_eq!(hover.contents[0].value, "(variable) port: number");
}

#[test]
fn test_hover_constant_and_parameter() {
    let source = "const host = \"localhost\";\nfunction f(flag) {\n    return flag;\n}\n";
    let mut host = host_with(source);

    let hover = host.hover_at(URI, offset_of(source, "host")).unwrap();
    assert_eq!(hover.contents[0].value, "(constant) host: string");

    let hover = host.hover_at(URI, offset_of(source, "return flag") as u32 + 7).unwrap();
    assert_eq!(hover.contents[0].value, "(parameter) flag: any");
}

#[test]
fn test_hover_function_shows_signature() {
    let source = "function resize(width = 1) {\n    return \"s\";\n}\n";
    let mut host = host_with(source);
    let hover = host.hover_at(URI, offset_of(source, "resize")).unwrap();
    assert_eq!(hover.contents[0].value, "(function) resize: (width: number) => string");
}

#[test]
fn test_hover_class_shows_heritage() {
    let source = "\
class Animal {
    speak() {
        return \"...\";
    }
}
class Dog extends Animal {
    bark() {
        return 1;
    }
}
let pet = new Dog();
pet.bark;
";
    let mut host = host_with(source);
    let hover = host.hover_at(URI, offset_of(source, "Dog extends")).unwrap();
    assert_eq!(hover.contents[0].value, "class Dog extends Animal");

    let hover = host.hover_at(URI, offset_of(source, "pet.bark;") + 4).unwrap();
    assert_eq!(hover.contents[0].value, "(member) bark: () => number");
}

#[test]
fn test_hover_this_inside_method() {
    let source = "\
class Counter {
    constructor() {
        this.count = 0;
    }
    increment() {
        return this.count;
    }
}
";
    let mut host = host_with(source);
    let offset = offset_of(source, "return this") + 7;
    let hover = host.hover_at(URI, offset).unwrap();
    assert_eq!(hover.contents[0].value, "this: Counter");

    let member = host.hover_at(URI, offset_of(source, "this.count;") + 5).unwrap();
    assert_eq!(member.contents[0].value, "(member) count: number");
}

#[test]
fn test_hover_keyword() {
    let source = "class Dog {\n}\n";
    let mut host = host_with(source);
    let hover = host.hover_at(URI, 0).unwrap();
    assert_eq!(hover.contents[0].value, "(keyword) class");
    assert_eq!(hover.range.start, 0);
    assert_eq!(hover.range.end, 5);
}

#[test]
fn test_hover_ambient_global() {
    let source = "let m = Math.abs;\n";
    let mut host = host_with(source);
    let hover = host.hover_at(URI, offset_of(source, "Math")).unwrap();
    assert!(hover.contents[0].value.starts_with("(global) Math: {"));
}

#[test]
fn test_hover_unresolved_identifier_is_any() {
    let source = "mystery;\n";
    let mut host = host_with(source);
    let hover = host.hover_at(URI, 0).unwrap();
    assert_eq!(hover.contents[0].value, "(identifier) mystery: any");
}

#[test]
fn test_hover_nothing_under_cursor() {
    let source = "let x = 42;\n";
    let mut host = host_with(source);
    assert!(host.hover_at(URI, offset_of(source, "=")).is_none());
    assert!(host.hover_at(URI, offset_of(source, "42")).is_none());
}

// ============================================================================
// Definition and references
// ============================================================================

#[test]
fn test_definition_from_a_reference() {
    let source = "let target = 1;\ntarget = target + 1;\n";
    let mut host = host_with(source);
    let use_offset = source.rfind("target").unwrap() as u32;
    let definition = host.definition_at(URI, use_offset).unwrap();
    assert_eq!(definition.file_name, URI);
    assert_eq!(definition.span.start, 4);
    assert_eq!(definition.span.end, 10);
}

#[test]
fn test_references_in_order_with_optional_declaration() {
    let source = "let target = 1;\ntarget = target + 1;\n";
    let mut host = host_with(source);

    let all = host.references_at(URI, 4, true);
    assert_eq!(all.len(), 3);
    assert!(all[0].is_definition);
    assert_eq!(all[0].span.start, 4);
    assert_eq!(all[1].span.start, 16);
    assert_eq!(all[2].span.start, 25);

    let uses_only = host.references_at(URI, 4, false);
    assert_eq!(uses_only.len(), 2);
    assert!(uses_only.iter().all(|reference| !reference.is_definition));
}

#[test]
fn test_definition_of_unresolved_name_is_none() {
    let source = "mystery;\n";
    let mut host = host_with(source);
    assert!(host.definition_at(URI, 0).is_none());
}

// ============================================================================
// Document symbols
// ============================================================================

#[test]
fn test_document_symbols_outline_with_nesting() {
    let source = "\
const LIMIT = 10;
function helper() {
    let local = 1;
}
class Point {
    constructor(x) {
        this.x = x;
    }
    length() {
        return 0;
    }
    label = \"p\";
}
";
    let mut host = host_with(source);
    let symbols = host.document_symbols(URI);
    assert_eq!(symbols.len(), 3);

    assert_eq!(symbols[0].name, "LIMIT");
    assert_eq!(symbols[0].kind, DocumentSymbolKind::Constant);

    assert_eq!(symbols[1].name, "helper");
    assert_eq!(symbols[1].kind, DocumentSymbolKind::Function);
    assert_eq!(symbols[1].children.len(), 1);
    assert_eq!(symbols[1].children[0].name, "local");
    assert_eq!(symbols[1].children[0].kind, DocumentSymbolKind::Variable);

    let point = &symbols[2];
    assert_eq!(point.name, "Point");
    assert_eq!(point.kind, DocumentSymbolKind::Class);
    let point_start = offset_of(source, "Point");
    assert_eq!(point.selection_range.start, point_start);
    assert_eq!(point.selection_range.end, point_start + 5);

    let members: Vec<_> = point.children.iter().map(|child| child.name.as_str()).collect();
    assert_eq!(members, vec!["constructor", "length", "label"]);
    assert_eq!(point.children[0].kind, DocumentSymbolKind::Method);
    assert_eq!(point.children[1].kind, DocumentSymbolKind::Method);
    assert_eq!(point.children[2].kind, DocumentSymbolKind::Property);
}

// ============================================================================
// Line tokens
// ============================================================================

#[test]
fn test_tokens_for_line_have_absolute_offsets() {
    let source = "let x = 1;\nlet y = 2;\n";
    let mut host = host_with(source);
    let tokens = host.tokens_for_line(URI, 1);
    assert!(!tokens.is_empty());
    assert_eq!(tokens[0].kind, "LetKeyword");
    assert_eq!(tokens[0].start, 11);
    assert_eq!(tokens[0].text, "let");
    let y = tokens.iter().find(|token| token.text == "y").unwrap();
    assert_eq!(y.kind, "Identifier");
    assert_eq!(y.start, 15);
}

#[test]
fn test_tokens_for_line_out_of_range() {
    let mut host = host_with("let x = 1;\n");
    assert!(host.tokens_for_line(URI, 9).is_empty());
}

// ============================================================================
// Edits feed back into analysis
// ============================================================================

#[test]
fn test_edit_document_reanalyzes_current_text() {
    let v1 = "let alpha = 1;\nalpha;\n";
    let mut host = host_with(v1);
    assert!(host.diagnostics(URI).is_empty());

    let v2 = "let alpha = 1;\nlet beta = alpha;\nbe";
    let edit = LineEdit { start_line: 1, end_line: 2, new_line_count: 2 };
    host.edit_document(URI, v2.to_string(), edit, 2);

    let items = host.completions_at(URI, v2.len() as u32, None);
    assert_eq!(find(&items, "beta").detail.as_deref(), Some("number"));
}

// ============================================================================
// Fixture program
// ============================================================================

const PETSHOP: &str = include_str!("fixtures/petshop.jot");

#[test]
fn test_fixture_program_is_clean() {
    let mut host = host_with(PETSHOP);
    assert!(host.diagnostics(URI).is_empty());
}

#[test]
fn test_fixture_member_completion_spans_inheritance() {
    let mut host = host_with(PETSHOP);
    let offset = offset_of(PETSHOP, "rex.describe") + 4;
    let items = host.completions_at(URI, offset, None);

    assert_eq!(find(&items, "speak").kind, CompletionItemKind::Method);
    let describe = find(&items, "describe");
    assert_eq!(describe.kind, CompletionItemKind::Method);
    assert_eq!(describe.detail.as_deref(), Some("() => string"));
    assert_eq!(find(&items, "breed").kind, CompletionItemKind::Property);
    assert_eq!(find(&items, "price").kind, CompletionItemKind::Property);
    assert!(!labels(&items).contains(&"let"));
}

#[test]
fn test_fixture_hover_shows_instance_and_array_types() {
    let mut host = host_with(PETSHOP);

    let declaration = host.hover_at(URI, offset_of(PETSHOP, "rex =") + 1).unwrap();
    assert_eq!(declaration.contents[0].value, "(constant) rex: Dog");

    let usage = host.hover_at(URI, offset_of(PETSHOP, "totalValue(inventory)") + 11).unwrap();
    assert_eq!(usage.contents[0].value, "(constant) inventory: Dog[]");
}

#[test]
fn test_fixture_outline() {
    let mut host = host_with(PETSHOP);
    let symbols = host.document_symbols(URI);
    let names: Vec<_> = symbols.iter().map(|symbol| symbol.name.as_str()).collect();
    assert_eq!(names, vec!["Animal", "Dog", "totalValue", "inventory", "rex"]);

    let animal = &symbols[0];
    assert_eq!(animal.kind, DocumentSymbolKind::Class);
    let members: Vec<_> = animal.children.iter().map(|child| child.name.as_str()).collect();
    assert_eq!(members, vec!["constructor", "describe"]);

    let dog = &symbols[1];
    let members: Vec<_> = dog.children.iter().map(|child| child.name.as_str()).collect();
    assert_eq!(members, vec!["constructor", "speak"]);
}
