//! Tokenizer benchmarks: cold full-document scans and warm incremental
//! re-scans after a single-line edit.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jot_core::LineIndex;
use jot_lexer::{jot_grammar, LexState, TokenCache};

const UNIT: &str = r#"class Counter {
    constructor(start) {
        this.value = start;
        this.history = [start];
    }

    bump(step) {
        this.value = this.value + step;
        this.history.push(this.value);
        return this.value;
    }
}

function describe(counter) {
    let label = `value: ${counter.value} (${counter.history.length} steps)`;
    return label;
}

const c = new Counter(10);
c.bump(5);
console.log(describe(c));
"#;

fn large_source(lines_target: usize) -> String {
    let mut out = String::new();
    while out.lines().count() < lines_target {
        out.push_str(UNIT);
    }
    out
}

fn bench_cold_scan(c: &mut Criterion) {
    let source = large_source(2_000);
    let index = LineIndex::new(&source);
    c.bench_function("lex_cold_2k_lines", |b| {
        b.iter(|| {
            let mut cache = TokenCache::new(jot_grammar());
            cache.ensure(black_box(&source), &index);
            black_box(cache.valid_line_count())
        })
    });
}

fn bench_incremental_rescan(c: &mut Criterion) {
    let source = large_source(2_000);
    let index = LineIndex::new(&source);
    let mut cache = TokenCache::new(jot_grammar());
    cache.ensure(&source, &index);
    let middle = (index.line_count() / 2) as usize;

    c.bench_function("lex_rescan_one_line", |b| {
        b.iter(|| {
            cache.apply_edit(middle, middle, 1);
            cache.ensure(black_box(&source), &index);
            black_box(cache.valid_line_count())
        })
    });
}

fn bench_single_line(c: &mut Criterion) {
    let line = "let label = `value: ${counter.value} (${counter.history.length} steps)`;";
    c.bench_function("lex_single_line", |b| {
        b.iter(|| black_box(jot_lexer::tokenize_line(jot_grammar(), black_box(line), &LexState::root())))
    });
}

criterion_group!(benches, bench_cold_scan, bench_incremental_rescan, bench_single_line);
criterion_main!(benches);
