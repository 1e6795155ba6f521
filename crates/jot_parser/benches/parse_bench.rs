use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jot_ast::AstArena;
use jot_parser::Parser;

// A medium-size Jot source (~80 lines) with various constructs
const JOT_SOURCE: &str = r#"
import { connect } from "net";

class Logger {
    prefix = "[app]";
    constructor(level) {
        this.level = level;
        this.lines = [];
    }
    log(message) {
        let line = `${this.prefix} ${message}`;
        this.lines.push(line);
        return line;
    }
    static create() {
        return new Logger("info");
    }
}

class FileLogger extends Logger {
    constructor(path) {
        super("debug");
        this.path = path;
    }
    flush() {
        return this.lines.join("\n");
    }
}

function buildRegistry(entries) {
    let registry = {};
    for (let entry of entries) {
        registry[entry.name] = entry;
    }
    return registry;
}

async function fetchAll(urls, limit = 4) {
    let results = [];
    for (let i = 0; i < urls.length; i++) {
        let body = await get(urls[i]);
        if (body !== null) {
            results.push(body);
        }
    }
    return results;
}

export function summarize(records) {
    const totals = records
        .filter(r => r.active)
        .map(r => r.value * 2)
        .reduce((sum, v) => sum + v, 0);
    return totals > 100 ? "large" : "small";
}

let logger = Logger.create();
try {
    let registry = buildRegistry([{ name: "a" }, { name: "b" }]);
    logger.log(`loaded ${registry.a.name}`);
} catch (error) {
    logger.log("failed: " + error.message);
} finally {
    logger.log("done");
}
"#;

fn bench_parse_jot(c: &mut Criterion) {
    c.bench_function("parse_jot_medium", |b| {
        b.iter(|| {
            let arena = AstArena::new();
            let parser = Parser::new(&arena, "bench.jot", black_box(JOT_SOURCE));
            let output = parser.parse();
            black_box(output.source_file.statements.len());
        });
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!(
            "function worker{i}(input) {{\n    let out = input * {i} + 1;\n    return out;\n}}\n"
        ));
    }
    c.bench_function("parse_jot_large", |b| {
        b.iter(|| {
            let arena = AstArena::new();
            let parser = Parser::new(&arena, "bench.jot", black_box(&source));
            let output = parser.parse();
            black_box(output.diagnostics.len());
        });
    });
}

criterion_group!(benches, bench_parse_jot, bench_parse_large);
criterion_main!(benches);
