//! jot: The Jot analysis CLI.
//!
//! Exposes the cursor queries as direct commands over files on disk:
//! tokens, diagnostics, completions, hover, and the document outline,
//! each with an optional `--json` rendering. `--lsp` hands the process
//! over to the language server on stdio.

use clap::{Parser as ClapParser, Subcommand};
use jot_analysis::{AnalysisHost, DocumentSymbol};
use jot_core::{LineAndColumn, LineIndex};
use notify::{EventKind, RecursiveMode, Watcher};
use rayon::prelude::*;
use std::path::Path;
use std::process;
use std::time::Instant;

#[derive(ClapParser, Debug)]
#[command(
    name = "jot",
    about = "Analyzer and editor tooling for Jot source files",
    disable_version_flag = true
)]
struct Cli {
    /// Start the language server on stdio.
    #[arg(long)]
    lsp: bool,

    /// Print the version.
    #[arg(short = 'v', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tokens of a file with kinds and byte offsets.
    Tokens {
        file: String,
        /// Restrict output to one line (1-based).
        #[arg(long)]
        line: Option<u32>,
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
    /// Parse and bind files, reporting diagnostics.
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
    /// Completion items at a cursor position.
    Complete {
        file: String,
        /// Cursor as a byte offset.
        #[arg(long)]
        offset: Option<u32>,
        /// Cursor line (1-based), together with --column.
        #[arg(long)]
        line: Option<u32>,
        /// Cursor column (1-based), together with --line.
        #[arg(long)]
        column: Option<u32>,
        /// Filter prefix; derived from the text when omitted.
        #[arg(long)]
        prefix: Option<String>,
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
    /// Hover information at a cursor position.
    Hover {
        file: String,
        /// Cursor as a byte offset.
        #[arg(long)]
        offset: Option<u32>,
        /// Cursor line (1-based), together with --column.
        #[arg(long)]
        line: Option<u32>,
        /// Cursor column (1-based), together with --line.
        #[arg(long)]
        column: Option<u32>,
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the document outline.
    Symbols {
        file: String,
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
    /// Re-check files whenever they change on disk.
    Watch {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
}

/// Host-level failures: everything outside the analysis itself.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
enum CliError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{path}' is not valid UTF-8")]
    NotUtf8 { path: String },
    #[error("line {line} does not exist in '{path}'")]
    LineOutOfRange { path: String, line: u32 },
    #[error("file watcher failed")]
    Watch(#[from] notify::Error),
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            // --help and --version render through the error path and exit 0;
            // real usage mistakes exit 1.
            let code = if error.use_stderr() { 1 } else { 0 };
            let _ = error.print();
            process::exit(code);
        }
    };

    if cli.version {
        println!("jot {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if cli.lsp {
        let runtime = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        runtime.block_on(jot_lsp::start_lsp_server());
        return;
    }

    let command = match cli.command {
        Some(command) => command,
        None => {
            print_error("no command given; try 'jot --help'");
            process::exit(1);
        }
    };

    let code = match command {
        Command::Tokens { file, line, json } => run_tokens(&file, line, json),
        Command::Check { files, json } => run_check(&files, json),
        Command::Complete { file, offset, line, column, prefix, json } => {
            run_complete(&file, offset, line, column, prefix.as_deref(), json)
        }
        Command::Hover { file, offset, line, column, json } => {
            run_hover(&file, offset, line, column, json)
        }
        Command::Symbols { file, json } => run_symbols(&file, json),
        Command::Watch { files } => run_watch(&files),
    };
    process::exit(code);
}

// ============================================================================
// Commands
// ============================================================================

fn run_tokens(path: &str, line: Option<u32>, json: bool) -> i32 {
    let mut host = match open_host(path) {
        Ok(host) => host,
        Err(error) => return report_error(error),
    };

    let tokens = match line {
        Some(line) => {
            let line_count =
                host.document(path).map(|document| document.line_index().line_count());
            if line == 0 || line_count.map_or(true, |count| line > count) {
                return report_error(CliError::LineOutOfRange { path: path.to_string(), line });
            }
            host.tokens_for_line(path, line - 1)
        }
        None => host.tokens(path),
    };

    if json {
        print_json(&tokens);
    } else {
        for token in &tokens {
            println!("{:>6}..{:<6} {:<20} {:?}", token.start, token.end, token.kind, token.text);
        }
    }
    0
}

fn run_check(files: &[String], json: bool) -> i32 {
    let start = Instant::now();
    let use_color = !json && stderr_is_terminal();

    let results: Vec<Result<(Vec<jot_diagnostics::Diagnostic>, LineIndex), CliError>> = files
        .par_iter()
        .map(|path| {
            let text = load_source(path)?;
            let index = LineIndex::new(&text);
            let mut host = AnalysisHost::new();
            host.open_document(path.clone(), text, 1);
            Ok((host.diagnostics(path), index))
        })
        .collect();

    let mut io_failed = false;
    let mut errors = 0usize;
    let mut warnings = 0usize;
    let mut json_out = Vec::new();
    for outcome in results {
        match outcome {
            Ok((diagnostics, index)) => {
                for diagnostic in &diagnostics {
                    if diagnostic.is_error() {
                        errors += 1;
                    } else {
                        warnings += 1;
                    }
                    if json {
                        json_out.push(json_diagnostic(diagnostic, &index));
                    } else {
                        print_diagnostic(diagnostic, &index, use_color);
                    }
                }
            }
            Err(error) => {
                io_failed = true;
                report_error(error);
            }
        }
    }

    if json {
        print_json(&json_out);
    } else if errors + warnings > 0 {
        let color = if errors > 0 { RED } else { YELLOW };
        if use_color {
            eprintln!(
                "\n{}Found {} error{} and {} warning{}.{}",
                color,
                errors,
                plural(errors),
                warnings,
                plural(warnings),
                RESET
            );
        } else {
            eprintln!(
                "\nFound {} error{} and {} warning{}.",
                errors,
                plural(errors),
                warnings,
                plural(warnings)
            );
        }
    }
    if use_color {
        eprintln!(
            "{}Checked {} file{} in {:.2}s.{}",
            GRAY,
            files.len(),
            plural(files.len()),
            start.elapsed().as_secs_f64(),
            RESET
        );
    }

    if io_failed {
        return 1;
    }
    if errors + warnings > 0 {
        return 2;
    }
    0
}

fn run_complete(
    path: &str,
    offset: Option<u32>,
    line: Option<u32>,
    column: Option<u32>,
    prefix: Option<&str>,
    json: bool,
) -> i32 {
    let mut host = match open_host(path) {
        Ok(host) => host,
        Err(error) => return report_error(error),
    };
    let offset = match cursor_offset(&host, path, offset, line, column) {
        Some(offset) => offset,
        None => {
            print_error("either --offset or --line and --column is required");
            return 1;
        }
    };

    let items = host.completions_at(path, offset, prefix);
    if json {
        print_json(&items);
    } else {
        for item in &items {
            let kind = format!("{:?}", item.kind);
            match &item.detail {
                Some(detail) => println!("{:<24} {:<10} {}", item.label, kind, detail),
                None => println!("{:<24} {}", item.label, kind),
            }
        }
    }
    0
}

fn run_hover(
    path: &str,
    offset: Option<u32>,
    line: Option<u32>,
    column: Option<u32>,
    json: bool,
) -> i32 {
    let mut host = match open_host(path) {
        Ok(host) => host,
        Err(error) => return report_error(error),
    };
    let offset = match cursor_offset(&host, path, offset, line, column) {
        Some(offset) => offset,
        None => {
            print_error("either --offset or --line and --column is required");
            return 1;
        }
    };

    let hover = host.hover_at(path, offset);
    if json {
        print_json(&hover);
    } else {
        match hover {
            Some(info) => {
                for content in &info.contents {
                    println!("{}", content.value);
                }
            }
            None => println!("(no hover information)"),
        }
    }
    0
}

fn run_symbols(path: &str, json: bool) -> i32 {
    let mut host = match open_host(path) {
        Ok(host) => host,
        Err(error) => return report_error(error),
    };
    let symbols = host.document_symbols(path);
    if json {
        print_json(&symbols);
    } else {
        print_symbols(&symbols, 0);
    }
    0
}

fn run_watch(files: &[String]) -> i32 {
    let _ = run_check(files, false);
    eprintln!();
    eprintln!("Watching for file changes...");

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(error) => return report_error(CliError::Watch(error)),
    };
    for path in files {
        if let Err(error) = watcher.watch(Path::new(path), RecursiveMode::NonRecursive) {
            return report_error(CliError::Watch(error));
        }
    }

    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                if is_content_event(&event.kind) {
                    // Coalesce the burst of events one save produces.
                    while rx.try_recv().is_ok() {}
                    eprintln!();
                    eprintln!("Change detected. Checking...");
                    let _ = run_check(files, false);
                }
            }
            Ok(Err(error)) => {
                report_error(CliError::Watch(error));
            }
            Err(_) => return 0,
        }
    }
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_))
}

// ============================================================================
// File loading and cursor addressing
// ============================================================================

fn load_source(path: &str) -> Result<String, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|source| CliError::Read { path: path.to_string(), source })?;
    let text = simdutf8::basic::from_utf8(&bytes)
        .map_err(|_| CliError::NotUtf8 { path: path.to_string() })?;
    Ok(text.to_string())
}

fn open_host(path: &str) -> Result<AnalysisHost, CliError> {
    let text = load_source(path)?;
    let mut host = AnalysisHost::new();
    host.open_document(path.to_string(), text, 1);
    Ok(host)
}

/// Resolve the cursor argument: an explicit byte offset wins, otherwise
/// 1-based --line/--column convert through the document's line index.
fn cursor_offset(
    host: &AnalysisHost,
    path: &str,
    offset: Option<u32>,
    line: Option<u32>,
    column: Option<u32>,
) -> Option<u32> {
    if let Some(offset) = offset {
        return Some(offset);
    }
    let (line, column) = (line?, column?);
    if line == 0 || column == 0 {
        return None;
    }
    let index = host.document(path)?.line_index();
    Some(index.offset_of(LineAndColumn { line: line - 1, column: column - 1 }))
}

// ============================================================================
// Output
// ============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDiagnostic {
    file: Option<String>,
    code: u32,
    severity: String,
    start: Option<u32>,
    end: Option<u32>,
    line: Option<u32>,
    column: Option<u32>,
    message: String,
}

fn json_diagnostic(diagnostic: &jot_diagnostics::Diagnostic, index: &LineIndex) -> JsonDiagnostic {
    let position = diagnostic.span.map(|span| index.position_of(span.start));
    JsonDiagnostic {
        file: diagnostic.file.clone(),
        code: diagnostic.code,
        severity: diagnostic.category.to_string(),
        start: diagnostic.span.map(|span| span.start),
        end: diagnostic.span.map(|span| span.end()),
        line: position.map(|position| position.line + 1),
        column: position.map(|position| position.column + 1),
        message: diagnostic.message_text.clone(),
    }
}

fn print_diagnostic(
    diagnostic: &jot_diagnostics::Diagnostic,
    index: &LineIndex,
    use_color: bool,
) {
    let position = diagnostic.span.map(|span| index.position_of(span.start));
    if use_color {
        let color = if diagnostic.is_error() { RED } else { YELLOW };
        if let Some(ref file) = diagnostic.file {
            eprint!("{}{}{}", CYAN, file, RESET);
            if let Some(position) = position {
                eprint!(":{}:{}", position.line + 1, position.column + 1);
            }
            eprint!(": ");
        }
        eprintln!(
            "{}{}{}{} {}J{}{}: {}",
            BOLD, color, diagnostic.category, RESET, CYAN, diagnostic.code, RESET,
            diagnostic.message_text
        );
    } else {
        if let Some(ref file) = diagnostic.file {
            eprint!("{}", file);
            if let Some(position) = position {
                eprint!(":{}:{}", position.line + 1, position.column + 1);
            }
            eprint!(": ");
        }
        eprintln!("{} J{}: {}", diagnostic.category, diagnostic.code, diagnostic.message_text);
    }
}

fn print_symbols(symbols: &[DocumentSymbol], depth: usize) {
    for symbol in symbols {
        println!(
            "{}{:?} {} [{}..{}]",
            "  ".repeat(depth),
            symbol.kind,
            symbol.name,
            symbol.range.start,
            symbol.range.end
        );
        print_symbols(&symbol.children, depth + 1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(error) => eprintln!("error: failed to serialize output: {}", error),
    }
}

fn report_error(error: CliError) -> i32 {
    eprintln!("{:?}", miette::Report::new(error));
    1
}

fn print_error(message: &str) {
    if stderr_is_terminal() {
        eprintln!("{}{}error{}: {}", BOLD, RED, RESET, message);
    } else {
        eprintln!("error: {}", message);
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn stderr_is_terminal() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::isatty(2) != 0 }
    }
    #[cfg(not(unix))]
    {
        true
    }
}
