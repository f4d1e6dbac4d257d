use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::environment::Environment;
use crate::error;
use crate::interpreter::Interpreter;
use crate::native;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Runs a whole source file through scan → parse → resolve → interpret.
/// Scan/parse/resolve/runtime diagnostics are reported as they happen and
/// tracked via the process-wide flags in [`crate::error`]; only a failure to
/// even read the file surfaces as an `Err` here, unified through `anyhow`
/// at this one boundary.
pub fn run_file(path: &Path) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("couldn't read script '{}'", path.display()))?;
    let source_path: Rc<str> = Rc::from(path.display().to_string());

    let globals = Environment::new_global();
    native::define_globals(&globals);
    let mut interpreter = Interpreter::new(globals, Default::default());

    run_source(&source, source_path, &mut interpreter, 0);
    Ok(())
}

/// An interactive session: each line is scanned, parsed, resolved, and
/// interpreted against one interpreter that persists across the whole
/// session, so top-level declarations from earlier lines stay in scope.
///
/// `NodeId`s must stay unique across the whole session, not just within one
/// line's parse: a closure created on an earlier line can outlive that line
/// and be called after a later line's parse has run, so the `next_node_id`
/// counter is threaded from one `run_source` call to the next instead of
/// restarting at zero per line.
pub fn run_prompt() {
    let globals = Environment::new_global();
    native::define_globals(&globals);
    let mut interpreter = Interpreter::new(globals, Default::default());

    println!("An interactive session. Press Ctrl-D to end.");
    let stdin = io::stdin();
    let mut line = String::new();
    let mut next_node_id = 0;
    loop {
        print!("> ");
        io::stdout().flush().ok();

        line.clear();
        let bytes_read = stdin.lock().read_line(&mut line).unwrap_or(0);
        if bytes_read == 0 {
            break;
        }

        next_node_id = run_source(&line, Rc::from("REPL"), &mut interpreter, next_node_id);
        error::reset_for_next_repl_line();
    }
}

/// Runs one chunk of source (a whole file, or one REPL line) and returns the
/// next unused `NodeId`, so a caller that runs more source afterward against
/// the same interpreter can keep ids unique.
fn run_source(
    source: &str,
    source_path: Rc<str>,
    interpreter: &mut Interpreter,
    start_node_id: crate::expr::NodeId,
) -> crate::expr::NodeId {
    let scanner = Scanner::new(source.to_string(), source_path);
    let (tokens, scan_errors) = scanner.scan_tokens();
    for err in &scan_errors {
        error::report_scan_error(err);
    }

    let parser = Parser::new(tokens, start_node_id);
    let (statements, parse_errors, next_node_id) = parser.parse();
    for err in &parse_errors {
        error::report_parse_error(err);
    }

    if error::had_error() {
        return next_node_id;
    }

    let resolver = Resolver::new();
    let locals = resolver.resolve(&statements);
    if error::had_error() {
        return next_node_id;
    }

    interpreter.extend_locals(locals);
    interpreter.interpret(&statements);
    next_node_id
}
