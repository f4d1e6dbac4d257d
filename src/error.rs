//! The error strata produced by each pipeline stage, plus the process-wide
//! flags the runner uses to decide exit codes and REPL continuation.

use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::token::{Location, Token};

static HAD_ERROR: AtomicBool = AtomicBool::new(false);
static HAD_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

/// A lexer diagnostic. Collected, not thrown.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{location}: {message}")]
pub struct ScanError {
    pub location: Location,
    pub message: String,
}

/// A parser diagnostic. Collected, not thrown; the parser resynchronises at
/// statement boundaries and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub location: Location,
    pub message: String,
}

/// A static (resolver) diagnostic. The first one aborts the run before the
/// interpreter is ever invoked.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{location}: {message}")]
pub struct ResolveError {
    pub location: Location,
    pub message: String,
}

/// A runtime diagnostic, propagated to the runner; in the REPL the session
/// continues with the next line.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{location}: {message}")]
pub struct RuntimeError {
    pub location: Location,
    pub message: String,
}

impl RuntimeError {
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        Self {
            location: token.location.clone(),
            message: message.into(),
        }
    }
}

pub fn report_scan_error(err: &ScanError) {
    log::debug!(target: "interp::scanner", "{err}");
    eprintln!("{err}");
    HAD_ERROR.store(true, Ordering::Relaxed);
}

pub fn report_parse_error(err: &ParseError) {
    log::debug!(target: "interp::parser", "{err}");
    eprintln!("{err}");
    HAD_ERROR.store(true, Ordering::Relaxed);
}

pub fn report_resolve_error(err: &ResolveError) {
    log::debug!(target: "interp::resolver", "{err}");
    eprintln!("{err}");
    HAD_ERROR.store(true, Ordering::Relaxed);
}

pub fn report_runtime_error(err: &RuntimeError) {
    log::debug!(target: "interp::interpreter", "{err}");
    eprintln!("{err}");
    HAD_RUNTIME_ERROR.store(true, Ordering::Relaxed);
}

pub fn had_error() -> bool {
    HAD_ERROR.load(Ordering::Relaxed)
}

pub fn had_runtime_error() -> bool {
    HAD_RUNTIME_ERROR.load(Ordering::Relaxed)
}

/// Between REPL lines only the parse/resolve flag resets; a prior runtime
/// error must not suppress the exit code of a file run that happens to be
/// invoked afterwards in the same process (it never is, in practice, but the
/// flags are kept independent for clarity).
pub fn reset_for_next_repl_line() {
    HAD_ERROR.store(false, Ordering::Relaxed);
}
