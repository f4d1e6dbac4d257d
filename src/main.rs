mod environment;
mod error;
mod expr;
mod interpreter;
mod native;
mod parser;
mod resolver;
mod runner;
mod scanner;
mod stmt;
mod token;
mod value;

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut script_path: Option<PathBuf> = None;
    let mut debug = false;

    for arg in std::env::args().skip(1) {
        if arg == "--debug" {
            debug = true;
        } else if script_path.is_none() {
            script_path = Some(PathBuf::from(arg));
        } else {
            eprintln!("Usage: interp [script] [--debug]");
            return ExitCode::from(64);
        }
    }

    init_logging(debug);

    match script_path {
        Some(path) => run_file(&path),
        None => {
            runner::run_prompt();
            ExitCode::SUCCESS
        }
    }
}

fn run_file(path: &PathBuf) -> ExitCode {
    if let Err(err) = runner::run_file(path) {
        eprintln!("interp: {err:#}");
        return ExitCode::from(66);
    }

    if error::had_error() {
        ExitCode::from(65)
    } else if error::had_runtime_error() {
        ExitCode::from(70)
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
