#![allow(dead_code)]

mod error;
mod interp;
mod lex;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use interp::Interpreter;

/// Reads stdin line by line, wraps each line in `[ ... ]`, evaluates it
/// against a single long-lived interpreter, and shows the stack afterward.
/// A failed line prints its error and continues — the REPL never exits
/// non-zero on its own account.
fn run_repl() {
    let mut interp = Interpreter::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            continue;
        }

        match interp.run_wrapped(line) {
            Ok(()) => {
                let rendered = interp::builtin::render_stack(&interp.context.stack);
                if !rendered.is_empty() {
                    println!("{}", rendered);
                }
            }
            Err(err) => println!("{}", err),
        }
    }
}

/// Reads `path`, wraps its contents in `[ ... ]`, parses the remaining
/// arguments as individual value fragments and pushes them onto the operand
/// stack, then evaluates the file's body. Returns the process exit code.
fn run_file(path: &str, extra_args: &[String]) -> u8 {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("Opening file: {}", err);
            return 1;
        }
    };

    let mut interp = Interpreter::new();

    for arg in extra_args {
        if let Err(err) = interp.push_fragment(arg) {
            eprintln!("Parsing argument: {}", err);
            return 1;
        }
    }

    match interp.run_wrapped(&source) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Runtime error: {}", err);
            1
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.split_first() {
        None => {
            run_repl();
            ExitCode::SUCCESS
        }
        Some((path, rest)) => ExitCode::from(run_file(path, rest)),
    }
}
