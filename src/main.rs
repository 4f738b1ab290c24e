//! Driver loop (spec §4.6): prompts, reads a line from the startup script
//! then from the interactive stream, and dispatches through the pipeline
//! below.

mod builtins;
mod diagnostics;
mod engine;
mod lexer;
mod signals;
mod token;
mod validator;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use builtins::Outcome;
use token::Token;

const PROMPT: &str = "% ";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let program_name = std::env::args().next().unwrap_or_else(|| "ish".to_string());
    diagnostics::set_program_name(program_name);

    signals::install();

    run_startup_script();
    run_interactive_loop();
}

/// Process `$HOME/.ishrc` once before the interactive loop (spec §4.6,
/// §6). A missing, unreadable, or empty file is a silent no-op.
fn run_startup_script() {
    let Ok(home) = std::env::var("HOME") else {
        return;
    };
    let Ok(file) = File::open(format!("{home}/.ishrc")) else {
        return;
    };

    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { break };
        println!("{PROMPT}{line}");
        let _ = io::stdout().flush();
        if let Some(code) = process_line(&line) {
            std::process::exit(code);
        }
    }
}

fn run_interactive_loop() -> ! {
    let stdin = io::stdin();
    loop {
        print!("{PROMPT}");
        if io::stdout().flush().is_err() {
            std::process::exit(0);
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => std::process::exit(0),
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']);
                if let Some(code) = process_line(trimmed) {
                    std::process::exit(code);
                }
            }
            Err(_) => std::process::exit(0),
        }
    }
}

/// Lex, validate, and dispatch one line. `Some(code)` means the shell
/// should terminate with that exit status; `None` means keep looping
/// (spec §4.6, §7).
fn process_line(line: &str) -> Option<i32> {
    let tokens = match lexer::lex(line) {
        Ok(tokens) => tokens,
        Err(e) => {
            diagnostics::report(e);
            return None;
        }
    };

    if tokens.is_empty() {
        return None;
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        for (idx, token) in tokens.iter().enumerate() {
            tracing::debug!(idx, kind = token.kind_str(), "token");
        }
    }

    if let Err(e) = validator::validate(&tokens) {
        diagnostics::report(e);
        return None;
    }

    // Accepted in validation, then foregrounded anyway (spec §9).
    if tokens.last() == Some(&Token::Background) {
        diagnostics::report("Background execution is not supported");
    }

    if let Some(outcome) = builtins::dispatch(&tokens) {
        return match outcome {
            Outcome::Continue => None,
            Outcome::Exit(code) => Some(code),
        };
    }

    let pipeline = engine::build_pipeline(&tokens);
    engine::run_pipeline(&pipeline);
    None
}
