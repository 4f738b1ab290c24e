//! Built-in classifier & handlers (spec §4.3). Built-ins run in the shell
//! process; they never fork and never touch file descriptors.

use crate::diagnostics;
use crate::token::{Token, TokenSequence};

/// What the first word of a command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Normal,
    Exit,
    Setenv,
    Unsetenv,
    Cd,
}

/// Classify the first word of a line. Comparisons are exact, case-sensitive,
/// whole-word (spec §4.3).
pub fn classify(first_word: &str) -> BuiltinKind {
    match first_word {
        "exit" => BuiltinKind::Exit,
        "setenv" => BuiltinKind::Setenv,
        "unsetenv" => BuiltinKind::Unsetenv,
        "cd" => BuiltinKind::Cd,
        _ => BuiltinKind::Normal,
    }
}

/// What the driver should do after a line is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Exit(i32),
}

/// Run `tokens` as a built-in, if its first token names one.
///
/// Returns `None` when the first token is not a recognized built-in name —
/// the caller should then hand the sequence to the execution engine.
/// Returns `Some(_)` when the built-in ran (successfully or not); a
/// built-in never forks, so this always completes synchronously.
pub fn dispatch(tokens: &TokenSequence) -> Option<Outcome> {
    let first_word = tokens.first().and_then(Token::as_word)?;
    let kind = classify(first_word);
    if matches!(kind, BuiltinKind::Normal) {
        return None;
    }

    if has_redirection_or_pipe(tokens) {
        diagnostics::report("built-in commands do not support redirection or pipes");
        return Some(Outcome::Continue);
    }

    let words: Vec<&str> = tokens.iter().filter_map(Token::as_word).collect();

    Some(match kind {
        BuiltinKind::Exit => builtin_exit(&words),
        BuiltinKind::Cd => builtin_cd(&words),
        BuiltinKind::Setenv => builtin_setenv(&words),
        BuiltinKind::Unsetenv => builtin_unsetenv(&words),
        BuiltinKind::Normal => unreachable!("checked above"),
    })
}

fn has_redirection_or_pipe(tokens: &TokenSequence) -> bool {
    tokens
        .iter()
        .any(|t| matches!(t, Token::RedirIn | Token::RedirOut | Token::Pipe))
}

fn builtin_exit(words: &[&str]) -> Outcome {
    if words.len() != 1 {
        diagnostics::report("exit does not take any parameters");
        return Outcome::Continue;
    }
    Outcome::Exit(0)
}

fn builtin_cd(words: &[&str]) -> Outcome {
    let target = match words.len() {
        1 => match std::env::var("HOME") {
            Ok(home) => home,
            Err(_) => {
                diagnostics::report("cd: HOME not set");
                return Outcome::Continue;
            }
        },
        2 => words[1].to_string(),
        _ => {
            diagnostics::report("cd takes one parameter");
            return Outcome::Continue;
        }
    };

    if let Err(e) = std::env::set_current_dir(&target) {
        diagnostics::report(format!("{target}: {e}"));
    }
    Outcome::Continue
}

fn builtin_setenv(words: &[&str]) -> Outcome {
    match words.len() {
        2 => {
            // SAFETY: the shell is single-threaded except for signal
            // handlers, which never touch environment variables.
            unsafe { std::env::set_var(words[1], "") };
        }
        3 => {
            // SAFETY: see above.
            unsafe { std::env::set_var(words[1], words[2]) };
        }
        _ => diagnostics::report("setenv takes one or two parameters"),
    }
    Outcome::Continue
}

fn builtin_unsetenv(words: &[&str]) -> Outcome {
    if words.len() != 2 {
        diagnostics::report("unsetenv takes one parameter");
        return Outcome::Continue;
    }
    // SAFETY: see builtin_setenv.
    unsafe { std::env::remove_var(words[1]) };
    Outcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn dispatch_line(line: &str) -> Option<Outcome> {
        dispatch(&lex(line).unwrap())
    }

    #[test]
    fn classify_is_exact_and_case_sensitive() {
        assert_eq!(classify("cd"), BuiltinKind::Cd);
        assert_eq!(classify("Cd"), BuiltinKind::Normal);
        assert_eq!(classify("cdx"), BuiltinKind::Normal);
        assert_eq!(classify("echo"), BuiltinKind::Normal);
    }

    #[test]
    fn non_builtin_returns_none() {
        assert_eq!(dispatch_line("echo hi"), None);
    }

    #[test]
    fn exit_with_extra_args_is_noop() {
        assert_eq!(dispatch_line("exit now"), Some(Outcome::Continue));
    }

    #[test]
    fn exit_alone_terminates() {
        assert_eq!(dispatch_line("exit"), Some(Outcome::Exit(0)));
    }

    #[test]
    fn builtin_rejects_redirection() {
        assert_eq!(dispatch_line("cd > out.txt"), Some(Outcome::Continue));
        assert_eq!(dispatch_line("exit < in.txt"), Some(Outcome::Continue));
    }

    #[test]
    fn setenv_unsetenv_round_trip() {
        assert_eq!(dispatch_line("setenv ISH_TEST_VAR value"), Some(Outcome::Continue));
        assert_eq!(std::env::var("ISH_TEST_VAR").as_deref(), Ok("value"));
        assert_eq!(dispatch_line("unsetenv ISH_TEST_VAR"), Some(Outcome::Continue));
        assert!(std::env::var("ISH_TEST_VAR").is_err());
    }

    #[test]
    fn setenv_two_args_sets_empty_string() {
        assert_eq!(dispatch_line("setenv ISH_TEST_VAR2"), Some(Outcome::Continue));
        assert_eq!(std::env::var("ISH_TEST_VAR2").as_deref(), Ok(""));
        unsafe { std::env::remove_var("ISH_TEST_VAR2") };
    }

    #[test]
    fn unsetenv_of_absent_var_is_not_an_error() {
        unsafe { std::env::remove_var("ISH_DEFINITELY_ABSENT") };
        assert_eq!(
            dispatch_line("unsetenv ISH_DEFINITELY_ABSENT"),
            Some(Outcome::Continue)
        );
    }

    #[test]
    fn wrong_counts_are_diagnostics_not_panics() {
        assert_eq!(dispatch_line("setenv"), Some(Outcome::Continue));
        assert_eq!(dispatch_line("setenv a b c"), Some(Outcome::Continue));
        assert_eq!(dispatch_line("unsetenv"), Some(Outcome::Continue));
        assert_eq!(dispatch_line("cd a b"), Some(Outcome::Continue));
    }
}
