//! The execution engine (spec §4.4): decomposes a validated, non-builtin
//! [`TokenSequence`] into a [`Pipeline`], forks children, wires
//! redirections and anonymous pipes, and awaits completion.

use std::fs::File;
use std::io;
use std::process::{Child, Command as StdCommand, Stdio};

use os_pipe::pipe;

use crate::diagnostics;
use crate::signals;
use crate::token::{Token, TokenSequence};

#[cfg(unix)]
use std::fs::OpenOptions;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
#[cfg(unix)]
use std::os::unix::io::IntoRawFd;
#[cfg(unix)]
use std::os::unix::process::CommandExt;

/// Fatal, parent-side failures during pipeline construction (spec §4.4
/// "Edge cases", §7.4 "Parent-side"). Redirection-target opens are not a
/// parent-side concern here: spec §4.4 step 2 has the *child* open them,
/// so their failure is a child-side diagnostic (see [`spawn_stage`]), not
/// an [`EngineError`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to create pipe: {0}")]
    PipeCreation(#[source] io::Error),
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// The logical unit between pipe boundaries (spec §3).
#[derive(Debug, Clone)]
pub struct PipelineCommand {
    /// Argument words; `argv[0]` is the program name.
    pub argv: Vec<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Split a validated token sequence into the Commands of a Pipeline.
/// `tokens` must already be non-empty and have passed [`crate::validator::validate`].
pub fn build_pipeline(tokens: &TokenSequence) -> Vec<PipelineCommand> {
    let mut pipeline = Vec::new();
    let mut segment_start = 0;

    for (idx, token) in tokens.iter().enumerate() {
        if matches!(token, Token::Pipe) {
            pipeline.push(build_command(&tokens[segment_start..idx]));
            segment_start = idx + 1;
        }
    }
    pipeline.push(build_command(&tokens[segment_start..]));
    pipeline
}

fn build_command(segment: &[Token]) -> PipelineCommand {
    let mut argv = Vec::new();
    let mut input = None;
    let mut output = None;
    let mut i = 0;

    while i < segment.len() {
        match &segment[i] {
            Token::Word(w) => argv.push(w.clone()),
            Token::RedirIn => {
                if let Some(Token::Word(w)) = segment.get(i + 1) {
                    input = Some(w.clone());
                }
                i += 1;
            }
            Token::RedirOut => {
                if let Some(Token::Word(w)) = segment.get(i + 1) {
                    output = Some(w.clone());
                }
                i += 1;
            }
            // Accepted in validation, then foregrounded anyway (spec §9).
            Token::Background => {}
            Token::Pipe => unreachable!("segments are split on Pipe"),
        }
        i += 1;
    }

    PipelineCommand {
        argv,
        input,
        output,
    }
}

/// Run a pipeline of `n` commands, wiring `n - 1` anonymous pipes between
/// them, and await every spawned child before returning.
///
/// Every Command is spawned regardless of whether its own redirection
/// target later fails to open: spec §4.4 step 2 has the *child*, not the
/// parent, attempt that open, so a real process always exists at each
/// pipeline position and the parent always awaits exactly `n` children
/// (spec §8, Testable property 3) — a target that fails to open simply
/// makes that one child exit nonzero after printing its own diagnostic.
///
/// When `n == 1` no pipes are created; the one child inherits the parent's
/// stdin/stdout subject to its own redirections (spec §4.4 "Single-command
/// shortcut"). The parent's own stdin/stdout are never modified.
pub fn run_pipeline(commands: &[PipelineCommand]) {
    if commands.is_empty() {
        return;
    }

    let n = commands.len();
    let mut children: Vec<Child> = Vec::with_capacity(n);
    let mut next_stdin: Option<Stdio> = None;

    for (idx, command) in commands.iter().enumerate() {
        let is_last = idx + 1 == n;

        // A redirection path is opened by the child itself (see
        // spawn_stage); the placeholder passed here is always replaced
        // before exec, so its exact value is immaterial.
        let stdin = if command.input.is_some() {
            Stdio::null()
        } else {
            next_stdin.take().unwrap_or_else(Stdio::inherit)
        };

        let (stdout, reader_for_next) = if command.output.is_some() {
            (Stdio::null(), None)
        } else if is_last {
            (Stdio::inherit(), None)
        } else {
            match pipe() {
                Ok((reader, writer)) => (Stdio::from(writer), Some(Stdio::from(reader))),
                Err(e) => {
                    diagnostics::report(EngineError::PipeCreation(e));
                    await_all(&mut children);
                    return;
                }
            }
        };

        match spawn_stage(command, stdin, stdout) {
            Ok(child) => children.push(child),
            Err(e) => diagnostics::report(e),
        }

        next_stdin = reader_for_next;
    }

    await_all(&mut children);
}

#[cfg(unix)]
fn spawn_stage(
    command: &PipelineCommand,
    stdin: Stdio,
    stdout: Stdio,
) -> Result<Child, EngineError> {
    let program = &command.argv[0];
    let mut process = StdCommand::new(program);
    process.args(&command.argv[1..]);
    process.stdin(stdin).stdout(stdout).stderr(Stdio::inherit());

    let input = command.input.clone();
    let output = command.output.clone();

    unsafe {
        process.pre_exec(move || {
            signals::reset_child_dispositions();

            if let Some(path) = &input {
                reopen_stdio(path, libc::STDIN_FILENO, OpenMode::Read);
            }
            if let Some(path) = &output {
                reopen_stdio(path, libc::STDOUT_FILENO, OpenMode::WriteTruncate);
            }

            Ok(())
        });
    }

    process.spawn().map_err(|source| EngineError::Spawn {
        program: program.clone(),
        source,
    })
}

#[cfg(not(unix))]
fn spawn_stage(
    command: &PipelineCommand,
    stdin: Stdio,
    stdout: Stdio,
) -> Result<Child, EngineError> {
    let program = &command.argv[0];
    let mut process = StdCommand::new(program);
    process.args(&command.argv[1..]);
    process.stdin(stdin).stdout(stdout).stderr(Stdio::inherit());

    process.spawn().map_err(|source| EngineError::Spawn {
        program: program.clone(),
        source,
    })
}

#[cfg(unix)]
enum OpenMode {
    Read,
    WriteTruncate,
}

/// Open `path` and dup2 it onto `target_fd`, replacing the placeholder
/// `Stdio` the parent configured. Runs post-fork, pre-exec, in a process
/// that is still single-threaded, so ordinary `std::fs`/`libc` calls are
/// safe here. On failure, writes the same diagnostic a parent-side open
/// would have and exits nonzero — this *is* the child's fatal diagnostic
/// path spec §4.4 step 2 describes, never returned to the parent.
#[cfg(unix)]
fn reopen_stdio(path: &str, target_fd: libc::c_int, mode: OpenMode) {
    let opened = match mode {
        OpenMode::Read => File::open(path),
        OpenMode::WriteTruncate => OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(path),
    };

    match opened {
        Ok(file) => unsafe {
            let fd = file.into_raw_fd();
            libc::dup2(fd, target_fd);
            libc::close(fd);
        },
        Err(e) => {
            diagnostics::report_with_prefix(path, e);
            std::process::exit(1);
        }
    }
}

fn await_all(children: &mut Vec<Child>) {
    for mut child in children.drain(..) {
        let _ = child.wait();
    }
}
