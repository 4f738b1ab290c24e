//! The program-name cell (spec §3) and the uniform diagnostic formatter
//! (spec §6, §7): `<program-name>: <message>`.

use std::sync::OnceLock;

static PROGRAM_NAME: OnceLock<String> = OnceLock::new();

/// Record the invocation name once at startup. Subsequent calls are no-ops,
/// matching the single-assignment lifecycle of spec §3's program-name cell.
pub fn set_program_name(name: impl Into<String>) {
    let _ = PROGRAM_NAME.set(name.into());
}

/// The recorded invocation name, or `"ish"` if [`set_program_name`] was
/// never called (should not happen outside of unit tests).
pub fn program_name() -> &'static str {
    PROGRAM_NAME.get().map(String::as_str).unwrap_or("ish")
}

/// Print `<program-name>: <err>` to stderr.
pub fn report(err: impl std::fmt::Display) {
    eprintln!("{}: {err}", program_name());
}

/// Print `<prefix>: <err>` to stderr, where `prefix` is typically a
/// filename or an external program name rather than the shell's own name
/// (spec §6's "`<prefix>: <errno-description>`" form).
pub fn report_with_prefix(prefix: &str, err: impl std::fmt::Display) {
    eprintln!("{prefix}: {err}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ish_before_set() {
        // Run in isolation from other tests that may call set_program_name;
        // only assert the fallback is non-empty and stable across calls.
        let first = program_name();
        let second = program_name();
        assert_eq!(first, second);
    }
}
