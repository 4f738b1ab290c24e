//! The signal regime (spec §4.5): parent dispositions for interrupt, quit,
//! and alarm, the two-press quit protocol, and the child-side reset.

use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const ARMED: u8 = 1;

/// QuitState (spec §3): `{Idle, Armed}`, mutated only from signal-handler
/// context (or, implicitly, by the alarm scheduler that fires that
/// context). A single atomic word, per the REDESIGN note in spec §9.
static QUIT_STATE: AtomicU8 = AtomicU8::new(IDLE);

const ARM_MESSAGE: &[u8] = b"Type Ctrl-\\ again within 5 seconds to exit.\n";

/// Install the three asynchronous dispositions at startup (spec §4.5) and
/// unblock all three signals.
#[cfg(unix)]
pub fn install() {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
        libc::signal(libc::SIGQUIT, quit_handler as libc::sighandler_t);
        libc::signal(libc::SIGALRM, alarm_handler as libc::sighandler_t);

        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGINT);
        libc::sigaddset(&mut set, libc::SIGQUIT);
        libc::sigaddset(&mut set, libc::SIGALRM);
        libc::sigprocmask(libc::SIG_UNBLOCK, &set, std::ptr::null_mut());
    }
}

#[cfg(not(unix))]
pub fn install() {}

/// Reset the signals the parent customizes back to their default
/// disposition. Called in a child immediately after fork, before exec, so
/// the user can actually terminate a misbehaving external command (spec
/// §4.4, §9 "Open questions").
#[cfg(unix)]
pub fn reset_child_dispositions() {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
        libc::signal(libc::SIGQUIT, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
pub fn reset_child_dispositions() {}

/// The two-press quit protocol (spec §4.5), entered on every `SIGQUIT`.
///
/// Only async-signal-safe operations run here: a raw `write(2)` of a
/// pre-formatted byte slice (never a formatted/buffered print) and
/// `alarm(3)`. On the second press within the window this never returns.
#[cfg(unix)]
extern "C" fn quit_handler(_signal: libc::c_int) {
    match QUIT_STATE.swap(ARMED, Ordering::SeqCst) {
        IDLE => {
            unsafe {
                libc::write(
                    libc::STDOUT_FILENO,
                    ARM_MESSAGE.as_ptr() as *const libc::c_void,
                    ARM_MESSAGE.len(),
                );
                libc::alarm(5);
            }
        }
        _ => unsafe {
            libc::_exit(0);
        },
    }
}

/// Alarm expiry (spec §4.5): the arm was stale, reset to Idle.
#[cfg(unix)]
extern "C" fn alarm_handler(_signal: libc::c_int) {
    QUIT_STATE.store(IDLE, Ordering::SeqCst);
}

/// Current state, for tests and for `tracing` instrumentation only — never
/// consulted by production control flow outside of signal-handler context.
#[cfg(test)]
pub(crate) fn is_armed() -> bool {
    QUIT_STATE.load(Ordering::SeqCst) == ARMED
}
