#![cfg(unix)]

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

fn spawn_ish() -> std::process::Child {
    Command::new(env!("CARGO_BIN_EXE_ish"))
        .env_remove("HOME")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ish")
}

fn send_sigquit(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGQUIT);
    }
}

/// Reads stdout on a background thread so the main thread can poll with a
/// deadline instead of blocking on a read that may never come.
fn stdout_reader(mut stdout: std::process::ChildStdout) -> mpsc::Receiver<u8> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut byte = [0u8; 1];
        while let Ok(1) = stdout.read(&mut byte) {
            if tx.send(byte[0]).is_err() {
                break;
            }
        }
    });
    rx
}

fn wait_for_substring(rx: &mpsc::Receiver<u8>, needle: &str, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    let mut collected = Vec::new();
    while std::time::Instant::now() < deadline {
        while let Ok(byte) = rx.try_recv() {
            collected.push(byte);
        }
        if String::from_utf8_lossy(&collected).contains(needle) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn first_quit_press_warns_without_exiting() {
    let mut child = spawn_ish();
    let pid = child.id();
    let rx = stdout_reader(child.stdout.take().unwrap());

    send_sigquit(pid);
    assert!(
        wait_for_substring(&rx, "Type Ctrl-\\ again within 5 seconds to exit.", Duration::from_secs(2)),
        "expected the arm warning on stdout"
    );

    assert!(
        child.try_wait().unwrap().is_none(),
        "a single quit press must not terminate the shell"
    );

    drop(child.stdin.take());
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn second_quit_press_within_window_terminates() {
    let mut child = spawn_ish();
    let pid = child.id();
    let rx = stdout_reader(child.stdout.take().unwrap());

    send_sigquit(pid);
    assert!(wait_for_substring(&rx, "Type Ctrl-\\", Duration::from_secs(2)));

    send_sigquit(pid);
    let status = child.wait().expect("wait for exit");
    assert!(status.success(), "expected exit status 0, got {status:?}");
}
