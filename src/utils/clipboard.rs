//! System clipboard access via platform copy commands.
//!
//! Shelling out to the native copy utility avoids linking a display
//! server; on Linux the Wayland and X11 tools are tried in turn.

use std::io::Write;
use std::process::{Command, Stdio};

/// Write `text` to the system clipboard.
///
/// Failures are reported as a message suitable for logging; callers
/// should not treat them as fatal.
pub fn write_text(text: &str) -> Result<(), String> {
    for (cmd, args) in candidate_commands() {
        match pipe_to_command(cmd, args, text) {
            Ok(()) => return Ok(()),
            Err(CommandFailure::NotAvailable) => continue,
            Err(CommandFailure::Failed) => {
                return Err(format!("Clipboard command `{cmd}` failed"))
            }
        }
    }
    Err("No clipboard command available (install wl-copy, xclip, or xsel)".to_string())
}

#[cfg(target_os = "macos")]
fn candidate_commands() -> &'static [(&'static str, &'static [&'static str])] {
    &[("pbcopy", &[])]
}

#[cfg(target_os = "windows")]
fn candidate_commands() -> &'static [(&'static str, &'static [&'static str])] {
    &[("cmd", &["/C", "clip"])]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn candidate_commands() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("xsel", &["--clipboard", "--input"]),
    ]
}

enum CommandFailure {
    NotAvailable,
    Failed,
}

fn pipe_to_command(cmd: &str, args: &[&str], input: &str) -> Result<(), CommandFailure> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|_| CommandFailure::NotAvailable)?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(input.as_bytes());
    }
    match child.wait() {
        Ok(status) if status.success() => Ok(()),
        _ => Err(CommandFailure::Failed),
    }
}
