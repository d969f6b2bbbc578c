//! C1 — Shell Runner: spawn a child process, capture its merged
//! stdout+stderr, and report whether it exited cleanly.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Result of running a command to completion and capturing its output.
pub struct CapturedOutput {
    pub success: bool,
    pub output: String,
}

/// Runs `command` with `args`, merging stdout and stderr into a single
/// string. Success requires the process to exit normally with status 0 —
/// a signal death or non-zero exit is treated as failure, matching
/// `appbuild`'s `WIFEXITED && WEXITSTATUS == 0` check.
pub fn run_captured(
    command: impl AsRef<Path>,
    args: &[String],
    extra_env: &[(String, String)],
) -> Result<CapturedOutput> {
    let command = command.as_ref();
    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in extra_env {
        cmd.env(key, value);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| Error::ProcessCreation(command.to_path_buf(), e))?;

    // Drained on dedicated threads rather than sequentially: a process that
    // fills one pipe's OS buffer before the other is read would otherwise
    // deadlock (gcc alone can fill ~64KB with warnings).
    let stdout_reader = child.stdout.take().map(|mut out| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            out.read_to_string(&mut buf).ok();
            buf
        })
    });
    let stderr_reader = child.stderr.take().map(|mut err| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            err.read_to_string(&mut buf).ok();
            buf
        })
    });

    let stdout = stdout_reader.and_then(|h| h.join().ok()).unwrap_or_default();
    let stderr = stderr_reader.and_then(|h| h.join().ok()).unwrap_or_default();

    let status = child.wait().map_err(Error::ProcessExec)?;

    let mut output = stdout;
    output.push_str(&stderr);

    Ok(CapturedOutput {
        success: status.success(),
        output,
    })
}

/// Replaces the current process image with `command`, forwarding `args`.
/// Used both to run the final built executable and, in script mode, to
/// hand off to it once built. Never returns on success.
#[cfg(unix)]
pub fn run_replacing(command: impl AsRef<Path>, args: &[String]) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let command = command.as_ref();
    let err = Command::new(command).args(args).exec();
    Err(Error::ProcessCreation(command.to_path_buf(), err))
}

#[cfg(not(unix))]
pub fn run_replacing(command: impl AsRef<Path>, args: &[String]) -> Result<()> {
    let command = command.as_ref();
    let status = Command::new(command)
        .args(args)
        .status()
        .map_err(|e| Error::ProcessCreation(command.to_path_buf(), e))?;
    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_successful_output() {
        let result = run_captured("echo", &["hello".to_string()], &[]).unwrap();
        assert!(result.success);
        assert!(result.output.contains("hello"));
    }

    #[test]
    fn reports_failure_on_nonzero_exit() {
        let result = run_captured("sh", &["-c".to_string(), "exit 1".to_string()], &[]).unwrap();
        assert!(!result.success);
    }

    #[test]
    fn missing_command_errors() {
        let result = run_captured("definitely-not-a-real-command", &[], &[]);
        assert!(result.is_err());
    }
}
