//! External command execution.
//!
//! Thin blocking wrappers around [`std::process::Command`]; failures carry
//! the exit code and combined output so callers can branch on
//! [`ExitKind`](crate::error::ExitKind).

use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::RunError;

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited zero.
    pub success: bool,
    /// Raw exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Stdout and stderr concatenated and trimmed, for error reporting.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_owned();
        let err = self.stderr.trim();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

fn command_label(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_owned()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

/// Execute a prepared command and fail on non-zero exit.
fn execute_checked(mut cmd: Command, label: String) -> Result<ExecResult, RunError> {
    debug!(command = %label, "exec");
    let output = cmd.output().map_err(|source| RunError::Spawn {
        command: label.clone(),
        source,
    })?;
    let result = ExecResult::from(output);
    if !result.success {
        return Err(RunError::Failed {
            command: label,
            code: result.code.unwrap_or(-1),
            output: result.combined(),
        });
    }
    Ok(result)
}

/// Run a command and return its output. Fails if the command exits non-zero.
///
/// # Errors
///
/// [`RunError::Spawn`] when the binary cannot be started,
/// [`RunError::Failed`] on non-zero exit.
pub fn run(program: &str, args: &[&str]) -> Result<ExecResult, RunError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    execute_checked(cmd, command_label(program, args))
}

/// Run a command in a specific working directory.
///
/// # Errors
///
/// Same as [`run`].
pub fn run_in(dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult, RunError> {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(dir);
    execute_checked(cmd, format!("{} (in {})", command_label(program, args), dir.display()))
}

/// Run a command feeding `input` to its stdin (secrets that must not appear
/// on a command line, e.g. `saslpasswd2 -p`).
///
/// # Errors
///
/// Same as [`run`], plus a spawn error when stdin cannot be written.
pub fn run_with_stdin(program: &str, args: &[&str], input: &str) -> Result<ExecResult, RunError> {
    let label = command_label(program, args);
    debug!(command = %label, "exec (stdin)");
    let spawn_err = |source| RunError::Spawn {
        command: label.clone(),
        source,
    };
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;
    if let Some(stdin) = child.stdin.take() {
        let mut stdin = stdin;
        stdin.write_all(input.as_bytes()).map_err(|source| RunError::Spawn {
            command: label.clone(),
            source,
        })?;
    }
    let output = child.wait_with_output().map_err(|source| RunError::Spawn {
        command: label.clone(),
        source,
    })?;
    let result = ExecResult::from(output);
    if !result.success {
        return Err(RunError::Failed {
            command: label,
            code: result.code.unwrap_or(-1),
            output: result.combined(),
        });
    }
    Ok(result)
}

/// Run a command, allowing failure (returns the result without failing on
/// non-zero exit; only a spawn error is reported).
///
/// # Errors
///
/// [`RunError::Spawn`] when the binary cannot be started.
pub fn run_unchecked(program: &str, args: &[&str]) -> Result<ExecResult, RunError> {
    let label = command_label(program, args);
    debug!(command = %label, "exec (unchecked)");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| RunError::Spawn {
            command: label,
            source,
        })?;
    Ok(ExecResult::from(output))
}

/// Check whether a program is available on PATH.
#[must_use]
pub fn is_installed(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Install packages with apt, one `apt-get install` per package, skipping
/// recommends. Repeat runs are no-ops at the package manager level.
///
/// # Errors
///
/// The first failing `apt-get` invocation.
pub fn install_packages(packages: &[&str]) -> Result<(), RunError> {
    for package in packages {
        run(
            "apt-get",
            &["-y", "install", "--no-install-recommends", package],
        )?;
    }
    Ok(())
}

/// Upgrade packages that are already installed, without pulling new ones in.
///
/// # Errors
///
/// The first failing `apt-get` invocation.
pub fn upgrade_packages(packages: &[&str]) -> Result<(), RunError> {
    for package in packages {
        run("apt-get", &["-y", "install", "--only-upgrade", package])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExitKind;

    #[test]
    fn run_echo() {
        let result = run("echo", &["hello"]).expect("echo should run");
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn run_failure_is_classified() {
        let err = run("false", &[]).expect_err("non-zero exit should fail");
        assert_eq!(err.kind(), ExitKind::General);
    }

    #[test]
    fn run_missing_binary_is_spawn_error() {
        let err = run("this-binary-does-not-exist-2718", &[]).expect_err("should not spawn");
        assert!(matches!(err, RunError::Spawn { .. }), "unexpected error: {err}");
        assert_eq!(err.kind(), ExitKind::MissingBinary);
    }

    #[test]
    fn run_unchecked_failure_reports_status() {
        let result = run_unchecked("false", &[]).expect("spawn should succeed");
        assert!(!result.success, "non-zero exit should set success=false");
    }

    #[test]
    fn run_with_stdin_feeds_input() {
        let result = run_with_stdin("cat", &[], "secret\n").expect("cat should run");
        assert_eq!(result.stdout, "secret\n");
    }

    #[test]
    fn run_in_tempdir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run_in(dir.path(), "pwd", &[]).expect("pwd should run");
        assert!(result.success);
    }

    #[test]
    fn is_installed_known_and_missing() {
        assert!(is_installed("echo") || is_installed("sh"), "a shell builtin binary should exist");
        assert!(!is_installed("this-binary-does-not-exist-2718"));
    }

    #[test]
    fn combined_output_merges_streams() {
        let result = ExecResult {
            stdout: "out\n".to_owned(),
            stderr: "err\n".to_owned(),
            success: false,
            code: Some(1),
        };
        assert_eq!(result.combined(), "out\nerr");
    }
}
