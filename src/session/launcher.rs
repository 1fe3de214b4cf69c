//! Debugger process launcher.
//!
//! Spawns the debugger child with piped stdin/stdout/stderr,
//! inherited-plus-overridden environment, and an optional working
//! directory. The command line goes through the platform shell because
//! the tool contract takes script arguments as a single free-form
//! string; the shell owns word splitting and quoting, exactly as a
//! human would type it.
//!
//! `kill_on_drop(true)` is set so a failed setup path cannot leak a
//! child process.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::{AppError, Result};

/// Wrap a command line in the platform shell.
#[cfg(unix)]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}

/// Spawn the debugger process for `command_line`.
///
/// The child inherits this process's environment with `env` merged on
/// top (later wins; unspecified variables pass through untouched). If
/// `cwd` is given it becomes the child's working directory; otherwise
/// the child inherits the host's.
///
/// # Errors
///
/// Returns `AppError::Spawn` wrapping the OS error when process
/// creation fails (missing shell, unusable working directory).
pub fn launch(
    command_line: &str,
    cwd: Option<&Path>,
    env: Option<&HashMap<String, String>>,
) -> Result<Child> {
    let mut cmd = shell_command(command_line);

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    if let Some(overrides) = env {
        cmd.envs(overrides);
    }

    let child = cmd
        .spawn()
        .map_err(|err| AppError::Spawn(format!("failed to spawn debugger: {err}")))?;

    let cwd_display = cwd.map(|dir| dir.display().to_string());
    info!(
        pid = child.id().unwrap_or(0),
        command = command_line,
        cwd = cwd_display.as_deref(),
        "debugger process spawned"
    );

    Ok(child)
}
