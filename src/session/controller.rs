//! Debug session controller.
//!
//! Owns exactly one debugger child process at a time and exposes the
//! four session operations: start a plain `pdb` session, start a
//! `pytest --pdb` run, execute a command, and cleanup. All operations
//! return explicit `Result` values; the MCP adapter owns turning them
//! into caller-facing text.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::GlobalConfig;
use crate::{AppError, Result};

use super::{collector, interpreter, launcher, quiescence};

/// Commands that terminate the debugger when sent via [`DebugSession::execute`].
const TERMINATING_COMMANDS: &[&str] = &["q", "quit", "exit"];

/// Marker appended to the final response when the session ends.
const SESSION_ENDED_MARKER: &str = "\n\n[Debug session has ended]";

/// Returned in place of an empty response while the child is still
/// alive, so callers can tell "silently executed" from a protocol
/// failure.
const NO_OUTPUT_MARKER: &str = "[Command executed, no output]";

/// Bounded wait for the collector task to finish during cleanup.
const COLLECTOR_JOIN_WAIT: Duration = Duration::from_secs(1);

/// Startup quiescence window when the caller supplies none.
const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(5);

/// Session-layer tuning shared by every session in a registry.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Fallback interpreter command when resolution finds nothing.
    pub interpreter_fallback: String,
    /// Grace wait after a prompt match.
    pub prompt_grace: Duration,
    /// Delay between a terminating command and teardown.
    pub quit_grace: Duration,
    /// Bounded wait for child exit before force-kill.
    pub kill_wait: Duration,
}

impl SessionSettings {
    /// Derive settings from the global configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            interpreter_fallback: config.interpreter.fallback.clone(),
            prompt_grace: config.prompt_grace(),
            quit_grace: config.quit_grace(),
            kill_wait: config.kill_wait(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&GlobalConfig::default())
    }
}

/// Caller-supplied options for the two start operations.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Explicit interpreter path; wins over venv probing when set.
    pub interpreter_path: Option<String>,
    /// Quiescence window for the startup banner; the configured default
    /// applies when absent.
    pub timeout: Option<Duration>,
    /// Working directory for the debugger process.
    pub cwd: Option<PathBuf>,
    /// Environment overrides merged on top of the inherited environment.
    pub env: Option<HashMap<String, String>>,
}

/// Stateful binding between this server and one live debugger child.
///
/// Single-tenant: at most one child process at any time. Restartable:
/// after cleanup the session returns to its initial empty state.
pub struct DebugSession {
    settings: SessionSettings,
    child: Option<Child>,
    stdin: Option<tokio::process::ChildStdin>,
    output_rx: Option<mpsc::UnboundedReceiver<String>>,
    collector: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl DebugSession {
    /// Create an idle session.
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            child: None,
            stdin: None,
            output_rx: None,
            collector: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Whether a child process handle is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.child.is_some()
    }

    /// Start a `pdb` session for `script_path`.
    ///
    /// Resolves the interpreter, launches `{python} -m pdb {script}`
    /// plus any `args`, and captures the debugger's startup banner via
    /// one quiescence window. The returned text is a status header
    /// followed by that banner.
    ///
    /// # Errors
    ///
    /// `AppError::AlreadyActive` when a child is already running;
    /// `AppError::Spawn` when process creation fails. Any setup failure
    /// tears the partial session down before returning.
    pub async fn start(&mut self, script_path: &str, args: &str, opts: &LaunchOptions) -> Result<String> {
        let python = interpreter::resolve(
            opts.interpreter_path.as_deref(),
            &self.settings.interpreter_fallback,
        );

        let mut command_line = format!("{python} -m pdb {script_path}");
        if !args.is_empty() {
            command_line.push(' ');
            command_line.push_str(args);
        }

        let banner = self.start_command(&command_line, opts).await?;

        let mut result = format!("Debug session started for: {script_path}\nUsing Python: {python}");
        if let Some(ref dir) = opts.cwd {
            result.push_str(&format!("\nWorking directory: {}", dir.display()));
        }
        result.push_str("\n\n");
        result.push_str(&banner);
        Ok(result)
    }

    /// Start a `pytest --pdb` session.
    ///
    /// On a test failure pytest drops into pdb; until then the run
    /// streams ordinary test output, which is why this operation's
    /// default timeout is longer than `start`'s.
    ///
    /// # Errors
    ///
    /// Same failure modes and teardown behavior as [`DebugSession::start`].
    pub async fn start_test_run(&mut self, args: &str, opts: &LaunchOptions) -> Result<String> {
        let python = interpreter::resolve(
            opts.interpreter_path.as_deref(),
            &self.settings.interpreter_fallback,
        );

        let mut command_line = format!("{python} -m pytest --pdb");
        if !args.is_empty() {
            command_line.push(' ');
            command_line.push_str(args);
        }

        let banner = self.start_command(&command_line, opts).await?;

        let mut result = format!("Pytest debug session started\nCommand: {command_line}");
        if let Some(ref dir) = opts.cwd {
            result.push_str(&format!("\nWorking directory: {}", dir.display()));
        }
        result.push_str("\n\n");
        result.push_str(&banner);
        Ok(result)
    }

    /// Launch an arbitrary debugger command line and capture its startup
    /// output. Shared by both start paths.
    ///
    /// # Errors
    ///
    /// `AppError::AlreadyActive` when a child is already held, otherwise
    /// the launcher's failure modes. The partially constructed session
    /// is torn down before an error is returned.
    pub async fn start_command(&mut self, command_line: &str, opts: &LaunchOptions) -> Result<String> {
        if self.child.is_some() {
            return Err(AppError::AlreadyActive(
                "a debugging session is already running".into(),
            ));
        }

        match self.try_launch(command_line, opts).await {
            Ok(banner) => Ok(banner),
            Err(err) => {
                self.cleanup().await;
                Err(err)
            }
        }
    }

    async fn try_launch(&mut self, command_line: &str, opts: &LaunchOptions) -> Result<String> {
        let mut child = launcher::launch(command_line, opts.cwd.as_deref(), opts.env.as_ref())?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Spawn("failed to capture debugger stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Spawn("failed to capture debugger stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Spawn("failed to capture debugger stderr".into()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = collector::spawn(stdout, stderr, tx, cancel.clone());

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.output_rx = Some(rx);
        self.collector = Some(handle);
        self.cancel = cancel;

        // First quiescence window captures the startup banner / prompt.
        let timeout = opts.timeout.unwrap_or(DEFAULT_START_TIMEOUT);
        let rx = self
            .output_rx
            .as_mut()
            .ok_or_else(|| AppError::Spawn("output channel missing after launch".into()))?;
        let banner = quiescence::collect(rx, timeout, self.settings.prompt_grace).await;

        Ok(banner)
    }

    /// Execute one debugger command and return its output.
    ///
    /// Stale buffered output from earlier exchanges is discarded before
    /// the command is written, so the returned text reflects only what
    /// this command produced. Terminating commands (`q`, `quit`,
    /// `exit`) always tear the session down and append the
    /// session-ended marker; so does a child that exited on its own.
    ///
    /// # Errors
    ///
    /// `AppError::NoActiveSession` when idle or the child has already
    /// exited; `AppError::Write` when the stdin write or flush fails.
    pub async fn execute(&mut self, command: &str, timeout: Duration) -> Result<String> {
        if self.child_exited() {
            return Err(AppError::NoActiveSession(
                "no active debugging session".into(),
            ));
        }

        if let Some(rx) = self.output_rx.as_mut() {
            quiescence::discard_pending(rx);
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| AppError::NoActiveSession("debugger stdin is closed".into()))?;
        stdin
            .write_all(format!("{command}\n").as_bytes())
            .await
            .map_err(|err| AppError::Write(format!("failed to send command: {err}")))?;
        stdin
            .flush()
            .await
            .map_err(|err| AppError::Write(format!("failed to flush command: {err}")))?;

        let rx = self
            .output_rx
            .as_mut()
            .ok_or_else(|| AppError::NoActiveSession("output channel is closed".into()))?;
        let output = quiescence::collect(rx, timeout, self.settings.prompt_grace).await;

        debug!(command, bytes = output.len(), "debugger command completed");

        // Terminating commands end the session no matter what the
        // quiescence wait produced.
        if TERMINATING_COMMANDS.contains(&command.trim()) {
            time::sleep(self.settings.quit_grace).await;
            self.cleanup().await;
            return Ok(format!("{output}{SESSION_ENDED_MARKER}"));
        }

        if self.child_exited() {
            self.cleanup().await;
            return Ok(format!("{output}{SESSION_ENDED_MARKER}"));
        }

        if output.is_empty() {
            return Ok(NO_OUTPUT_MARKER.to_owned());
        }

        Ok(output)
    }

    /// Tear the session down and return it to its initial empty state.
    ///
    /// Idempotent and infallible: cancels the collector, closes the
    /// child's stdin, requests graceful termination with a bounded
    /// wait, force-kills on timeout, and swallows every failure along
    /// the way. Teardown typically runs during error recovery or host
    /// shutdown, where there is nothing useful to do with a failure.
    pub async fn cleanup(&mut self) {
        self.cancel.cancel();

        // Dropping the write end closes the child's stdin.
        self.stdin = None;

        if let Some(mut child) = self.child.take() {
            request_terminate(&child);
            match time::timeout(self.settings.kill_wait, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(%status, "debugger process exited");
                }
                Ok(Err(err)) => {
                    warn!(%err, "failed to reap debugger process");
                }
                Err(_elapsed) => {
                    warn!("debugger did not exit in time, force killing");
                    if let Err(err) = child.kill().await {
                        warn!(%err, "force kill failed");
                    }
                }
            }
        }

        if let Some(handle) = self.collector.take() {
            let abort = handle.abort_handle();
            if time::timeout(COLLECTOR_JOIN_WAIT, handle).await.is_err() {
                abort.abort();
            }
        }

        // Buffered output dies with the receiver.
        self.output_rx = None;
        // Fresh token so the session is restartable.
        self.cancel = CancellationToken::new();
    }

    /// Whether the child is gone or has already exited.
    fn child_exited(&mut self) -> bool {
        match self.child.as_mut() {
            None => true,
            Some(child) => !matches!(child.try_wait(), Ok(None)),
        }
    }
}

/// Ask the child to terminate gracefully (SIGTERM). Failures are
/// ignored; the bounded wait in cleanup escalates to a kill.
#[cfg(unix)]
fn request_terminate(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Ok(raw) = i32::try_from(pid) {
            let _ = kill(Pid::from_raw(raw), Signal::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
fn request_terminate(_child: &Child) {}
