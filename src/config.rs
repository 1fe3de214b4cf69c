//! Global configuration parsing and validation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Default quiescence timeouts (seconds) for the three tool operations.
///
/// Each value is the silence window the session layer waits out before
/// handing accumulated debugger output back to the caller; a detected
/// prompt returns earlier.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Default wait when starting a plain `pdb` session.
    #[serde(default = "default_start_seconds")]
    pub start_seconds: f64,
    /// Default wait when starting a `pytest --pdb` run (test collection
    /// can take a while before the first prompt appears).
    #[serde(default = "default_test_run_seconds")]
    pub test_run_seconds: f64,
    /// Default wait for an individual debugger command.
    #[serde(default = "default_execute_seconds")]
    pub execute_seconds: f64,
}

fn default_start_seconds() -> f64 {
    5.0
}

fn default_test_run_seconds() -> f64 {
    10.0
}

fn default_execute_seconds() -> f64 {
    5.0
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            start_seconds: default_start_seconds(),
            test_run_seconds: default_test_run_seconds(),
            execute_seconds: default_execute_seconds(),
        }
    }
}

/// Session-layer tuning knobs.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Grace wait (milliseconds) after a prompt match, to catch trailing
    /// output the debugger emits in the same burst.
    #[serde(default = "default_prompt_grace_ms")]
    pub prompt_grace_ms: u64,
    /// Delay (milliseconds) between sending a terminating command and
    /// tearing the session down, giving the child a moment to exit.
    #[serde(default = "default_quit_grace_ms")]
    pub quit_grace_ms: u64,
    /// Bounded wait (seconds) for the child to exit after a graceful
    /// termination request before it is force-killed.
    #[serde(default = "default_kill_wait_seconds")]
    pub kill_wait_seconds: u64,
}

fn default_prompt_grace_ms() -> u64 {
    50
}

fn default_quit_grace_ms() -> u64 {
    100
}

fn default_kill_wait_seconds() -> u64 {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt_grace_ms: default_prompt_grace_ms(),
            quit_grace_ms: default_quit_grace_ms(),
            kill_wait_seconds: default_kill_wait_seconds(),
        }
    }
}

/// Interpreter resolution settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InterpreterConfig {
    /// Command used when no explicit path is given and no virtual
    /// environment is found; resolved through the OS search path.
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    "python".into()
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
        }
    }
}

/// Global configuration parsed from `config.toml`.
///
/// Every field has a default, so the server runs without a config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Default quiescence timeouts per operation.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Session-layer tuning.
    #[serde(default)]
    pub session: SessionConfig,
    /// Interpreter resolution settings.
    #[serde(default)]
    pub interpreter: InterpreterConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Grace wait applied after a prompt match.
    #[must_use]
    pub fn prompt_grace(&self) -> Duration {
        Duration::from_millis(self.session.prompt_grace_ms)
    }

    /// Delay between a terminating command and session teardown.
    #[must_use]
    pub fn quit_grace(&self) -> Duration {
        Duration::from_millis(self.session.quit_grace_ms)
    }

    /// Bounded wait for child exit before force-kill.
    #[must_use]
    pub fn kill_wait(&self) -> Duration {
        Duration::from_secs(self.session.kill_wait_seconds)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("timeouts.start_seconds", self.timeouts.start_seconds),
            ("timeouts.test_run_seconds", self.timeouts.test_run_seconds),
            ("timeouts.execute_seconds", self.timeouts.execute_seconds),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::Config(format!(
                    "{name} must be a positive number of seconds"
                )));
            }
        }

        if self.interpreter.fallback.is_empty() {
            return Err(AppError::Config(
                "interpreter.fallback must not be empty".into(),
            ));
        }

        Ok(())
    }
}
