//! MCP tool handlers.
//!
//! Each handler deserializes its arguments, calls into the session
//! layer, and formats the returned `Result` as plain text — the
//! automated caller on the other end has no recovery path other than
//! reading text, so session errors become readable sentences here, not
//! protocol faults.

pub mod execute_command;
pub mod start_debug;
pub mod start_pytest_debug;

use std::time::Duration;

/// Caller-facing text when a session slot is already occupied.
pub(crate) const ALREADY_ACTIVE_TEXT: &str =
    "Error: A debugging session is already running. Please quit the current session first.";

/// Caller-facing text when a command arrives with nothing running.
pub(crate) const NO_ACTIVE_SESSION_TEXT: &str =
    "Error: No active debugging session. Please start a session first using the start_debug tool.";

/// Session id applied when the caller does not pick one.
pub(crate) fn default_session_id() -> String {
    "default".to_owned()
}

/// Convert a caller-supplied timeout in seconds into a `Duration`.
///
/// # Errors
///
/// Returns `invalid_params` for non-finite or non-positive values;
/// `Duration` construction would otherwise panic.
pub(crate) fn timeout_duration(seconds: f64) -> Result<Duration, rmcp::ErrorData> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(rmcp::ErrorData::invalid_params(
            format!("timeout must be a positive number of seconds, got {seconds}"),
            None,
        ));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| rmcp::ErrorData::invalid_params(format!("invalid timeout: {err}"), None))
}

/// Treat an empty string argument as absent, matching the tool schema
/// convention of `""` defaults.
pub(crate) fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
