//! `start_debug` MCP tool handler.
//!
//! Launches `{python} -m pdb {script}` for the addressed session and
//! returns the debugger's startup banner behind a status header.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info, info_span, Instrument};

use crate::mcp::handler::RelayServer;
use crate::session::LaunchOptions;
use crate::AppError;

use super::{default_session_id, none_if_empty, timeout_duration, ALREADY_ACTIVE_TEXT};

/// Input parameters per the tool schema.
#[derive(Debug, serde::Deserialize)]
struct StartDebugInput {
    /// Script to run under the debugger.
    script_path: String,
    /// Arguments appended to the command line.
    #[serde(default)]
    args: String,
    /// Explicit interpreter path; empty means "resolve for me".
    #[serde(default)]
    python_path: String,
    /// Quiescence window in seconds for the startup banner.
    timeout: Option<f64>,
    /// Working directory for the debugger; empty means inherit.
    #[serde(default)]
    working_directory: String,
    /// Environment overrides merged on top of the host environment.
    env: Option<HashMap<String, String>>,
    /// Session slot to start.
    #[serde(default = "default_session_id")]
    session_id: String,
}

/// Handle the `start_debug` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` only for malformed parameters; session
/// failures come back as readable text in the tool result.
pub async fn handle(
    context: ToolCallContext<'_, RelayServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let args: serde_json::Map<String, serde_json::Value> = context.arguments.unwrap_or_default();

    let input: StartDebugInput =
        serde_json::from_value(serde_json::Value::Object(args)).map_err(|err| {
            rmcp::ErrorData::invalid_params(format!("invalid start_debug parameters: {err}"), None)
        })?;

    let span = info_span!(
        "start_debug",
        script = %input.script_path,
        session_id = %input.session_id,
    );

    async move {
        let timeout = timeout_duration(
            input
                .timeout
                .unwrap_or(state.config.timeouts.start_seconds),
        )?;
        let opts = LaunchOptions {
            interpreter_path: none_if_empty(input.python_path),
            timeout: Some(timeout),
            cwd: none_if_empty(input.working_directory).map(PathBuf::from),
            env: input.env,
        };

        let session = state.sessions.session(&input.session_id).await;
        let mut guard = session.lock().await;

        let text = match guard.start(&input.script_path, &input.args, &opts).await {
            Ok(text) => text,
            Err(AppError::AlreadyActive(_)) => ALREADY_ACTIVE_TEXT.to_owned(),
            Err(err) => format!("Error starting debug session: {err}"),
        };

        info!(
            session_id = %input.session_id,
            bytes = text.len(),
            "start_debug completed"
        );

        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            text,
        )]))
    }
    .instrument(span)
    .await
}
