//! `execute_pdb_command` MCP tool handler.
//!
//! Writes one command to the addressed session's debugger and returns
//! whatever text accumulated before the next quiescence point.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info, info_span, Instrument};

use crate::mcp::handler::RelayServer;
use crate::AppError;

use super::{default_session_id, timeout_duration, NO_ACTIVE_SESSION_TEXT};

/// Input parameters per the tool schema.
#[derive(Debug, serde::Deserialize)]
struct ExecuteInput {
    /// The pdb command to execute.
    command: String,
    /// Quiescence window in seconds.
    timeout: Option<f64>,
    /// Session to address.
    #[serde(default = "default_session_id")]
    session_id: String,
}

/// Handle the `execute_pdb_command` tool call.
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

    let input: ExecuteInput =
        serde_json::from_value(serde_json::Value::Object(args)).map_err(|err| {
            rmcp::ErrorData::invalid_params(
                format!("invalid execute_pdb_command parameters: {err}"),
                None,
            )
        })?;

    let span = info_span!(
        "execute_pdb_command",
        command = %input.command,
        session_id = %input.session_id,
    );

    async move {
        let timeout = timeout_duration(
            input
                .timeout
                .unwrap_or(state.config.timeouts.execute_seconds),
        )?;

        let session = state.sessions.session(&input.session_id).await;
        let mut guard = session.lock().await;

        let text = match guard.execute(&input.command, timeout).await {
            Ok(text) => text,
            Err(AppError::NoActiveSession(_)) => NO_ACTIVE_SESSION_TEXT.to_owned(),
            Err(err) => format!("Error executing command: {err}"),
        };

        info!(
            session_id = %input.session_id,
            bytes = text.len(),
            "execute_pdb_command completed"
        );

        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            text,
        )]))
    }
    .instrument(span)
    .await
}
