//! MCP server handler, shared application state, and tool router.

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::{
    tool::{ToolCallContext, ToolRoute, ToolRouter},
    ServerHandler,
};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use tracing::info_span;

use crate::config::GlobalConfig;
use crate::session::SessionRegistry;

/// Shared application state accessible by all MCP tool handlers.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Debug session registry, keyed by caller-chosen session id.
    pub sessions: Arc<SessionRegistry>,
}

/// MCP server implementation that exposes the three debugging tools.
pub struct RelayServer {
    state: Arc<AppState>,
}

impl RelayServer {
    /// Create a new MCP server bound to shared application state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Access the shared application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    fn tool_router() -> ToolRouter<Self> {
        let mut router = ToolRouter::new();

        for tool in Self::all_tools() {
            let name = tool.name.to_string();
            match name.as_str() {
                "start_debug" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::start_debug::handle(context))
                    }));
                }
                "start_pytest_debug" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::start_pytest_debug::handle(context))
                    }));
                }
                "execute_pdb_command" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::execute_command::handle(context))
                    }));
                }
                _ => {
                    router.add_route(ToolRoute::new_dyn(tool, |_context| {
                        Box::pin(async {
                            Err(rmcp::ErrorData::internal_error(
                                "tool not implemented",
                                None,
                            ))
                        })
                    }));
                }
            }
        }

        router
    }

    /// Convert a `serde_json::Value::Object` into the `Arc<Map>` expected by `Tool`.
    fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
        match value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::default()),
        }
    }

    #[allow(clippy::too_many_lines)] // Tool definitions are intentionally verbose for clarity.
    fn all_tools() -> Vec<Tool> {
        vec![
            Tool {
                name: "start_debug".into(),
                description: Some(
                    "Start a Python debugging session using pdb. Launches the Python \
                     debugger for the specified script and returns its startup output. \
                     Returns as soon as the pdb prompt is detected, or after `timeout` \
                     seconds of output silence."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "script_path": {
                            "type": "string",
                            "description": "Path to the Python script to debug (e.g., 'script.py' or '/path/to/script.py')"
                        },
                        "args": {
                            "type": "string",
                            "description": "Optional command-line arguments to pass to the script",
                            "default": ""
                        },
                        "python_path": {
                            "type": "string",
                            "description": "Path to the Python interpreter for the project being debugged. The agent typically knows the project's interpreter path. Leave empty to probe the working directory's virtualenv, then fall back to 'python'.",
                            "default": ""
                        },
                        "timeout": {
                            "type": "number",
                            "description": "Time to wait without new output before returning (seconds). Returns immediately when the pdb prompt is detected. Default: 5.0",
                            "default": 5.0
                        },
                        "working_directory": {
                            "type": "string",
                            "description": "Directory to run the command in. Defaults to the server's current directory.",
                            "default": ""
                        },
                        "env": {
                            "type": "object",
                            "description": "Optional environment variables for the debugging session (e.g., {'DEBUG': '1'}). Added on top of the existing environment.",
                            "default": {}
                        },
                        "session_id": {
                            "type": "string",
                            "description": "Opaque session identifier; use distinct ids to hold multiple debugger sessions at once.",
                            "default": "default"
                        }
                    },
                    "required": ["script_path", "python_path", "working_directory"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "start_pytest_debug".into(),
                description: Some(
                    "Start a pytest debugging session using 'pytest --pdb'. When a test \
                     fails, pytest drops into pdb for interactive debugging. Use args to \
                     control test selection and when failures trigger debugging (e.g., \
                     '-x' to stop at the first failure)."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "args": {
                            "type": "string",
                            "description": "Arguments passed after 'pytest --pdb'. Selection: 'test_module.py', 'test_module.py::test_function', 'tests/'. Filtering: '-k keyword', '-m marker', '-x' (first failure), '--maxfail=3'. Output: '-v', '-s', '--tb=short', '-q'. Re-run: '--lf', '--ff'. Leave empty to run all tests in the working directory.",
                            "default": ""
                        },
                        "python_path": {
                            "type": "string",
                            "description": "Path to the Python interpreter for the project being debugged. Leave empty to probe the working directory's virtualenv, then fall back to 'python'.",
                            "default": ""
                        },
                        "timeout": {
                            "type": "number",
                            "description": "Time to wait without new output before returning (seconds). Returns immediately when the pdb prompt is detected. Default: 10.0",
                            "default": 10.0
                        },
                        "working_directory": {
                            "type": "string",
                            "description": "Directory to run the command in. Defaults to the server's current directory.",
                            "default": ""
                        },
                        "env": {
                            "type": "object",
                            "description": "Optional environment variables for the debugging session. Added on top of the existing environment.",
                            "default": {}
                        },
                        "session_id": {
                            "type": "string",
                            "description": "Opaque session identifier; use distinct ids to hold multiple debugger sessions at once.",
                            "default": "default"
                        }
                    },
                    "required": ["args", "python_path", "working_directory"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "execute_pdb_command".into(),
                description: Some(
                    "Execute a pdb command in the active debugging session.\n\n\
                     Execution control: n (next), s (step), c (continue), r (return), \
                     until <line>, j <line> (jump), run/restart, q (quit).\n\
                     Breakpoints: b <line>, b <file>:<line>, b <function>, tbreak <line>, \
                     cl [<breakpoint>], disable/enable <breakpoint>, \
                     condition <breakpoint> <expr>, ignore <breakpoint> <count>.\n\
                     Inspection: l (list), ll (longlist), w (where), u (up), d (down), \
                     a (args), whatis <expr>.\n\
                     Variables: p <expr>, pp <expr>, display <expr>, undisplay, \
                     ! <statement>.\n\
                     Other: h [<command>] for help."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "The pdb command to execute (e.g., 'n', 's', 'l', 'p variable_name', 'c')"
                        },
                        "timeout": {
                            "type": "number",
                            "description": "Time to wait without new output before returning (seconds). Returns immediately when the pdb prompt is detected. Default: 5.0",
                            "default": 5.0
                        },
                        "session_id": {
                            "type": "string",
                            "description": "Session to address; matches the id used at start.",
                            "default": "default"
                        }
                    },
                    "required": ["command"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
        ]
    }
}

impl ServerHandler for RelayServer {
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + '_ {
        let router = Self::tool_router();
        let _span = info_span!("call_tool", tool = %request.name).entered();

        async move {
            router
                .call(ToolCallContext::new(self, request, context))
                .await
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, rmcp::ErrorData>> + Send + '_ {
        let tools = Self::all_tools();

        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }
}
