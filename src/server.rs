//! MCP server implementation using rmcp over stdio transport.
//!
//! Exposes the AgentOps `list_traces` and `trace_detail` tools. The server is
//! stateless between calls: it holds only the immutable tool registry.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, JsonObject, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};

use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::tools::ToolRegistry;

/// Name advertised to MCP clients during initialization.
pub const SERVER_NAME: &str = "mcp-agentops-api";

// ---------------------------------------------------------------------------
// Server struct
// ---------------------------------------------------------------------------

/// AgentOps MCP server.
///
/// `Clone` is required by rmcp's `ServerHandler`; clones share the registry.
#[derive(Debug, Clone)]
pub struct AgentOpsServer {
    registry: Arc<ToolRegistry>,
}

impl AgentOpsServer {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new(config)),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Tool listing as returned to MCP clients.
    pub fn tools(&self) -> ListToolsResult {
        ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: self.registry.tools_list(),
        }
    }

    /// Dispatch a tool call by name.
    ///
    /// Unknown names and argument problems become `invalid_params`; upstream
    /// failures become `internal_error`. A successful call yields exactly one
    /// text content item holding the upstream body.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let Some(kind) = self.registry.handler(name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return Err(AdapterError::UnknownTool(name.to_string()).into());
        };

        match self
            .registry
            .call(kind, arguments.unwrap_or_default())
            .await
        {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                tracing::warn!(tool = %kind, error = %e, "tool call failed");
                Err(e.into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ServerHandler
// ---------------------------------------------------------------------------

impl ServerHandler for AgentOpsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "AgentOps API MCP server. Use list_traces to find recent traces in your \
                 project, then trace_detail with a trace_id from that listing to get all \
                 spans. Every call needs AGENTOPS_API_KEY; AGENTOPS_API_URL optionally \
                 overrides the endpoint."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(request.name.as_ref(), request.arguments).await
    }
}

// ---------------------------------------------------------------------------
// Public entry point: run the MCP server over stdio
// ---------------------------------------------------------------------------

/// Start the MCP server on stdin/stdout.
///
/// Returns when the client disconnects. Transport failures are propagated;
/// failures inside individual tool calls are not.
pub async fn run_server(config: AdapterConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(api_url = %config.api_url, "starting AgentOps API MCP server");
    let server = AgentOpsServer::new(&config);
    let transport = rmcp::transport::io::stdio();
    let running = server.serve(transport).await.inspect_err(|e| {
        tracing::error!("MCP server error: {}", e);
    })?;
    let reason = running.waiting().await?;
    tracing::info!(?reason, "MCP server stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
