use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    config::SlackConfig,
    connectors::slack::SlackApi,
    tools::{SlackTool, ToolContext, ToolRegistry},
    ConnectorError,
};
use rmcp::model::*;

pub const SERVER_NAME: &str = "parley";

/// Dispatches MCP tool requests onto the Slack tool table.
pub struct McpServer {
    tools: ToolRegistry,
    slack: Arc<dyn SlackApi>,
    config: Arc<SlackConfig>,
}

impl McpServer {
    pub fn new(config: SlackConfig, slack: Arc<dyn SlackApi>) -> Self {
        Self::with_tools(config, slack, ToolRegistry::standard())
    }

    /// Serve a custom tool table instead of the standard eight.
    pub fn with_tools(
        config: SlackConfig,
        slack: Arc<dyn SlackApi>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            tools,
            slack,
            config: Arc::new(config),
        }
    }

    pub fn get_capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: Some(Default::default()),
            ..Default::default()
        }
    }

    /// Handle initialize request
    pub async fn handle_initialize(
        &self,
        request: InitializeRequestParam,
    ) -> Result<InitializeResult, ConnectorError> {
        info!(
            client = %request.client_info.name,
            client_version = %request.client_info.version,
            "MCP client initializing"
        );

        Ok(InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: self.get_capabilities(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Slack workspace tools: list channels and users, read history and threads, post messages, replies and reactions."
                    .to_string(),
            ),
        })
    }

    /// Handle list_tools request. The catalog is static and always fits one page.
    pub async fn handle_list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ConnectorError> {
        Ok(ListToolsResult {
            tools: self.tools.descriptors(),
            next_cursor: None,
        })
    }

    /// Handle call_tool request.
    ///
    /// Only an unknown tool name is an `Err`. Once a tool is found, whatever
    /// happens inside it comes back as a `CallToolResult`, with `is_error`
    /// set on failure.
    pub async fn handle_call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ConnectorError> {
        self.call_tool(request.name.as_ref(), request.arguments.map(Value::Object))
            .await
    }

    /// Like [`McpServer::handle_call_tool`], but takes `arguments` as raw
    /// JSON so a non-object value still reaches the tool's error envelope.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<CallToolResult, ConnectorError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ConnectorError::ToolNotFound(name.to_string()))?;

        Ok(self.invoke_guarded(tool, arguments).await)
    }

    async fn invoke_guarded(
        &self,
        tool: &dyn SlackTool,
        arguments: Option<Value>,
    ) -> CallToolResult {
        debug!(tool = tool.name(), "calling tool");
        let ctx = ToolContext {
            slack: self.slack.as_ref(),
            config: self.config.as_ref(),
        };

        let rendered = match arguments_object(arguments) {
            Ok(args) => tool.call(&ctx, args).await.and_then(|payload| {
                serde_json::to_string_pretty(&payload).map_err(ConnectorError::SerdeJson)
            }),
            Err(e) => Err(e),
        };

        match rendered {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                warn!(tool = tool.name(), code = e.code_str(), error = %e, "tool call failed");
                CallToolResult::error(vec![Content::text(format!("Slack API error: {}", e))])
            }
        }
    }
}

/// Absent or `null` arguments mean `{}`.
fn arguments_object(arguments: Option<Value>) -> Result<JsonObject, ConnectorError> {
    match arguments {
        None | Some(Value::Null) => Ok(JsonObject::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(ConnectorError::InvalidParams(format!(
            "arguments must be an object, got {}",
            other
        ))),
    }
}

/// JSON-RPC message handler for the MCP server
pub struct JsonRpcHandler {
    server: McpServer,
}

impl JsonRpcHandler {
    pub fn new(server: McpServer) -> Self {
        Self { server }
    }

    /// Process one JSON-RPC message. Notifications (no `id`) produce no
    /// response.
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        debug!("Handling JSON-RPC request: {:?}", request);

        let id = request.get("id").cloned();
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or(json!({}));

        if id.is_none() {
            if method.starts_with("notifications/") {
                debug!(method, "notification received");
            } else {
                warn!(method, "ignoring message without id");
            }
            return None;
        }

        if request.get("jsonrpc").and_then(|v| v.as_str()) != Some("2.0") || method.is_empty() {
            return Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32600, "message": "Invalid Request"},
                "id": id,
            }));
        }

        let result = match method {
            "initialize" => match serde_json::from_value::<InitializeRequestParam>(params) {
                Ok(req) => self
                    .server
                    .handle_initialize(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(ConnectorError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(ConnectorError::SerdeJson(e).to_jsonrpc_error()),
            },
            "ping" => Ok(json!({})),
            "tools/list" => match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                Ok(req) => self
                    .server
                    .handle_list_tools(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(ConnectorError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(ConnectorError::SerdeJson(e).to_jsonrpc_error()),
            },
            "tools/call" => match params.get("name").and_then(|n| n.as_str()) {
                Some(name) => self
                    .server
                    .call_tool(name, params.get("arguments").cloned())
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(ConnectorError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                None => Err(ConnectorError::InvalidParams(
                    "tools/call requires a string `name`".to_string(),
                )
                .to_jsonrpc_error()),
            },
            _ => Err(ConnectorError::MethodNotFound.to_jsonrpc_error()),
        };

        Some(match result {
            Ok(result) => json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": id,
            }),
            Err(error) => json!({
                "jsonrpc": "2.0",
                "error": error,
                "id": id,
            }),
        })
    }
}
