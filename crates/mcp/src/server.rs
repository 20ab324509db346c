//! MCP server over a shared [`ToolRegistry`].
//!
//! `tools/call` goes through [`ToolRegistry::execute`], so a call that fails
//! validation or upstream still answers with the tool's JSON payload
//! (`isError: true`). Only a tool name the registry does not know is a
//! JSON-RPC error.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use jgrants_tool_runtime::ToolRegistry;

use crate::error::McpError;
use crate::transport::McpTransport;
use crate::types::*;

pub const SERVER_NAME: &str = "jgrants-subsidy-search";

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serve until the transport closes.
    pub async fn run<T: McpTransport>(&self, transport: &mut T) -> Result<(), McpError> {
        info!(server = %self.name, tools = self.registry.len(), "MCP server starting");

        while let Some(line) = transport.receive().await? {
            debug!(message = %line, "received");
            if let Some(response) = self.handle_line(&line).await {
                let json = serde_json::to_string(&response)?;
                transport.send(&json).await?;
            }
        }

        info!("transport closed, shutting down");
        Ok(())
    }

    /// Decode one line and answer it. Notifications yield `None`.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(McpError::JsonParse(e).into_response(RpcId::Null));
            }
        };

        let Some(id) = raw.get("id").cloned() else {
            if let Ok(notification) = serde_json::from_value::<JsonRpcNotification>(raw) {
                debug!(method = %notification.method, "notification");
            }
            return None;
        };

        match serde_json::from_value::<JsonRpcRequest>(raw) {
            Ok(request) => Some(self.handle_request(&request).await),
            Err(e) => {
                let id = serde_json::from_value(id).unwrap_or(RpcId::Null);
                Some(McpError::InvalidRequest(e.to_string()).into_response(id))
            }
        }
    }

    pub async fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        match request.method.as_str() {
            "initialize" => respond(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                let tools = self.registry.list().into_iter().map(ToolInfo::from).collect();
                respond(id, ListToolsResult { tools })
            }
            "tools/call" => match self.call_tool(&request.params).await {
                Ok(result) => respond(id, result),
                Err(e) => e.into_response(id),
            },
            method => {
                warn!(method = %method, "unknown method");
                McpError::MethodNotFound(method.to_string()).into_response(id)
            }
        }
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: self.version.clone(),
            },
        }
    }

    async fn call_tool(&self, params: &Option<Value>) -> Result<CallToolResult, McpError> {
        let params = params
            .clone()
            .ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
        let call: CallToolParams =
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        if self.registry.get(&call.name).is_none() {
            return Err(McpError::UnknownTool(call.name));
        }

        debug!(tool = %call.name, "tools/call");
        let result = self.registry.execute(&call.name, call.arguments).await;
        Ok(CallToolResult {
            content: vec![ToolContent::Text {
                text: result.to_content(),
            }],
            is_error: !result.success,
        })
    }
}

fn respond<T: Serialize>(id: RpcId, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => McpError::JsonParse(e).into_response(id),
    }
}
