//! Tool gateway: dispatches `set`/`get` calls to the remote store and shapes the reply text.

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::remote::{GetOutcome, ResDbClient, SetOutcome};
use crate::tools::{KvTool, ToolCall};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::Value;
use tracing::{debug, warn};

/// Name reported in the MCP `initialize` handshake.
pub const SERVER_NAME: &str = "resilientdb";

/// The single text block returned for every successful tool invocation.
///
/// Remote rejections are also carried here; only malformed calls and transport failures
/// become errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
}

impl ToolResult {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<ToolResult> for CallToolResult {
    fn from(value: ToolResult) -> Self {
        CallToolResult::success(vec![Content::text(value.text)])
    }
}

#[derive(Debug, Clone)]
pub struct Gateway {
    client: ResDbClient,
}

impl Gateway {
    /// Build a gateway for the configured remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            client: ResDbClient::new(config)?,
        })
    }

    /// Static descriptors for every supported tool.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        KvTool::ALL.into_iter().map(KvTool::descriptor).collect()
    }

    /// Validate and execute one tool call.
    ///
    /// Unknown names and invalid arguments fail before any network traffic.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool`, `InvalidArgument`, or a transport/decode error from the remote
    /// call.
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> Result<ToolResult> {
        let call = ToolCall::parse(name, arguments)?;
        debug!(tool = %call.tool(), key = %call.key(), "tool call");

        let result = self.execute(call).await;
        if let Err(e) = &result {
            warn!(tool = %name, error = %e, "tool call failed");
        }
        result
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        match call {
            ToolCall::Set(req) => match self.client.set(&req.key, &req.value).await? {
                SetOutcome::Stored => Ok(ToolResult::new(format!(
                    "Successfully set key: {}",
                    req.key
                ))),
                SetOutcome::Rejected(status) => {
                    Ok(ToolResult::new(format!("Error setting key: {status}")))
                }
            },
            ToolCall::Get(req) => match self.client.get(&req.key).await? {
                GetOutcome::Found(value) => Ok(ToolResult::new(value_text(value))),
                GetOutcome::NotFound => Ok(ToolResult::new(format!("Key not found: {}", req.key))),
                GetOutcome::Rejected(status) => {
                    Ok(ToolResult::new(format!("Error getting key: {status}")))
                }
            },
        }
    }
}

/// Strings are returned verbatim; anything else as compact JSON.
fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl ServerHandler for Gateway {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Store and retrieve string values in ResilientDB: `set` writes a key, `get` reads it."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        self.call(&request.name, request.arguments)
            .await
            .map(CallToolResult::from)
            .map_err(ErrorData::from)
    }
}
