//! Minimal MCP server exposing one custom tool.
//!
//! Run with: cargo run --example custom_tool
//! Then speak newline-delimited JSON-RPC on stdin, e.g.
//!   {"jsonrpc":"2.0","id":1,"method":"tools/list"}

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use toolkit_mcp::mcp::{
    CallToolParams, CallToolResult, McpServer, Tool, ToolHandler, ToolRegistry,
};

struct ReverseHandler;

#[async_trait]
impl ToolHandler for ReverseHandler {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let text = params
            .arguments
            .as_ref()
            .and_then(|args| args.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let reversed: String = text.chars().rev().collect();
        Ok(CallToolResult::text(reversed))
    }
}

fn reverse_tool() -> Tool {
    Tool {
        name: "reverse".to_string(),
        description: Some("Reverse a string".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"}
            },
            "required": ["text"],
            "additionalProperties": false
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let registry = ToolRegistry::builder()
        .register(reverse_tool(), ReverseHandler)?
        .build();

    let server = Arc::new(McpServer::new(
        "custom-tool-demo".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
        registry,
    )?);

    server.serve_stdio().await
}
