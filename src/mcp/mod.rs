//! MCP (Model Context Protocol) Server Implementation
//!
//! This module provides a complete MCP server implementation following the
//! JSON-RPC 2.0 specification and MCP protocol version 2025-06-18.


pub mod errors;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod tools;
pub mod validation;

pub use errors::{McpError, McpResult};
pub use protocol::{CallToolParams, CallToolResult, ListToolsResult, Tool, ToolContent};
pub use registry::{RegistryBuilder, ToolHandler, ToolRegistry};
pub use server::{ConnectionState, McpServer, MessageHandler, ServerHealthStatus};
pub use validation::McpValidator;
