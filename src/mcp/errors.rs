//! MCP Error Handling
//!
//! This module provides error classification for the MCP server, along with
//! conversion into JSON-RPC error responses.

use crate::mcp::protocol::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcMessage, RequestId, error_codes, mcp_error_codes,
};
use thiserror::Error;
use tracing::error;

/// MCP-specific errors that can occur during server operation
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Protocol version not supported: {version}. Supported versions: {supported:?}")]
    UnsupportedProtocolVersion {
        version: String,
        supported: Vec<String>,
    },

    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("Tool already registered: {name}")]
    DuplicateTool { name: String },

    #[error("Invalid input schema for tool {tool}: {message}")]
    InvalidToolSchema { tool: String, message: String },

    #[error("Invalid arguments for tool {tool}: {message}")]
    InvalidToolArguments { tool: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Convert MCP error to JSON-RPC error
    #[inline]
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Self::UnsupportedProtocolVersion { version, supported } => JsonRpcError::new(
                mcp_error_codes::INVALID_PROTOCOL_VERSION,
                format!(
                    "Unsupported protocol version: {}. Supported: {}",
                    version,
                    supported.join(", ")
                ),
                None,
            ),
            Self::ToolNotFound { name } => JsonRpcError::new(
                mcp_error_codes::TOOL_NOT_FOUND,
                format!("Tool not found: {}", name),
                None,
            ),
            Self::DuplicateTool { name } => JsonRpcError::new(
                error_codes::INTERNAL_ERROR,
                format!("Tool already registered: {}", name),
                None,
            ),
            Self::InvalidToolSchema { tool, message } => JsonRpcError::new(
                error_codes::INTERNAL_ERROR,
                format!("Invalid input schema for tool '{}': {}", tool, message),
                None,
            ),
            Self::InvalidToolArguments { tool, message } => JsonRpcError::new(
                error_codes::INVALID_PARAMS,
                format!("Invalid arguments for tool '{}': {}", tool, message),
                None,
            ),
            Self::ValidationError { message } => JsonRpcError::new(
                error_codes::INVALID_PARAMS,
                format!("Validation error: {}", message),
                None,
            ),
            Self::InternalError { message } => {
                JsonRpcError::new(error_codes::INTERNAL_ERROR, message.clone(), None)
            }
        }
    }

    /// Create error response message
    #[inline]
    pub fn to_error_response(&self, id: Option<RequestId>) -> JsonRpcMessage {
        let error = self.to_jsonrpc_error();
        let error_response = JsonRpcErrorResponse::new(error, id);
        JsonRpcMessage::ErrorResponse(error_response)
    }

    /// Log the error with appropriate level
    #[inline]
    pub fn log(&self) {
        match self {
            Self::ToolNotFound { .. } => {
                error!("Not found error: {}", self);
            }
            Self::InvalidToolArguments { .. } | Self::ValidationError { .. } => {
                error!("Client error: {}", self);
            }
            Self::DuplicateTool { .. }
            | Self::InvalidToolSchema { .. }
            | Self::InternalError { .. } => {
                error!("Server error: {}", self);
            }
            Self::UnsupportedProtocolVersion { .. } => {
                error!("MCP error: {}", self);
            }
        }
    }
}

/// Error handler utility for consistent error processing
pub struct ErrorHandler;

impl ErrorHandler {
    /// Handle any error and convert to appropriate JSON-RPC response
    #[inline]
    pub fn handle_error(error: &anyhow::Error, id: Option<RequestId>) -> JsonRpcMessage {
        // Try to downcast to MCP error first
        if let Some(mcp_error) = error.downcast_ref::<McpError>() {
            mcp_error.log();
            return mcp_error.to_error_response(id);
        }

        // Handle other error types
        error!("Unexpected error: {}", error);
        let internal_error = McpError::InternalError {
            message: error.to_string(),
        };
        internal_error.to_error_response(id)
    }
}

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;
