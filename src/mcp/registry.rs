//! Tool Registry
//!
//! Immutable name-to-handler table assembled once at startup. Registration
//! problems (duplicate names, schemas that do not compile) surface as build
//! failures before the server accepts a single request, and lookups after
//! that point are plain reads with no locking.

use crate::mcp::errors::{McpError, McpResult};
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool, ToolContent};
use crate::mcp::validation::ToolInputSchema;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Tool handler trait for implementing tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult>;
}

/// A registered tool with its compiled schema and handler
struct ToolEntry {
    tool: Tool,
    schema: ToolInputSchema,
    handler: Box<dyn ToolHandler>,
}

/// Builder for assembling a [`ToolRegistry`]
pub struct RegistryBuilder {
    entries: HashMap<String, ToolEntry>,
    order: Vec<String>,
}

impl RegistryBuilder {
    /// Create an empty builder
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool definition together with its handler
    ///
    /// Duplicate names and malformed input schemas are rejected here, so a
    /// registry that builds successfully only ever dispatches to valid
    /// entries.
    #[inline]
    pub fn register<H>(mut self, tool: Tool, handler: H) -> McpResult<Self>
    where
        H: ToolHandler + 'static,
    {
        if self.entries.contains_key(&tool.name) {
            return Err(McpError::DuplicateTool { name: tool.name });
        }

        let schema = ToolInputSchema::compile(&tool.name, &tool.input_schema)?;

        debug!("Registered tool: {}", tool.name);
        self.order.push(tool.name.clone());
        self.entries.insert(
            tool.name.clone(),
            ToolEntry {
                tool,
                schema,
                handler: Box::new(handler),
            },
        );

        Ok(self)
    }

    /// Finalize the registry
    ///
    /// The returned table is immutable; there is no way to add or remove
    /// tools afterwards.
    #[inline]
    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            entries: self.entries,
            order: self.order,
        }
    }
}

impl Default for RegistryBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable tool table shared by the server
pub struct ToolRegistry {
    entries: HashMap<String, ToolEntry>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Start building a registry
    #[inline]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// List registered tool definitions in registration order
    #[inline]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| entry.tool.clone())
            .collect()
    }

    /// Number of registered tools
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no tools
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a tool with this exact name is registered
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Dispatch a tool call
    ///
    /// Unknown names and schema violations fail before the handler runs.
    /// Handler failures are converted into error-flagged results so one
    /// broken tool call never takes down the serving loop. Every returned
    /// result carries at least one content block.
    #[inline]
    pub async fn call(&self, params: CallToolParams) -> McpResult<CallToolResult> {
        let entry = self
            .entries
            .get(&params.name)
            .ok_or_else(|| McpError::ToolNotFound {
                name: params.name.clone(),
            })?;

        // Absent arguments validate as an empty object
        let arguments = match &params.arguments {
            Some(args) => serde_json::to_value(args).map_err(|e| McpError::InternalError {
                message: format!("Failed to serialize arguments: {}", e),
            })?,
            None => Value::Object(serde_json::Map::new()),
        };
        entry.schema.validate(&arguments)?;

        let invocation_id = Uuid::new_v4();
        let tool_name = params.name.clone();
        debug!("Invoking tool {} (invocation {})", tool_name, invocation_id);

        match entry.handler.handle(params).await {
            Ok(result) => Ok(ensure_content(result)),
            Err(e) => {
                warn!(
                    "Tool {} failed (invocation {}): {}",
                    tool_name, invocation_id, e
                );
                Ok(CallToolResult::error(format!(
                    "Tool '{}' failed: {}",
                    tool_name, e
                )))
            }
        }
    }
}

/// Pad a result so it always carries at least one content block
fn ensure_content(mut result: CallToolResult) -> CallToolResult {
    if result.content.is_empty() {
        result.content.push(ToolContent::Text {
            text: "(no output)".to_string(),
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ToolHandler for CountingHandler {
        async fn handle(&self, _params: CallToolParams) -> Result<CallToolResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallToolResult::text("ok".to_string()))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn handle(&self, _params: CallToolParams) -> Result<CallToolResult> {
            Err(anyhow!("upstream exploded"))
        }
    }

    struct EmptyHandler;

    #[async_trait]
    impl ToolHandler for EmptyHandler {
        async fn handle(&self, _params: CallToolParams) -> Result<CallToolResult> {
            Ok(CallToolResult {
                content: vec![],
                is_error: None,
            })
        }
    }

    fn tool(name: &str, schema: Value) -> Tool {
        Tool {
            name: name.to_string(),
            description: Some(format!("{} test tool", name)),
            input_schema: schema,
        }
    }

    fn open_schema() -> Value {
        json!({"type": "object"})
    }

    fn city_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "minLength": 1}
            },
            "required": ["city"],
            "additionalProperties": false
        })
    }

    #[test]
    fn duplicate_names_rejected_at_registration() {
        let builder = ToolRegistry::builder()
            .register(tool("echo", open_schema()), EmptyHandler)
            .expect("first registration succeeds");

        let result = builder.register(tool("echo", open_schema()), EmptyHandler);

        assert!(matches!(
            result,
            Err(McpError::DuplicateTool { name }) if name == "echo"
        ));
    }

    #[test]
    fn malformed_schema_rejected_at_registration() {
        let result = ToolRegistry::builder().register(tool("broken", json!({"type": 9})), EmptyHandler);

        assert!(matches!(result, Err(McpError::InvalidToolSchema { .. })));
    }

    #[tokio::test]
    async fn unknown_tool_rejected() {
        let registry = ToolRegistry::builder()
            .register(tool("echo", open_schema()), EmptyHandler)
            .expect("registration succeeds")
            .build();

        let params = CallToolParams {
            name: "does_not_exist".to_string(),
            arguments: None,
        };
        let result = registry.call(params).await;

        assert!(matches!(
            result,
            Err(McpError::ToolNotFound { name }) if name == "does_not_exist"
        ));
    }

    #[tokio::test]
    async fn arguments_checked_before_handler_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ToolRegistry::builder()
            .register(
                tool("get_weather", city_schema()),
                CountingHandler {
                    calls: Arc::clone(&calls),
                },
            )
            .expect("registration succeeds")
            .build();

        // No arguments at all: schema requires "city", handler must not run
        let params = CallToolParams {
            name: "get_weather".to_string(),
            arguments: None,
        };
        let result = registry.call(params).await;
        assert!(matches!(
            result,
            Err(McpError::InvalidToolArguments { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Wrong type is rejected the same way
        let mut args = HashMap::new();
        args.insert("city".to_string(), json!(17));
        let result = registry.call(CallToolParams::new("get_weather", args)).await;
        assert!(matches!(
            result,
            Err(McpError::InvalidToolArguments { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Valid arguments reach the handler
        let mut args = HashMap::new();
        args.insert("city".to_string(), json!("Paris"));
        let result = registry
            .call(CallToolParams::new("get_weather", args))
            .await
            .expect("call succeeds");
        assert_eq!(result.is_error, Some(false));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_failure_becomes_error_result() {
        let registry = ToolRegistry::builder()
            .register(tool("flaky", open_schema()), FailingHandler)
            .expect("registration succeeds")
            .build();

        let params = CallToolParams {
            name: "flaky".to_string(),
            arguments: None,
        };
        let result = registry.call(params).await.expect("failure stays in-band");

        assert_eq!(result.is_error, Some(true));
        match &result.content[0] {
            ToolContent::Text { text } => {
                assert!(text.contains("flaky"));
                assert!(text.contains("upstream exploded"));
            }
            other => panic!("Expected text content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_results_padded_with_placeholder() {
        let registry = ToolRegistry::builder()
            .register(tool("silent", open_schema()), EmptyHandler)
            .expect("registration succeeds")
            .build();

        let params = CallToolParams {
            name: "silent".to_string(),
            arguments: None,
        };
        let result = registry.call(params).await.expect("call succeeds");

        assert_eq!(result.content.len(), 1);
        assert!(matches!(result.content[0], ToolContent::Text { .. }));
    }

    #[test]
    fn tools_listed_in_registration_order() {
        let registry = ToolRegistry::builder()
            .register(tool("zeta", open_schema()), EmptyHandler)
            .expect("registration succeeds")
            .register(tool("alpha", open_schema()), EmptyHandler)
            .expect("registration succeeds")
            .register(tool("mid", open_schema()), EmptyHandler)
            .expect("registration succeeds")
            .build();

        let names: Vec<String> = registry
            .list_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("alpha"));
        assert!(!registry.contains("omega"));

        // Listing is idempotent: same names, same order, every time
        let second: Vec<String> = registry
            .list_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, second);
    }
}
