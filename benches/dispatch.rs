use criterion::{Criterion, criterion_group, criterion_main};
use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use toolkit_mcp::mcp::validation::ToolInputSchema;
use toolkit_mcp::mcp::{CallToolParams, CallToolResult, Tool, ToolHandler, ToolRegistry};

struct EchoHandler;

#[async_trait]
impl ToolHandler for EchoHandler {
    async fn handle(&self, params: CallToolParams) -> anyhow::Result<CallToolResult> {
        let city = params
            .arguments
            .as_ref()
            .and_then(|args| args.get("city"))
            .and_then(|v| v.as_str())
            .unwrap_or("nowhere");
        Ok(CallToolResult::text(format!("echo: {}", city)))
    }
}

fn echo_tool() -> Tool {
    Tool {
        name: "echo".to_string(),
        description: Some("Echo the city argument".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "minLength": 1}
            },
            "required": ["city"],
            "additionalProperties": false
        }),
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("can create runtime");

    let registry = Arc::new(
        ToolRegistry::builder()
            .register(echo_tool(), EchoHandler)
            .expect("can register tool")
            .build(),
    );

    let mut arguments = HashMap::new();
    arguments.insert("city".to_string(), json!("Berlin"));

    c.bench_function("tool_dispatch", |b| {
        b.iter(|| {
            let params = CallToolParams {
                name: "echo".to_string(),
                arguments: Some(arguments.clone()),
            };
            rt.block_on(registry.call(black_box(params)))
        })
    });

    let schema =
        ToolInputSchema::compile("echo", &echo_tool().input_schema).expect("can compile schema");
    let instance = json!({"city": "Berlin"});

    c.bench_function("argument_validation", |b| {
        b.iter(|| schema.validate(black_box(&instance)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
