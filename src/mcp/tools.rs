//! MCP Tools Implementation
//!
//! This module provides the concrete weather tools exposed over MCP, along
//! with assembly of the built-in tool registry.

use crate::mcp::errors::McpResult;
use crate::mcp::protocol::*;
use crate::mcp::registry::{ToolHandler, ToolRegistry};
use crate::weather::WeatherClient;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

const DEFAULT_FORECAST_DAYS: i64 = 3;
const MAX_FORECAST_DAYS: i64 = 7;

/// Current weather lookup tool handler
pub struct GetWeatherHandler {
    client: Arc<WeatherClient>,
}

/// Multi-day forecast tool handler
pub struct GetForecastHandler {
    client: Arc<WeatherClient>,
}

impl GetWeatherHandler {
    /// Create a new weather lookup handler
    #[inline]
    pub fn new(client: Arc<WeatherClient>) -> Self {
        Self { client }
    }

    /// Create the get_weather tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "get_weather".to_string(),
            description: Some("Get current weather conditions for a city".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name, e.g. 'Paris'",
                        "minLength": 1
                    }
                },
                "required": ["city"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for GetWeatherHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let city = args
            .get("city")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing required parameter: city"))?
            .to_string();

        debug!("Tool get_weather invoked for '{}'", city);

        // The HTTP client is blocking, so keep it off the async workers
        let client = Arc::clone(&self.client);
        let lookup = tokio::task::spawn_blocking(move || client.current_weather(&city)).await?;

        match lookup {
            Ok(conditions) => Ok(CallToolResult {
                content: vec![ToolContent::Text {
                    text: serde_json::to_string_pretty(&conditions)?,
                }],
                is_error: Some(false),
            }),
            Err(e) => {
                error!("Weather lookup failed: {:#}", e);
                Ok(CallToolResult {
                    content: vec![ToolContent::Text {
                        text: format!("Weather lookup failed: {:#}", e),
                    }],
                    is_error: Some(true),
                })
            }
        }
    }
}

impl GetForecastHandler {
    /// Create a new forecast handler
    #[inline]
    pub fn new(client: Arc<WeatherClient>) -> Self {
        Self { client }
    }

    /// Create the get_forecast tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "get_forecast".to_string(),
            description: Some("Get a multi-day weather forecast for a city".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name, e.g. 'Paris'",
                        "minLength": 1
                    },
                    "days": {
                        "type": "integer",
                        "description": "Number of forecast days (default: 3)",
                        "minimum": 1,
                        "maximum": 7
                    }
                },
                "required": ["city"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for GetForecastHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let city = args
            .get("city")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing required parameter: city"))?
            .to_string();

        let days = args
            .get("days")
            .and_then(|v| v.as_i64())
            .unwrap_or(DEFAULT_FORECAST_DAYS)
            .clamp(1, MAX_FORECAST_DAYS) as u8;

        debug!("Tool get_forecast invoked for '{}' ({} days)", city, days);

        // The HTTP client is blocking, so keep it off the async workers
        let client = Arc::clone(&self.client);
        let lookup = tokio::task::spawn_blocking(move || client.forecast(&city, days)).await?;

        match lookup {
            Ok(forecast) => Ok(CallToolResult {
                content: vec![ToolContent::Text {
                    text: serde_json::to_string_pretty(&forecast)?,
                }],
                is_error: Some(false),
            }),
            Err(e) => {
                error!("Forecast lookup failed: {:#}", e);
                Ok(CallToolResult {
                    content: vec![ToolContent::Text {
                        text: format!("Forecast lookup failed: {:#}", e),
                    }],
                    is_error: Some(true),
                })
            }
        }
    }
}

/// Assemble the built-in tool registry over a shared weather client
#[inline]
pub fn builtin_registry(client: Arc<WeatherClient>) -> McpResult<ToolRegistry> {
    Ok(ToolRegistry::builder()
        .register(
            GetWeatherHandler::tool_definition(),
            GetWeatherHandler::new(Arc::clone(&client)),
        )?
        .register(
            GetForecastHandler::tool_definition(),
            GetForecastHandler::new(client),
        )?
        .build())
}
