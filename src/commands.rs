use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{Config, get_config_dir};
use crate::mcp::McpServer;
use crate::mcp::tools::{GetForecastHandler, GetWeatherHandler, builtin_registry};
use crate::weather::WeatherClient;

/// Load the configuration from the default config directory
fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    Config::load(config_dir).context("Failed to load configuration")
}

/// List the tools this server exposes, with their parameters
#[inline]
pub fn show_tools() -> Result<()> {
    let tools = [
        GetWeatherHandler::tool_definition(),
        GetForecastHandler::tool_definition(),
    ];

    println!("Available MCP Tools ({} total):", tools.len());
    println!();

    for tool in &tools {
        println!("🔧 {}", tool.name);
        if let Some(description) = &tool.description {
            println!("   {}", description);
        }

        let required: Vec<&str> = tool
            .input_schema
            .get("required")
            .and_then(|v| v.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default();

        if let Some(properties) = tool
            .input_schema
            .get("properties")
            .and_then(|v| v.as_object())
        {
            println!("   Parameters:");
            for (name, prop) in properties {
                let param_type = prop.get("type").and_then(|v| v.as_str()).unwrap_or("any");
                let marker = if required.contains(&name.as_str()) {
                    " (required)"
                } else {
                    ""
                };
                match prop.get("description").and_then(|v| v.as_str()) {
                    Some(hint) => println!("   • {} [{}]{}: {}", name, param_type, marker, hint),
                    None => println!("   • {} [{}]{}", name, param_type, marker),
                }
            }
        }

        println!();
    }

    println!("Use 'toolkit-mcp serve' to expose these tools to an MCP client.");

    Ok(())
}

/// Show configuration and weather service connectivity
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config().unwrap_or_default();

    println!("📊 Toolkit-MCP Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("⚙️  Configuration:");
    match get_config_dir() {
        Ok(dir) => println!("   📁 Config Directory: {}", dir.display()),
        Err(e) => println!("   ❌ Config Directory: Unavailable - {}", e),
    }
    println!("   🌍 Units: {}", config.weather.units);
    println!("   ⏱️  Request Timeout: {}s", config.weather.timeout_seconds);
    println!("   🔁 Retry Attempts: {}", config.weather.retry_attempts);
    println!();

    println!("🌦️  Weather Service:");
    match WeatherClient::new(&config) {
        Ok(client) => {
            println!("   🔗 Geocoding API: {}", config.weather.geocoding_url);
            println!("   🔗 Forecast API: {}", config.weather.forecast_url);

            // The client is blocking, keep the probe off the async workers
            let probe = client.clone();
            match tokio::task::spawn_blocking(move || probe.health_check()).await? {
                Ok(()) => println!("   ✅ Open-Meteo: Reachable"),
                Err(e) => println!("   ⚠️  Open-Meteo: Unreachable - {}", e),
            }
        }
        Err(e) => {
            println!("   ❌ Client: Failed to initialize - {}", e);
        }
    }
    println!();

    println!("🔧 Registered Tools:");
    for tool in [
        GetWeatherHandler::tool_definition(),
        GetForecastHandler::tool_definition(),
    ] {
        println!("   • {}", tool.name);
    }
    println!();

    println!("💡 Next Steps:");
    println!("   • Use 'toolkit-mcp serve' to start the MCP server for AI assistants");
    println!("   • Use 'toolkit-mcp tools' to see tool parameters");
    println!("   • Use 'toolkit-mcp config' to update connection settings");

    Ok(())
}

/// Start the MCP server on stdio transport
///
/// Stdout carries protocol frames once the server starts, so all human
/// facing output here goes to stderr.
#[inline]
pub async fn serve_mcp() -> Result<()> {
    info!("Starting MCP server with stdio transport");

    let config = load_config()?;

    let client = Arc::new(WeatherClient::new(&config).context("Failed to create weather client")?);

    // Verify Open-Meteo connectivity before starting. An unreachable
    // service is a warning, not a startup failure: the server can still
    // answer tools/list, and the network may come back.
    let probe = Arc::clone(&client);
    match tokio::task::spawn_blocking(move || probe.health_check()).await? {
        Ok(()) => {
            info!(
                "✅ Open-Meteo reachable at {} and {}",
                config.weather.geocoding_url, config.weather.forecast_url
            );
        }
        Err(e) => {
            warn!("⚠️  Open-Meteo is unreachable: {}", e);
            eprintln!("Warning: weather service is unreachable. Tool calls may fail.");
            eprintln!("Use 'toolkit-mcp config' to update connection settings.");
        }
    }

    let registry =
        builtin_registry(Arc::clone(&client)).context("Failed to register weather tools")?;

    let server = Arc::new(
        McpServer::new(
            "toolkit-mcp".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            registry,
        )
        .context("Failed to create MCP server")?,
    );

    let tool_names: Vec<String> = server
        .registry()
        .list_tools()
        .into_iter()
        .map(|tool| tool.name)
        .collect();

    eprintln!(
        "✅ MCP server initialized with tools: {}",
        tool_names.join(", ")
    );
    eprintln!("🌐 Starting MCP server on stdio transport...");
    eprintln!();
    eprintln!("Note: This server uses stdio transport. Connect via MCP client.");
    eprintln!("Press Ctrl+C to stop the server");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            match result {
                Ok(()) => {
                    info!("MCP server stopped normally");
                }
                Err(e) => {
                    error!("MCP server error: {}", e);
                    return Err(e);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("📴 Received interrupt signal, shutting down...");
        }
    }

    eprintln!("✅ Shutdown complete");

    Ok(())
}
