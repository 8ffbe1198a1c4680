use clap::{Parser, Subcommand};
use toolkit_mcp::Result;
use toolkit_mcp::commands::{serve_mcp, show_status, show_tools};
use toolkit_mcp::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "toolkit-mcp")]
#[command(about = "A weather lookup MCP server backed by Open-Meteo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure weather service connection and settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// List the tools this server exposes
    Tools,
    /// Start MCP server on stdio
    Serve,
    /// Show configuration and connectivity status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout belongs to the stdio transport, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Tools => {
            show_tools()?;
        }
        Commands::Serve => {
            serve_mcp().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
