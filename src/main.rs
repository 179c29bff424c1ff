//! Zep Memory - MCP server and plugin tool runner
//!
//! Serves the conversation memory tools over stdio (default) or SSE, or drives
//! the plugin tools once from the command line.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zep_memory::{
    config::{ConfigOverrides, ServerConfig, Transport},
    mcp,
    plugin::{Credentials, ToolParameters, ZepConnector},
    McpServer, ZepClient, ZepMemoryProvider,
};

#[derive(Parser)]
#[command(name = "zep-memory")]
#[command(about = "Zep conversational memory as MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Transport type (stdio or sse)
    #[arg(long, value_parser = parse_transport)]
    transport: Option<Transport>,

    /// Port to listen on, SSE only
    #[arg(long)]
    port: Option<u16>,

    /// Zep API key (or ZEP_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Zep API root
    #[arg(long)]
    base_url: Option<String>,

    /// TOML configuration file
    #[arg(long, env = "ZEP_CONFIG")]
    config: Option<PathBuf>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Plugin tool operations
    Plugin {
        #[command(subcommand)]
        action: PluginAction,
    },
}

#[derive(Subcommand)]
enum PluginAction {
    /// Check that the configured API key is accepted
    Validate,

    /// Invoke a plugin tool once and print its messages
    Invoke {
        /// Tool name (add-memory, get-memory)
        tool: String,

        /// Tool parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

fn parse_transport(value: &str) -> Result<Transport, String> {
    value.parse().map_err(|e: zep_memory::MemoryError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "zep_memory={},tower_http=warn",
            cli.log_level.to_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries the stdio transport
        .init();

    debug!("zep-memory v{} starting...", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides {
        transport: cli.transport,
        port: cli.port,
        api_key: cli.api_key,
        base_url: cli.base_url,
    };
    let config = ServerConfig::load(cli.config.as_deref(), &overrides)?;

    match cli.command {
        None => serve(config).await,
        Some(Commands::Plugin { action }) => run_plugin(config, action).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let client = ZepClient::new(config.client_config()?)?;
    let server = Arc::new(McpServer::with_backend(
        Arc::new(client),
        config.session_key(),
    ));

    let session = server.session();
    info!(
        "Serving session {} for user {} over {}",
        session.session_id, session.user_id, config.transport
    );

    match config.transport {
        Transport::Stdio => mcp::run_stdio(server).await?,
        Transport::Sse => mcp::serve_sse(server, config.port).await?,
    }
    Ok(())
}

async fn run_plugin(config: ServerConfig, action: PluginAction) -> anyhow::Result<()> {
    let provider = ZepMemoryProvider::new(Arc::new(ZepConnector {
        base_url: config.base_url.clone(),
        timeout: Duration::from_secs(config.timeout_secs),
    }));

    let mut credentials = Credentials::new();
    if let Some(key) = &config.api_key {
        credentials.insert("api_key".to_string(), key.clone());
    }

    match action {
        PluginAction::Validate => {
            provider.validate_credentials(&credentials).await?;
            println!("Credentials are valid");
        }
        PluginAction::Invoke { tool, params } => {
            let params: ToolParameters = serde_json::from_str(&params)
                .context("--params must be a JSON object")?;
            for message in provider.invoke(&tool, &credentials, &params).await? {
                println!("{}", message.as_text());
            }
        }
    }
    Ok(())
}
