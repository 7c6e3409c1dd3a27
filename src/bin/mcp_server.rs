//! MCP Server Binary
//!
//! Runs the note tools as an MCP server over stdio for agent integration.
//!
//! # Usage
//!
//! ```bash
//! # Run directly
//! SLITE_API_KEY=... ./mcp_server
//!
//! # With a config file and debug logging
//! RUST_LOG=debug ./mcp_server --config config.yaml
//! ```
//!
//! # MCP client settings
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "notes": {
//!       "command": "/path/to/mcp_server",
//!       "env": {
//!         "SLITE_API_KEY": "your-key",
//!         "NOTES_REGISTRY_PATH": "/path/to/slite_registry.json"
//!       }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use clap::Parser;
use notes_orchestrator::mcp::McpServer;
use notes_orchestrator::{logging, AppState, Config};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// MCP Server for Slite notes
#[derive(Parser, Debug)]
#[command(name = "mcp_server")]
#[command(about = "MCP server exposing Slite note and folder tools")]
#[command(version)]
struct Args {
    /// YAML config file (defaults to ./config.yaml when present)
    #[arg(short, long, env = "NOTES_CONFIG")]
    config: Option<PathBuf>,

    /// Slite API base URL (overrides config.yaml)
    #[arg(long, env = "SLITE_BASE_URL")]
    base_url: Option<String>,

    /// Registry file (overrides config.yaml)
    #[arg(long, env = "NOTES_REGISTRY_PATH")]
    registry: Option<PathBuf>,

    /// Cache file (overrides config.yaml)
    #[arg(long, env = "NOTES_CACHE_PATH")]
    cache: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = Config::from_yaml_and_env(args.config.as_deref())?;
    if let Some(url) = args.base_url {
        config.slite_base_url = url;
    }
    if let Some(path) = args.registry {
        config.registry_path = path;
    }
    if let Some(path) = args.cache {
        config.cache_path = path;
    }

    // Logs to stderr to keep stdout clean for MCP
    logging::init(&config.logging)?;

    info!("Starting MCP server for notes-orchestrator");
    info!("Slite: {}", config.slite_base_url);
    info!("Registry: {}", config.registry_path.display());

    let state = match AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create app state: {:#}", e);
            return Err(e);
        }
    };

    // Audit trail of confirmed mutations
    let mut events = state.events.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    entity_type = ?event.entity_type,
                    action = ?event.action,
                    entity_id = %event.entity_id,
                    parent_id = ?event.parent_id,
                    "Change applied"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut server = McpServer::new(state.manager.clone());

    if let Err(e) = server.run().await {
        error!("MCP server error: {}", e);
        return Err(e);
    }

    Ok(())
}
