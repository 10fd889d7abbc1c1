//! Panel MCP Server
//!
//! Exposes a game-server management panel to MCP clients:
//! - Streamable HTTP on HOST:PORT (default), one session per client
//! - stdio when MCP_TRANSPORT=stdio

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use panel_client::PanelClient;
use panel_mcp_server::PanelMcpServer;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Transport};

const DEFAULT_FILTER: &str = "panel_mcp_server=info,panel_mcp_cli=info,panel_client=info";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = match Cli::parse().into_settings() {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    info!(panel_url = %settings.panel.base_url, "Panel MCP server starting");

    let client = PanelClient::new(settings.panel);
    let server = PanelMcpServer::new(Arc::new(client));

    match settings.transport {
        Transport::Stdio => server.run_stdio().await?,
        Transport::Http => {
            let addr = tokio::net::lookup_host((settings.host.as_str(), settings.port))
                .await
                .with_context(|| format!("Failed to resolve {}:{}", settings.host, settings.port))?
                .next()
                .with_context(|| format!("No address for {}", settings.host))?;

            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown signal received");
                    signal.cancel();
                }
            });

            server.serve_http(addr, settings.http, shutdown).await?;
        }
    }

    Ok(())
}
