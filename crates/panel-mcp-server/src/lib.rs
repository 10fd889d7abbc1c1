//! # panel-mcp-server
//!
//! MCP server exposing a game-server management panel.
//!
//! This crate provides:
//! - `PanelApi` trait for reaching the upstream panel
//! - MCP JSON-RPC protocol handling and method dispatch
//! - Session table and Streamable HTTP session routing
//! - Tool and resource implementations (get-instances, start-instance, etc.)
//! - stdio transport for single-client use

pub mod dispatch;
pub mod mcp;
pub mod panel;
pub mod resources;
pub mod session;
pub mod tools;
pub mod transport;

#[cfg(test)]
mod testing;

pub use dispatch::Dispatcher;
pub use panel::PanelApi;
pub use session::{SessionState, SessionTable, SessionTransport};
pub use transport::{HttpConfig, SESSION_HEADER, SessionRouter};

use std::net::SocketAddr;
use std::sync::Arc;

use panel_mcp_core::{PanelError, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Panel MCP server
pub struct PanelMcpServer {
    dispatcher: Arc<Dispatcher>,
}

impl PanelMcpServer {
    /// Create a new server over the given panel
    pub fn new(panel: Arc<dyn PanelApi>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(panel)),
        }
    }

    /// Run the server on stdio transport
    pub async fn run_stdio(self) -> Result<()> {
        transport::stdio::run(self.dispatcher).await
    }

    /// Session router for the HTTP transport
    pub fn session_router(&self, config: HttpConfig) -> SessionRouter {
        SessionRouter::new(self.dispatcher.clone(), config)
    }

    /// Serve Streamable HTTP on `addr` until `shutdown` fires
    ///
    /// Every live session is closed once the listener stops.
    pub async fn serve_http(
        self,
        addr: SocketAddr,
        config: HttpConfig,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| PanelError::TransportError(format!("Failed to bind {}: {}", addr, e)))?;
        let local = listener
            .local_addr()
            .map_err(|e| PanelError::TransportError(e.to_string()))?;

        let path = config.path.clone();
        let idle_timeout = config.session_idle_timeout;
        let sessions = self.session_router(config);

        let reaper = idle_timeout.map(|idle| sessions.spawn_reaper(idle, shutdown.clone()));

        info!("Panel MCP server listening on http://{}{}", local, path);

        let signal = shutdown.clone();
        let result = axum::serve(listener, sessions.clone().into_router())
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await
            .map_err(|e| PanelError::TransportError(format!("HTTP server error: {}", e)));

        shutdown.cancel();
        if let Some(reaper) = reaper {
            let _ = reaper.await;
        }
        sessions.close_all().await;
        info!("Panel MCP server stopped");

        result
    }
}
