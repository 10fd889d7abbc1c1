//! Command-line and environment configuration

use std::time::Duration;

use clap::{Parser, ValueEnum};
use panel_client::{DEFAULT_BASE_URL, PanelConfig};
use panel_mcp_core::{PanelError, Result};
use panel_mcp_server::HttpConfig;

/// Inbound transport to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Streamable HTTP with session routing
    Http,
    /// Single session over stdin/stdout
    Stdio,
}

/// MCP server for a game-server management panel
#[derive(Parser)]
#[command(name = "panel-mcp-server", version, about)]
pub struct Cli {
    /// Base URL of the panel
    #[arg(long = "panel-url", env = "PANEL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub panel_url: String,

    /// Panel API key
    #[arg(long, env = "PANEL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Interface to listen on
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Transport to serve
    #[arg(long, env = "MCP_TRANSPORT", value_enum, default_value_t = Transport::Http)]
    pub transport: Transport,

    /// Close sessions idle for this many seconds (0 disables)
    #[arg(long = "session-idle-timeout", env = "SESSION_IDLE_TIMEOUT_SECS", default_value_t = 0)]
    pub session_idle_timeout_secs: u64,

    /// Keep-alive interval on notification streams, in seconds
    #[arg(long = "sse-keep-alive", env = "SSE_KEEP_ALIVE_SECS", default_value_t = 15)]
    pub sse_keep_alive_secs: u64,
}

/// Validated startup settings
pub struct Settings {
    pub panel: PanelConfig,
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub http: HttpConfig,
}

impl Cli {
    /// Validate the parsed arguments
    ///
    /// Fails when no usable API key is configured.
    pub fn into_settings(self) -> Result<Settings> {
        let api_key = self.api_key.unwrap_or_default();
        let panel = PanelConfig::new(self.panel_url, api_key);
        panel.validate()?;

        if self.sse_keep_alive_secs == 0 {
            return Err(PanelError::ConfigError(
                "SSE keep-alive interval must be at least 1 second".into(),
            ));
        }

        let http = HttpConfig {
            sse_keep_alive: Duration::from_secs(self.sse_keep_alive_secs),
            session_idle_timeout: (self.session_idle_timeout_secs > 0)
                .then(|| Duration::from_secs(self.session_idle_timeout_secs)),
            ..HttpConfig::default()
        };

        Ok(Settings {
            panel,
            transport: self.transport,
            host: self.host,
            port: self.port,
            http,
        })
    }
}
