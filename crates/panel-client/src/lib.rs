//! # panel-client
//!
//! REST client for the game-server management panel.
//!
//! `PanelClient` implements [`panel_mcp_server::PanelApi`]: one HTTP call per
//! operation, authenticated by the `apikey` query parameter.

mod client;
mod config;

pub use client::PanelClient;
pub use config::{DEFAULT_BASE_URL, PanelConfig};
