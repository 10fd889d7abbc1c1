//! Connection settings for the panel

use panel_mcp_core::{PanelError, Result};

/// Panel address used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:23333";

/// Where the panel lives and how to authenticate against it
#[derive(Clone)]
pub struct PanelConfig {
    pub base_url: String,
    pub api_key: String,
}

impl PanelConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Reject settings no request could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(PanelError::ConfigError(
                "panel API key is required (set PANEL_API_KEY)".into(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(PanelError::ConfigError(format!(
                "panel base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
