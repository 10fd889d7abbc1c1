//! Error types for the panel adapter

use thiserror::Error;

/// Result type for panel adapter operations
pub type Result<T> = std::result::Result<T, PanelError>;

/// Panel adapter error types
#[derive(Debug, Error)]
pub enum PanelError {
    /// Upstream request could not be sent or its body could not be read
    #[error("Upstream request failed: {0}")]
    Http(String),

    /// Upstream answered with a non-success status
    #[error("Panel returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Tool or resource arguments failed validation
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// No tool registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// No resource matches this URI
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Inbound transport I/O failure
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Startup configuration is unusable
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PanelError {
    /// JSON-RPC error code used when this error surfaces as a protocol error
    pub fn rpc_code(&self) -> i32 {
        match self {
            PanelError::InvalidParams(_)
            | PanelError::UnknownTool(_)
            | PanelError::ResourceNotFound(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::SerializationError(err.to_string())
    }
}

/// JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Transport-level rejection (missing or unknown session)
    pub const BAD_REQUEST: i32 = -32000;
}
