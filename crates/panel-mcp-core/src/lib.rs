//! # panel-mcp-core
//!
//! Core types for the panel MCP adapter.
//!
//! This crate provides the foundational types shared by the server and the
//! upstream client:
//! - Error type and JSON-RPC error codes
//! - The raw upstream response and its `{status, data}` envelope
//! - Typed projections of daemon, instance, file, user and overview payloads

pub mod daemon;
pub mod error;
pub mod file;
pub mod instance;
pub mod overview;
pub mod upstream;
pub mod user;

pub use daemon::DaemonSummary;
pub use error::{PanelError, Result, error_codes};
pub use file::{FileContent, FileEntry, FileKind, FileListing, FileQuery};
pub use instance::{
    InstanceAction, InstanceDetail, InstanceListing, InstanceQuery, InstanceRef, InstanceStatus,
    InstanceSummary,
};
pub use overview::Overview;
pub use upstream::UpstreamResponse;
pub use user::{UserListing, UserQuery, UserSummary};
