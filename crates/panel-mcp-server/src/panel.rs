//! Upstream panel trait

use async_trait::async_trait;
use panel_mcp_core::{
    FileQuery, InstanceAction, InstanceQuery, InstanceRef, Result, UpstreamResponse, UserQuery,
};

/// Trait for reaching the remote management panel
///
/// Each method issues exactly one request and returns the raw status and
/// body. Transport failures propagate unchanged; status checking and
/// reshaping belong to the tool and resource handlers.
#[async_trait]
pub trait PanelApi: Send + Sync + 'static {
    /// List remote daemons
    async fn list_daemons(&self) -> Result<UpstreamResponse>;

    /// List instances hosted by a daemon
    async fn list_instances(&self, query: &InstanceQuery) -> Result<UpstreamResponse>;

    /// Fetch one instance
    async fn instance_detail(&self, target: &InstanceRef) -> Result<UpstreamResponse>;

    /// Start, stop, restart or force-kill an instance
    async fn instance_action(
        &self,
        target: &InstanceRef,
        action: InstanceAction,
    ) -> Result<UpstreamResponse>;

    /// Send a raw console command to an instance
    async fn send_command(&self, target: &InstanceRef, command: &str) -> Result<UpstreamResponse>;

    /// List a directory inside an instance
    async fn list_files(&self, target: &InstanceRef, query: &FileQuery)
    -> Result<UpstreamResponse>;

    /// Read a file inside an instance
    async fn read_file(&self, target: &InstanceRef, path: &str) -> Result<UpstreamResponse>;

    /// Overwrite a file inside an instance
    async fn write_file(
        &self,
        target: &InstanceRef,
        path: &str,
        content: &str,
    ) -> Result<UpstreamResponse>;

    /// Search panel users
    async fn list_users(&self, query: &UserQuery) -> Result<UpstreamResponse>;

    /// Panel-wide overview
    async fn overview(&self) -> Result<UpstreamResponse>;
}
