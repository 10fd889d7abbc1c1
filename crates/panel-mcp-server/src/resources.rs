//! Read-only MCP resources over the panel

use panel_mcp_core::{
    DaemonSummary, InstanceListing, InstanceQuery, Overview, PanelError, Result, UserListing,
    UserQuery,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::panel::PanelApi;

const SCHEME: &str = "panel://";

/// Resource definition for MCP resources/list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// Resource template definition for MCP resources/templates/list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDef {
    pub uri_template: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// Resources addressable by URI
#[derive(Debug, Clone, PartialEq, Eq)]
enum PanelResource {
    Daemons,
    Overview,
    Users,
    DaemonInstances(String),
}

impl PanelResource {
    fn parse(uri: &str) -> Option<Self> {
        let path = uri.strip_prefix(SCHEME)?;
        match path.split('/').collect::<Vec<_>>().as_slice() {
            ["daemons"] => Some(PanelResource::Daemons),
            ["overview"] => Some(PanelResource::Overview),
            ["users"] => Some(PanelResource::Users),
            ["daemons", daemon_id, "instances"] if !daemon_id.is_empty() => {
                Some(PanelResource::DaemonInstances(daemon_id.to_string()))
            }
            _ => None,
        }
    }
}

fn json_resource(uri: &str, name: &str, description: &str) -> ResourceDef {
    ResourceDef {
        uri: uri.into(),
        name: name.into(),
        description: description.into(),
        mime_type: "application/json".into(),
    }
}

/// Get list of static resources
pub fn list_resources() -> Vec<ResourceDef> {
    vec![
        json_resource(
            "panel://daemons",
            "Daemons",
            "Remote daemons connected to the panel",
        ),
        json_resource(
            "panel://overview",
            "Panel Overview",
            "Panel version, daemon availability and host system status",
        ),
        json_resource("panel://users", "Users", "First page of panel user accounts"),
    ]
}

/// Get list of resource templates
pub fn list_resource_templates() -> Vec<ResourceTemplateDef> {
    vec![ResourceTemplateDef {
        uri_template: "panel://daemons/{daemonId}/instances".into(),
        name: "Daemon Instances".into(),
        description: "Instances hosted by one daemon".into(),
        mime_type: "application/json".into(),
    }]
}

/// Handle a resources/read request
///
/// Returns the `{contents: [...]}` result object.
pub async fn read_resource(uri: &str, panel: &dyn PanelApi) -> Result<Value> {
    let resource =
        PanelResource::parse(uri).ok_or_else(|| PanelError::ResourceNotFound(uri.to_string()))?;

    let content = match resource {
        PanelResource::Daemons => {
            let data = panel.list_daemons().await?.into_data()?;
            serde_json::to_value(DaemonSummary::list_from_upstream(data)?)?
        }
        PanelResource::Overview => {
            let data = panel.overview().await?.into_data()?;
            serde_json::to_value(Overview::from_upstream(data)?)?
        }
        PanelResource::Users => {
            let data = panel.list_users(&UserQuery::default()).await?.into_data()?;
            serde_json::to_value(UserListing::from_upstream(data)?)?
        }
        PanelResource::DaemonInstances(daemon_id) => {
            let query = InstanceQuery::for_daemon(daemon_id.clone());
            let data = panel.list_instances(&query).await?.into_data()?;
            serde_json::to_value(InstanceListing::from_upstream(daemon_id, data)?)?
        }
    };

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "application/json",
            "text": serde_json::to_string_pretty(&content)?
        }]
    }))
}
