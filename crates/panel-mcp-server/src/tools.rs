//! MCP tool handlers for the panel

use panel_mcp_core::{
    DaemonSummary, FileContent, FileListing, FileQuery, InstanceAction, InstanceDetail,
    InstanceListing, InstanceQuery, InstanceRef, Overview, PanelError, Result, UserListing,
    UserQuery,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::mcp::CallToolResult;
use crate::panel::PanelApi;

/// Tool definition for MCP tools/list
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Object schema over the instance address plus extra properties
fn instance_schema(extra: Value, extra_required: &[&str]) -> Value {
    let mut properties = serde_json::json!({
        "daemonId": {
            "type": "string",
            "description": "ID of the daemon hosting the instance (see get-daemons)"
        },
        "instanceId": {
            "type": "string",
            "description": "ID of the instance (see get-instances)"
        }
    });
    if let (Some(props), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        props.extend(extra);
    }
    let mut required = vec!["daemonId", "instanceId"];
    required.extend_from_slice(extra_required);

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn lifecycle_tool(name: &str, description: &str) -> ToolDef {
    ToolDef {
        name: name.into(),
        description: description.into(),
        input_schema: instance_schema(serde_json::json!({}), &[]),
    }
}

/// Get list of available tools
pub fn list_tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "get-daemons".into(),
            description: "List the remote daemons (nodes) connected to the panel.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDef {
            name: "get-instances".into(),
            description: "List the server instances hosted by a daemon, with their run status."
                .into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "daemonId": {
                        "type": "string",
                        "description": "ID of the daemon (see get-daemons)"
                    }
                },
                "required": ["daemonId"]
            }),
        },
        ToolDef {
            name: "get-instance-detail".into(),
            description: "Get configuration, process usage and player counts of one instance."
                .into(),
            input_schema: instance_schema(serde_json::json!({}), &[]),
        },
        ToolDef {
            name: "get-files".into(),
            description: "List files in an instance directory. Omit path for the instance root."
                .into(),
            input_schema: instance_schema(
                serde_json::json!({
                    "path": {
                        "type": "string",
                        "description": "Directory relative to the instance root, e.g. \"/plugins\""
                    }
                }),
                &[],
            ),
        },
        ToolDef {
            name: "get-file-content".into(),
            description: "Read a text file from an instance.".into(),
            input_schema: instance_schema(
                serde_json::json!({
                    "filePath": {
                        "type": "string",
                        "description": "File path relative to the instance root, e.g. \"/server.properties\""
                    }
                }),
                &["filePath"],
            ),
        },
        ToolDef {
            name: "get-overview".into(),
            description: "Get the panel overview: version, daemon availability, host system and login records.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        },
        lifecycle_tool("start-instance", "Start a stopped instance."),
        lifecycle_tool("stop-instance", "Gracefully stop a running instance."),
        lifecycle_tool("restart-instance", "Restart an instance."),
        lifecycle_tool(
            "kill-instance",
            "Force-kill an instance process. Unsaved game state may be lost.",
        ),
        ToolDef {
            name: "send-command".into(),
            description: "Send a console command to a running instance.".into(),
            input_schema: instance_schema(
                serde_json::json!({
                    "command": {
                        "type": "string",
                        "description": "Console command, e.g. \"say hello\""
                    }
                }),
                &["command"],
            ),
        },
        ToolDef {
            name: "update-file".into(),
            description: "Overwrite a text file in an instance with new content.".into(),
            input_schema: instance_schema(
                serde_json::json!({
                    "filePath": {
                        "type": "string",
                        "description": "File path relative to the instance root"
                    },
                    "content": {
                        "type": "string",
                        "description": "New file content"
                    }
                }),
                &["filePath", "content"],
            ),
        },
        ToolDef {
            name: "get-users".into(),
            description: "Search panel user accounts.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "userName": {
                        "type": "string",
                        "description": "Filter by user name (substring)"
                    },
                    "page": {
                        "type": "integer",
                        "description": "Page number, starting at 1",
                        "default": 1
                    },
                    "pageSize": {
                        "type": "integer",
                        "description": "Users per page",
                        "default": 20
                    }
                }
            }),
        },
    ]
}

/// Parameters for get-instances
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonParams {
    pub daemon_id: String,
}

/// Parameters for tools addressing one instance
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceParams {
    pub daemon_id: String,
    pub instance_id: String,
}

impl InstanceParams {
    fn target(&self) -> InstanceRef {
        InstanceRef::new(self.daemon_id.clone(), self.instance_id.clone())
    }
}

/// Parameters for get-files
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesParams {
    #[serde(flatten)]
    pub instance: InstanceParams,
    #[serde(default)]
    pub path: Option<String>,
}

/// Parameters for get-file-content
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileParams {
    #[serde(flatten)]
    pub instance: InstanceParams,
    pub file_path: String,
}

/// Parameters for send-command
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandParams {
    #[serde(flatten)]
    pub instance: InstanceParams,
    pub command: String,
}

/// Parameters for update-file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileParams {
    #[serde(flatten)]
    pub instance: InstanceParams,
    pub file_path: String,
    pub content: String,
}

/// Parameters for get-users
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersParams {
    pub user_name: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Decode tool arguments; absent arguments decode as an empty object
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| PanelError::InvalidParams(e.to_string()))
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Handle a tools/call request
///
/// Argument validation failures and unknown tools are returned as `Err` so
/// the caller can answer with a protocol error; upstream failures are folded
/// into an error-marked result.
pub async fn handle_tool_call(
    name: &str,
    arguments: Value,
    panel: &dyn PanelApi,
) -> Result<CallToolResult> {
    debug!(tool = name, "Calling tool");

    let outcome = match name {
        "get-daemons" => get_daemons(panel).await,
        "get-instances" => get_instances(panel, parse_args(arguments)?).await,
        "get-instance-detail" => get_instance_detail(panel, parse_args(arguments)?).await,
        "get-files" => get_files(panel, parse_args(arguments)?).await,
        "get-file-content" => get_file_content(panel, parse_args(arguments)?).await,
        "get-overview" => get_overview(panel).await,
        "start-instance" => {
            lifecycle(panel, parse_args(arguments)?, InstanceAction::Start).await
        }
        "stop-instance" => lifecycle(panel, parse_args(arguments)?, InstanceAction::Stop).await,
        "restart-instance" => {
            lifecycle(panel, parse_args(arguments)?, InstanceAction::Restart).await
        }
        "kill-instance" => lifecycle(panel, parse_args(arguments)?, InstanceAction::Kill).await,
        "send-command" => send_command(panel, parse_args(arguments)?).await,
        "update-file" => update_file(panel, parse_args(arguments)?).await,
        "get-users" => get_users(panel, parse_args(arguments)?).await,
        _ => return Err(PanelError::UnknownTool(name.to_string())),
    };

    Ok(match outcome {
        Ok(text) => CallToolResult::text(text),
        Err(e) => {
            warn!(tool = name, error = %e, "Tool call failed");
            CallToolResult::error(format!("Error: {}", e))
        }
    })
}

async fn get_daemons(panel: &dyn PanelApi) -> Result<String> {
    let data = panel.list_daemons().await?.into_data()?;
    pretty(&DaemonSummary::list_from_upstream(data)?)
}

async fn get_instances(panel: &dyn PanelApi, p: DaemonParams) -> Result<String> {
    let query = InstanceQuery::for_daemon(p.daemon_id.clone());
    let data = panel.list_instances(&query).await?.into_data()?;
    pretty(&InstanceListing::from_upstream(p.daemon_id, data)?)
}

async fn get_instance_detail(panel: &dyn PanelApi, p: InstanceParams) -> Result<String> {
    let data = panel.instance_detail(&p.target()).await?.into_data()?;
    pretty(&InstanceDetail::from_upstream(data)?)
}

async fn get_files(panel: &dyn PanelApi, p: FilesParams) -> Result<String> {
    let query = FileQuery::new(p.path.unwrap_or_default());
    let data = panel
        .list_files(&p.instance.target(), &query)
        .await?
        .into_data()?;
    pretty(&FileListing::from_upstream(query.target, data)?)
}

async fn get_file_content(panel: &dyn PanelApi, p: FileParams) -> Result<String> {
    let data = panel
        .read_file(&p.instance.target(), &p.file_path)
        .await?
        .into_data()?;
    pretty(&FileContent::from_upstream(p.file_path, data))
}

async fn get_overview(panel: &dyn PanelApi) -> Result<String> {
    let data = panel.overview().await?.into_data()?;
    pretty(&Overview::from_upstream(data)?)
}

async fn lifecycle(
    panel: &dyn PanelApi,
    p: InstanceParams,
    action: InstanceAction,
) -> Result<String> {
    panel
        .instance_action(&p.target(), action)
        .await?
        .into_data()?;
    Ok(format!(
        "Successfully {} instance `{}`",
        action.past_tense(),
        p.instance_id
    ))
}

async fn send_command(panel: &dyn PanelApi, p: CommandParams) -> Result<String> {
    panel
        .send_command(&p.instance.target(), &p.command)
        .await?
        .into_data()?;
    Ok(format!(
        "Successfully sent command `{}` to instance `{}`",
        p.command, p.instance.instance_id
    ))
}

async fn update_file(panel: &dyn PanelApi, p: UpdateFileParams) -> Result<String> {
    panel
        .write_file(&p.instance.target(), &p.file_path, &p.content)
        .await?
        .into_data()?;
    Ok(format!(
        "Successfully updated file `{}` on instance `{}`",
        p.file_path, p.instance.instance_id
    ))
}

async fn get_users(panel: &dyn PanelApi, p: UsersParams) -> Result<String> {
    let defaults = UserQuery::default();
    let query = UserQuery {
        user_name: p.user_name.unwrap_or_default(),
        page: p.page.unwrap_or(defaults.page),
        page_size: p.page_size.unwrap_or(defaults.page_size),
        role: defaults.role,
    };
    let data = panel.list_users(&query).await?.into_data()?;
    pretty(&UserListing::from_upstream(data)?)
}
