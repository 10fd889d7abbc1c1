//! Instance addressing, lifecycle actions and projections

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Address of one instance on one daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRef {
    pub daemon_id: String,
    pub instance_id: String,
}

impl InstanceRef {
    pub fn new(daemon_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            daemon_id: daemon_id.into(),
            instance_id: instance_id.into(),
        }
    }
}

/// Lifecycle actions the panel exposes under `/api/protected_instance/*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceAction {
    Start,
    Stop,
    Restart,
    Kill,
}

impl InstanceAction {
    /// Path segment of the panel endpoint
    pub fn endpoint(self) -> &'static str {
        match self {
            InstanceAction::Start => "open",
            InstanceAction::Stop => "stop",
            InstanceAction::Restart => "restart",
            InstanceAction::Kill => "kill",
        }
    }

    /// Verb used in success messages
    pub fn past_tense(self) -> &'static str {
        match self {
            InstanceAction::Start => "started",
            InstanceAction::Stop => "stopped",
            InstanceAction::Restart => "restarted",
            InstanceAction::Kill => "killed",
        }
    }
}

/// Paging and filters for the instance list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceQuery {
    pub daemon_id: String,
    pub page: u32,
    pub page_size: u32,
    pub instance_name: String,
    pub status: String,
}

impl InstanceQuery {
    /// First page of every instance on a daemon
    pub fn for_daemon(daemon_id: impl Into<String>) -> Self {
        Self {
            daemon_id: daemon_id.into(),
            page: 1,
            page_size: 100,
            instance_name: String::new(),
            status: String::new(),
        }
    }
}

/// Instance run state
///
/// The panel reports state as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Busy,
    Stopped,
    Stopping,
    Starting,
    Running,
    Unknown,
}

impl InstanceStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => InstanceStatus::Busy,
            0 => InstanceStatus::Stopped,
            1 => InstanceStatus::Stopping,
            2 => InstanceStatus::Starting,
            3 => InstanceStatus::Running,
            _ => InstanceStatus::Unknown,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInstance {
    instance_uuid: String,
    started: Value,
    status: Option<i64>,
    config: RawInstanceConfig,
    info: RawInstanceInfo,
    process_info: RawProcessInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInstanceConfig {
    nickname: String,
    #[serde(rename = "type")]
    kind: String,
    start_command: String,
    cwd: String,
    create_datetime: Value,
    last_datetime: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInstanceInfo {
    current_players: Value,
    max_players: Value,
    version: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProcessInfo {
    cpu: Value,
    memory: Value,
}

/// Instance list payload: paged object, or a bare array on older panels
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInstancePage {
    Paged {
        #[serde(default)]
        page: u32,
        #[serde(default, rename = "maxPage")]
        max_page: u32,
        #[serde(default)]
        data: Vec<RawInstance>,
    },
    Flat(Vec<RawInstance>),
}

/// Compact instance projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    pub id: String,
    pub name: String,
    pub status: InstanceStatus,
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of times the instance has been started
    pub started: Value,
}

impl From<&RawInstance> for InstanceSummary {
    fn from(raw: &RawInstance) -> Self {
        Self {
            id: raw.instance_uuid.clone(),
            name: raw.config.nickname.clone(),
            status: raw
                .status
                .map_or(InstanceStatus::Unknown, InstanceStatus::from_code),
            kind: raw.config.kind.clone(),
            started: raw.started.clone(),
        }
    }
}

/// Instances of one daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceListing {
    pub daemon_id: String,
    pub total: usize,
    pub page: u32,
    pub max_page: u32,
    pub instances: Vec<InstanceSummary>,
}

impl InstanceListing {
    pub fn from_upstream(daemon_id: impl Into<String>, data: Value) -> Result<Self> {
        let (page, max_page, raw) = match serde_json::from_value(data)? {
            RawInstancePage::Paged {
                page,
                max_page,
                data,
            } => (page, max_page, data),
            RawInstancePage::Flat(data) => (1, 1, data),
        };
        let instances: Vec<InstanceSummary> = raw.iter().map(InstanceSummary::from).collect();

        Ok(Self {
            daemon_id: daemon_id.into(),
            total: instances.len(),
            page,
            max_page,
            instances,
        })
    }
}

/// Process resource usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessUsage {
    pub cpu: Value,
    pub memory: Value,
}

/// Player counts reported by the game query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Players {
    pub current: Value,
    pub max: Value,
}

/// Detailed instance projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDetail {
    #[serde(flatten)]
    pub summary: InstanceSummary,
    pub start_command: String,
    pub cwd: String,
    pub created_at: Value,
    pub last_started_at: Value,
    pub process_info: ProcessUsage,
    pub players: Players,
    pub version: String,
}

impl InstanceDetail {
    pub fn from_upstream(data: Value) -> Result<Self> {
        let raw: RawInstance = serde_json::from_value(data)?;
        Ok(Self {
            summary: InstanceSummary::from(&raw),
            start_command: raw.config.start_command,
            cwd: raw.config.cwd,
            created_at: raw.config.create_datetime,
            last_started_at: raw.config.last_datetime,
            process_info: ProcessUsage {
                cpu: raw.process_info.cpu,
                memory: raw.process_info.memory,
            },
            players: Players {
                current: raw.info.current_players,
                max: raw.info.max_players,
            },
            version: raw.info.version,
        })
    }
}
