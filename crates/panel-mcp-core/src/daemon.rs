//! Daemon (remote node) projections

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Daemon entry as reported by the panel
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDaemon {
    uuid: String,
    ip: String,
    port: Value,
    remarks: String,
    available: bool,
}

/// Daemon projection returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSummary {
    pub id: String,
    pub ip: String,
    pub port: Value,
    pub remarks: String,
    pub available: bool,
}

impl DaemonSummary {
    /// Project the `data` array of the daemon list endpoint
    pub fn list_from_upstream(data: Value) -> Result<Vec<Self>> {
        let raw: Vec<RawDaemon> = serde_json::from_value(data)?;
        Ok(raw.into_iter().map(Self::from).collect())
    }
}

impl From<RawDaemon> for DaemonSummary {
    fn from(raw: RawDaemon) -> Self {
        Self {
            id: raw.uuid,
            ip: raw.ip,
            port: raw.port,
            remarks: raw.remarks,
            available: raw.available,
        }
    }
}
