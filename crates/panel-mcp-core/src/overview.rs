//! Panel overview projection

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawOverview {
    version: String,
    specified_daemon_version: String,
    remote_count: RawRemoteCount,
    system: RawSystem,
    record: RawRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRemoteCount {
    total: u64,
    available: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSystem {
    platform: String,
    release: String,
    hostname: String,
    uptime: Value,
    cpu: Value,
    totalmem: Value,
    freemem: Value,
    loadavg: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRecord {
    logined: Value,
    login_failed: Value,
    illegal_access: Value,
    banips: Value,
}

/// Daemon availability counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonCounts {
    pub total: u64,
    pub available: u64,
}

/// Host system snapshot of the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub platform: String,
    pub release: String,
    pub hostname: String,
    pub uptime: Value,
    pub cpu_usage: Value,
    pub total_memory: Value,
    pub free_memory: Value,
    pub load_average: Value,
}

/// Login and access counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
    pub logins: Value,
    pub failed_logins: Value,
    pub illegal_access: Value,
    pub banned_ips: Value,
}

/// Panel overview projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub version: String,
    pub daemon_version: String,
    pub daemons: DaemonCounts,
    pub system: SystemSnapshot,
    pub record: AccessRecord,
}

impl Overview {
    pub fn from_upstream(data: Value) -> Result<Self> {
        let raw: RawOverview = serde_json::from_value(data)?;
        Ok(Self {
            version: raw.version,
            daemon_version: raw.specified_daemon_version,
            daemons: DaemonCounts {
                total: raw.remote_count.total,
                available: raw.remote_count.available,
            },
            system: SystemSnapshot {
                platform: raw.system.platform,
                release: raw.system.release,
                hostname: raw.system.hostname,
                uptime: raw.system.uptime,
                cpu_usage: raw.system.cpu,
                total_memory: raw.system.totalmem,
                free_memory: raw.system.freemem,
                load_average: raw.system.loadavg,
            },
            record: AccessRecord {
                logins: raw.record.logined,
                failed_logins: raw.record.login_failed,
                illegal_access: raw.record.illegal_access,
                banned_ips: raw.record.banips,
            },
        })
    }
}
