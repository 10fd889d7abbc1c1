//! Panel user projections

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Filters and paging for the user search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub user_name: String,
    pub page: u32,
    pub page_size: u32,
    pub role: String,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            page: 1,
            page_size: 20,
            role: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawUser {
    uuid: String,
    user_name: String,
    permission: Value,
    register_time: Value,
    login_time: Value,
    instances: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawUserPage {
    data: Vec<RawUser>,
    total: Option<u64>,
    page: u32,
    max_page: u32,
}

/// User projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub user_name: String,
    pub permission: Value,
    pub registered_at: Value,
    pub last_login_at: Value,
    pub instance_count: usize,
}

/// One page of users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    pub total: u64,
    pub page: u32,
    pub max_page: u32,
    pub users: Vec<UserSummary>,
}

impl UserListing {
    pub fn from_upstream(data: Value) -> Result<Self> {
        let raw: RawUserPage = serde_json::from_value(data)?;
        let users: Vec<UserSummary> = raw
            .data
            .into_iter()
            .map(|user| UserSummary {
                id: user.uuid,
                user_name: user.user_name,
                permission: user.permission,
                registered_at: user.register_time,
                last_login_at: user.login_time,
                instance_count: user.instances.len(),
            })
            .collect();

        Ok(Self {
            total: raw.total.unwrap_or(users.len() as u64),
            page: raw.page,
            max_page: raw.max_page,
            users,
        })
    }
}
