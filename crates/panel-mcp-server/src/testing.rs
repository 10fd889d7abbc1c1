//! In-memory panel used by unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use panel_mcp_core::{
    FileQuery, InstanceAction, InstanceQuery, InstanceRef, PanelError, Result, UpstreamResponse,
    UserQuery,
};
use serde_json::{Value, json};

use crate::panel::PanelApi;

/// Fake panel answering from canned responses and recording every call
///
/// Operations without a canned response answer `200 {"status":200,"data":null}`.
#[derive(Default)]
pub struct FakePanel {
    responses: HashMap<&'static str, UpstreamResponse>,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, operation: &'static str, status: u16, body: Value) -> Self {
        self.responses
            .insert(operation, UpstreamResponse::new(status, body));
        self
    }

    /// Make an operation fail at the transport level
    pub fn fail(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn reply(&self, operation: &'static str, args: Value) -> Result<UpstreamResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((operation.to_string(), args));
        }
        if self.failing.contains(operation) {
            return Err(PanelError::Http("connection refused".into()));
        }
        Ok(self.responses.get(operation).cloned().unwrap_or_else(|| {
            UpstreamResponse::new(200, json!({"status": 200, "data": null}))
        }))
    }
}

fn target_args(target: &InstanceRef) -> Value {
    json!({"daemonId": target.daemon_id, "instanceId": target.instance_id})
}

fn with(mut args: Value, key: &str, value: Value) -> Value {
    if let Some(map) = args.as_object_mut() {
        map.insert(key.to_string(), value);
    }
    args
}

#[async_trait]
impl PanelApi for FakePanel {
    async fn list_daemons(&self) -> Result<UpstreamResponse> {
        self.reply("list_daemons", json!({}))
    }

    async fn list_instances(&self, query: &InstanceQuery) -> Result<UpstreamResponse> {
        self.reply("list_instances", json!({"daemonId": query.daemon_id}))
    }

    async fn instance_detail(&self, target: &InstanceRef) -> Result<UpstreamResponse> {
        self.reply("instance_detail", target_args(target))
    }

    async fn instance_action(
        &self,
        target: &InstanceRef,
        action: InstanceAction,
    ) -> Result<UpstreamResponse> {
        let args = with(target_args(target), "action", json!(action.endpoint()));
        self.reply("instance_action", args)
    }

    async fn send_command(&self, target: &InstanceRef, command: &str) -> Result<UpstreamResponse> {
        let args = with(target_args(target), "command", json!(command));
        self.reply("send_command", args)
    }

    async fn list_files(
        &self,
        target: &InstanceRef,
        query: &FileQuery,
    ) -> Result<UpstreamResponse> {
        let args = with(target_args(target), "target", json!(query.target));
        self.reply("list_files", args)
    }

    async fn read_file(&self, target: &InstanceRef, path: &str) -> Result<UpstreamResponse> {
        let args = with(target_args(target), "path", json!(path));
        self.reply("read_file", args)
    }

    async fn write_file(
        &self,
        target: &InstanceRef,
        path: &str,
        content: &str,
    ) -> Result<UpstreamResponse> {
        let args = with(target_args(target), "path", json!(path));
        let args = with(args, "content", json!(content));
        self.reply("write_file", args)
    }

    async fn list_users(&self, query: &UserQuery) -> Result<UpstreamResponse> {
        self.reply(
            "list_users",
            json!({"userName": query.user_name, "page": query.page}),
        )
    }

    async fn overview(&self) -> Result<UpstreamResponse> {
        self.reply("overview", json!({}))
    }
}
