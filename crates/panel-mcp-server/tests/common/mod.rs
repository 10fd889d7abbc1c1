//! Shared helpers for router integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use panel_mcp_core::{
    FileQuery, InstanceAction, InstanceQuery, InstanceRef, Result, UpstreamResponse, UserQuery,
};
use panel_mcp_server::{HttpConfig, PanelApi, PanelMcpServer, SESSION_HEADER, SessionRouter};
use serde_json::{Value, json};

/// Panel double keyed by operation name
#[derive(Default)]
pub struct ScriptedPanel {
    responses: HashMap<&'static str, UpstreamResponse>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, operation: &'static str, status: u16, body: Value) -> Self {
        self.responses
            .insert(operation, UpstreamResponse::new(status, body));
        self
    }

    fn reply(&self, operation: &'static str) -> Result<UpstreamResponse> {
        self.calls.lock().unwrap().push(operation);
        Ok(self
            .responses
            .get(operation)
            .cloned()
            .unwrap_or_else(|| UpstreamResponse::new(200, json!({"status": 200, "data": null}))))
    }
}

#[async_trait]
impl PanelApi for ScriptedPanel {
    async fn list_daemons(&self) -> Result<UpstreamResponse> {
        self.reply("list_daemons")
    }

    async fn list_instances(&self, _query: &InstanceQuery) -> Result<UpstreamResponse> {
        self.reply("list_instances")
    }

    async fn instance_detail(&self, _target: &InstanceRef) -> Result<UpstreamResponse> {
        self.reply("instance_detail")
    }

    async fn instance_action(
        &self,
        _target: &InstanceRef,
        _action: InstanceAction,
    ) -> Result<UpstreamResponse> {
        self.reply("instance_action")
    }

    async fn send_command(&self, _target: &InstanceRef, _command: &str) -> Result<UpstreamResponse> {
        self.reply("send_command")
    }

    async fn list_files(&self, _target: &InstanceRef, _query: &FileQuery) -> Result<UpstreamResponse> {
        self.reply("list_files")
    }

    async fn read_file(&self, _target: &InstanceRef, _path: &str) -> Result<UpstreamResponse> {
        self.reply("read_file")
    }

    async fn write_file(
        &self,
        _target: &InstanceRef,
        _path: &str,
        _content: &str,
    ) -> Result<UpstreamResponse> {
        self.reply("write_file")
    }

    async fn list_users(&self, _query: &UserQuery) -> Result<UpstreamResponse> {
        self.reply("list_users")
    }

    async fn overview(&self) -> Result<UpstreamResponse> {
        self.reply("overview")
    }
}

/// Session router over a scripted panel
pub fn test_router(panel: ScriptedPanel) -> (SessionRouter, Arc<ScriptedPanel>) {
    let panel = Arc::new(panel);
    let server = PanelMcpServer::new(panel.clone());
    (server.session_router(HttpConfig::default()), panel)
}

pub fn initialize_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": { "name": "integration", "version": "1.0.0" }
        }
    })
}

pub fn post(body: &Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/mcp")
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(session: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/mcp").header("accept", "text/event-stream");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(session: Option<&str>) -> Request<Body> {
    let mut builder = Request::delete("/mcp");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}
