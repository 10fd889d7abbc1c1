//! HTTP client for the panel REST API

use async_trait::async_trait;
use panel_mcp_core::{
    FileQuery, InstanceAction, InstanceQuery, InstanceRef, PanelError, Result, UpstreamResponse,
    UserQuery,
};
use panel_mcp_server::PanelApi;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::PanelConfig;

type Query = Vec<(&'static str, String)>;

/// HTTP client for the panel
///
/// Every request carries the API key as the `apikey` query parameter and the
/// `X-Requested-With` header the panel requires for key-based access.
#[derive(Clone)]
pub struct PanelClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl PanelClient {
    /// Create a client for the configured panel
    ///
    /// Example: `PanelClient::new(PanelConfig::new("http://localhost:23333", key))`
    #[must_use]
    pub fn new(config: PanelConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query,
        body: Option<Value>,
    ) -> Result<UpstreamResponse> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, path, "Calling panel");

        let mut request = self
            .http
            .request(method, &url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(&query)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PanelError::Http(e.without_url().to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PanelError::Http(e.without_url().to_string()))?;

        debug!(path, status, "Panel responded");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text))
        };
        Ok(UpstreamResponse::new(status, body))
    }

    async fn get(&self, path: &str, query: Query) -> Result<UpstreamResponse> {
        self.send(Method::GET, path, query, None).await
    }
}

impl std::fmt::Debug for PanelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn target_query(target: &InstanceRef) -> Query {
    vec![
        ("uuid", target.instance_id.clone()),
        ("daemonId", target.daemon_id.clone()),
    ]
}

#[async_trait]
impl PanelApi for PanelClient {
    async fn list_daemons(&self) -> Result<UpstreamResponse> {
        self.get("/api/service/remote_services_list", Vec::new())
            .await
    }

    async fn list_instances(&self, query: &InstanceQuery) -> Result<UpstreamResponse> {
        self.get(
            "/api/service/remote_service_instances",
            vec![
                ("daemonId", query.daemon_id.clone()),
                ("page", query.page.to_string()),
                ("page_size", query.page_size.to_string()),
                ("instance_name", query.instance_name.clone()),
                ("status", query.status.clone()),
            ],
        )
        .await
    }

    async fn instance_detail(&self, target: &InstanceRef) -> Result<UpstreamResponse> {
        self.get("/api/instance", target_query(target)).await
    }

    async fn instance_action(
        &self,
        target: &InstanceRef,
        action: InstanceAction,
    ) -> Result<UpstreamResponse> {
        let path = format!("/api/protected_instance/{}", action.endpoint());
        self.get(&path, target_query(target)).await
    }

    async fn send_command(&self, target: &InstanceRef, command: &str) -> Result<UpstreamResponse> {
        let mut query = target_query(target);
        query.push(("command", command.to_string()));
        self.get("/api/protected_instance/command", query).await
    }

    async fn list_files(
        &self,
        target: &InstanceRef,
        query: &FileQuery,
    ) -> Result<UpstreamResponse> {
        self.get(
            "/api/files/list",
            vec![
                ("daemonId", target.daemon_id.clone()),
                ("uuid", target.instance_id.clone()),
                ("target", query.target.clone()),
                ("page", query.page.to_string()),
                ("page_size", query.page_size.to_string()),
            ],
        )
        .await
    }

    async fn read_file(&self, target: &InstanceRef, path: &str) -> Result<UpstreamResponse> {
        self.send(
            Method::PUT,
            "/api/files/",
            target_query(target),
            Some(json!({ "target": path })),
        )
        .await
    }

    async fn write_file(
        &self,
        target: &InstanceRef,
        path: &str,
        content: &str,
    ) -> Result<UpstreamResponse> {
        self.send(
            Method::PUT,
            "/api/files/",
            target_query(target),
            Some(json!({ "target": path, "text": content })),
        )
        .await
    }

    async fn list_users(&self, query: &UserQuery) -> Result<UpstreamResponse> {
        self.get(
            "/api/auth/search",
            vec![
                ("userName", query.user_name.clone()),
                ("page", query.page.to_string()),
                ("page_size", query.page_size.to_string()),
                ("role", query.role.clone()),
            ],
        )
        .await
    }

    async fn overview(&self) -> Result<UpstreamResponse> {
        self.get("/api/overview", Vec::new()).await
    }
}
