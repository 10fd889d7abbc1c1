//! JSON-RPC method dispatch shared by every transport

use std::sync::Arc;

use futures::future::join_all;
use panel_mcp_core::error_codes;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::mcp::{
    ClientMessage, Inbound, InitializeParams, InitializeResult, LogLevel, Request,
    ResourcesCapability, Response, ServerCapabilities, ServerInfo, ToolsCapability,
    negotiate_protocol_version,
};
use crate::panel::PanelApi;
use crate::resources::{list_resource_templates, list_resources, read_resource};
use crate::session::{Negotiated, SessionState};
use crate::tools::{handle_tool_call, list_tools};

const SERVER_NAME: &str = "panel-mcp";

const INSTRUCTIONS: &str = "Tools for a game-server management panel. Call get-daemons first to \
find daemon IDs, then get-instances to find instance IDs on a daemon.";

/// Routes decoded messages to tool, resource and lifecycle handlers
pub struct Dispatcher {
    panel: Arc<dyn PanelApi>,
}

impl Dispatcher {
    pub fn new(panel: Arc<dyn PanelApi>) -> Self {
        Self { panel }
    }

    /// Handle one decoded inbound body for a session
    ///
    /// Returns `Ok(None)` when the body held only notifications or replies,
    /// `Ok(Some(_))` with a single response or a response array, and `Err`
    /// when the body is not a JSON-RPC message at all.
    pub async fn handle_payload(
        &self,
        payload: Value,
        state: &SessionState,
    ) -> std::result::Result<Option<Value>, Response> {
        let inbound: Inbound =
            serde_json::from_value(payload).map_err(Response::invalid_request)?;

        match inbound {
            Inbound::Single(message) => {
                let response = self.handle_message(message, state).await;
                response
                    .map(|r| serde_json::to_value(r).map_err(Response::parse_error))
                    .transpose()
            }
            Inbound::Batch(messages) => {
                if messages.is_empty() {
                    return Err(Response::invalid_request("empty batch"));
                }
                let responses: Vec<Response> =
                    join_all(messages.into_iter().map(|m| self.handle_message(m, state)))
                        .await
                        .into_iter()
                        .flatten()
                        .collect();
                if responses.is_empty() {
                    return Ok(None);
                }
                serde_json::to_value(responses)
                    .map(Some)
                    .map_err(Response::parse_error)
            }
        }
    }

    async fn handle_message(
        &self,
        message: ClientMessage,
        state: &SessionState,
    ) -> Option<Response> {
        match message {
            ClientMessage::Request(request) if request.is_notification() => {
                self.handle_notification(&request);
                None
            }
            ClientMessage::Request(request) => Some(self.handle_request(&request, state).await),
            ClientMessage::Reply(reply) => {
                debug!(id = ?reply.id, "Ignoring client reply");
                None
            }
        }
    }

    fn handle_notification(&self, request: &Request) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => debug!("Client initialized"),
            "notifications/cancelled" => debug!(params = %request.params, "Client cancelled request"),
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    /// Handle one request carrying an id
    pub async fn handle_request(&self, request: &Request, state: &SessionState) -> Response {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request, state),
            "ping" => respond(request, json!({})),
            "tools/list" => respond(request, json!({ "tools": list_tools() })),
            "tools/call" => self.handle_tools_call(request, state).await,
            "resources/list" => respond(request, json!({ "resources": list_resources() })),
            "resources/templates/list" => respond(
                request,
                json!({ "resourceTemplates": list_resource_templates() }),
            ),
            "resources/read" => self.handle_resources_read(request).await,
            "logging/setLevel" => handle_set_level(request, state),
            _ => Response::error(
                request.id.clone(),
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, request: &Request, state: &SessionState) -> Response {
        let params: InitializeParams = match serde_json::from_value(request.params.clone()) {
            Ok(p) => p,
            Err(e) => {
                return Response::error(
                    request.id.clone(),
                    error_codes::INVALID_PARAMS,
                    format!("Invalid initialize params: {}", e),
                );
            }
        };

        let protocol_version = negotiate_protocol_version(&params.protocol_version);
        let negotiated = Negotiated {
            protocol_version: protocol_version.to_string(),
            client: params.client_info,
        };
        let client = negotiated.client.clone();
        if !state.mark_initialized(negotiated) {
            return Response::error(
                request.id.clone(),
                error_codes::INVALID_REQUEST,
                "Invalid Request: Server already initialized",
            );
        }

        info!(
            client = %client.name,
            client_version = %client.version,
            protocol_version,
            "Session initialized"
        );

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
                resources: ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                },
                logging: json!({}),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        to_response(request, &result)
    }

    async fn handle_tools_call(&self, request: &Request, state: &SessionState) -> Response {
        #[derive(Deserialize)]
        struct CallParams {
            name: String,
            #[serde(default)]
            arguments: Value,
        }

        let params: CallParams = match serde_json::from_value(request.params.clone()) {
            Ok(p) => p,
            Err(e) => {
                return Response::error(
                    request.id.clone(),
                    error_codes::INVALID_PARAMS,
                    format!("Invalid tools/call params: {}", e),
                );
            }
        };

        match handle_tool_call(&params.name, params.arguments, self.panel.as_ref()).await {
            Ok(result) => {
                let level = if result.is_error {
                    LogLevel::Error
                } else {
                    LogLevel::Info
                };
                state.log(
                    level,
                    json!({ "tool": params.name, "isError": result.is_error }),
                );
                to_response(request, &result)
            }
            Err(e) => Response::error(request.id.clone(), e.rpc_code(), e.to_string()),
        }
    }

    async fn handle_resources_read(&self, request: &Request) -> Response {
        #[derive(Deserialize)]
        struct ReadParams {
            uri: String,
        }

        let params: ReadParams = match serde_json::from_value(request.params.clone()) {
            Ok(p) => p,
            Err(e) => {
                return Response::error(
                    request.id.clone(),
                    error_codes::INVALID_PARAMS,
                    format!("Invalid resources/read params: {}", e),
                );
            }
        };

        match read_resource(&params.uri, self.panel.as_ref()).await {
            Ok(contents) => respond(request, contents),
            Err(e) => Response::error(request.id.clone(), e.rpc_code(), e.to_string()),
        }
    }
}

fn handle_set_level(request: &Request, state: &SessionState) -> Response {
    #[derive(Deserialize)]
    struct SetLevelParams {
        level: LogLevel,
    }

    match serde_json::from_value::<SetLevelParams>(request.params.clone()) {
        Ok(p) => {
            state.set_log_level(p.level);
            respond(request, json!({}))
        }
        Err(e) => Response::error(
            request.id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Invalid logging/setLevel params: {}", e),
        ),
    }
}

fn respond(request: &Request, result: Value) -> Response {
    match request.id.clone() {
        Some(id) => Response::success(id, result),
        None => Response::invalid_request("missing id"),
    }
}

fn to_response<T: serde::Serialize>(request: &Request, result: &T) -> Response {
    match serde_json::to_value(result) {
        Ok(value) => respond(request, value),
        Err(e) => Response::error(
            request.id.clone(),
            error_codes::INTERNAL_ERROR,
            format!("Serialization error: {}", e),
        ),
    }
}
