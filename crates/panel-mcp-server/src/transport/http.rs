//! Streamable HTTP transport with per-session routing
//!
//! One path answers POST, GET and DELETE. A session is created only by an
//! `initialize` request that carries no session header; every other request
//! must name a live session in the `mcp-session-id` header.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use futures::StreamExt;
use futures::future::ready;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::mcp::{self, is_initialize_request};
use crate::session::{SessionTable, SessionTransport};

/// Header carrying the session identifier in both directions
pub const SESSION_HEADER: &str = "mcp-session-id";

const INVALID_SESSION_TEXT: &str = "Invalid or missing session ID";

/// HTTP transport settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Route serving POST, GET and DELETE
    pub path: String,
    /// Keep-alive interval on notification streams
    pub sse_keep_alive: Duration,
    /// Close sessions idle for this long; `None` keeps them until DELETE
    pub session_idle_timeout: Option<Duration>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            path: "/mcp".to_string(),
            sse_keep_alive: Duration::from_secs(15),
            session_idle_timeout: None,
        }
    }
}

/// Routes HTTP exchanges to the session they belong to
#[derive(Clone)]
pub struct SessionRouter {
    sessions: Arc<RwLock<SessionTable>>,
    dispatcher: Arc<Dispatcher>,
    config: HttpConfig,
}

impl SessionRouter {
    pub fn new(dispatcher: Arc<Dispatcher>, config: HttpConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(SessionTable::new())),
            dispatcher,
            config,
        }
    }

    /// Build the axum router serving the MCP path
    pub fn into_router(self) -> Router {
        let path = self.config.path.clone();
        Router::new()
            .route(&path, post(handle_post).get(handle_get).delete(handle_delete))
            .with_state(self)
    }

    /// Create and register a session with a fresh id
    ///
    /// The entry is removed as soon as the transport closes, whatever closed it.
    pub async fn create_session(&self) -> Arc<SessionTransport> {
        let transport = {
            let mut sessions = self.sessions.write().await;
            let id = sessions.allocate_id();
            let transport = Arc::new(SessionTransport::new(id));
            sessions.insert(transport.clone());
            transport
        };

        let sessions = self.sessions.clone();
        let closed = transport.closed();
        let id = transport.id().to_string();
        tokio::spawn(async move {
            closed.cancelled().await;
            if sessions.write().await.remove(&id).is_some() {
                info!(session_id = %id, "Session closed");
            }
        });

        info!(session_id = %transport.id(), "Session created");
        transport
    }

    /// Look up a live session
    pub async fn lookup(&self, id: &str) -> Option<Arc<SessionTransport>> {
        self.sessions.read().await.get(id)
    }

    /// Close a session and drop its entry; unknown ids are a no-op
    pub async fn teardown(&self, id: &str) {
        let removed = self.sessions.write().await.remove(id);
        if let Some(transport) = removed {
            transport.close();
            info!(session_id = %id, "Session terminated");
        }
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.count()
    }

    /// Close every session idle for at least `idle`
    ///
    /// Candidates are re-checked under the write lock, so a session that saw
    /// activity after the scan survives.
    pub async fn reap(&self, idle: Duration) -> usize {
        let candidates = self.sessions.read().await.stale(idle);
        if candidates.is_empty() {
            return 0;
        }

        let reaped: Vec<Arc<SessionTransport>> = {
            let mut sessions = self.sessions.write().await;
            candidates
                .iter()
                .filter_map(|t| sessions.remove_if_stale(t.id(), idle))
                .collect()
        };
        for transport in &reaped {
            debug!(session_id = %transport.id(), "Reaping idle session");
            transport.close();
        }
        reaped.len()
    }

    /// Periodically reap idle sessions until `shutdown` fires
    pub fn spawn_reaper(&self, idle: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let router = self.clone();
        let period = (idle / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let reaped = router.reap(idle).await;
                        if reaped > 0 {
                            info!(reaped, "Closed idle sessions");
                        }
                    }
                }
            }
        })
    }

    /// Close every live session
    pub async fn close_all(&self) {
        let drained = self.sessions.write().await.drain();
        for transport in drained {
            transport.close();
        }
    }
}

/// Session header as sent by the client
enum SessionHeader<'a> {
    Absent,
    /// Present but not visible ASCII; never matches a session
    Unreadable,
    Id(&'a str),
}

fn session_header(headers: &HeaderMap) -> SessionHeader<'_> {
    match headers.get(SESSION_HEADER).map(HeaderValue::to_str) {
        None => SessionHeader::Absent,
        Some(Ok(id)) => SessionHeader::Id(id),
        Some(Err(_)) => SessionHeader::Unreadable,
    }
}

fn rpc_reply(status: StatusCode, body: &mcp::Response) -> Response {
    (status, axum::Json(body)).into_response()
}

fn invalid_session() -> Response {
    (StatusCode::BAD_REQUEST, INVALID_SESSION_TEXT).into_response()
}

/// Resolve the session named by the header for GET and DELETE
async fn gate(router: &SessionRouter, headers: &HeaderMap) -> Option<Arc<SessionTransport>> {
    match session_header(headers) {
        SessionHeader::Id(id) => router.lookup(id).await,
        SessionHeader::Absent | SessionHeader::Unreadable => None,
    }
}

/// POST: client-to-server messages
async fn handle_post(
    State(router): State<SessionRouter>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Rejecting unparseable body");
            return rpc_reply(StatusCode::BAD_REQUEST, &mcp::Response::parse_error(e));
        }
    };

    let (transport, created) = match session_header(&headers) {
        SessionHeader::Id(id) => match router.lookup(id).await {
            Some(t) => (t, false),
            None => {
                debug!(session_id = id, "Unknown session");
                return rpc_reply(StatusCode::BAD_REQUEST, &mcp::Response::no_valid_session());
            }
        },
        SessionHeader::Absent if is_initialize_request(&payload) => {
            (router.create_session().await, true)
        }
        SessionHeader::Absent | SessionHeader::Unreadable => {
            return rpc_reply(StatusCode::BAD_REQUEST, &mcp::Response::no_valid_session());
        }
    };

    let outcome = transport.handle_post(payload, &router.dispatcher).await;

    // A failed handshake leaves nothing behind
    if created && !transport.state().is_initialized() {
        router.teardown(transport.id()).await;
        return match outcome {
            Ok(Some(reply)) => axum::Json(reply).into_response(),
            Ok(None) => StatusCode::ACCEPTED.into_response(),
            Err(rejection) => rpc_reply(StatusCode::BAD_REQUEST, &rejection),
        };
    }

    match outcome {
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Ok(Some(reply)) => {
            let mut response = axum::Json(reply).into_response();
            if created {
                if let Ok(value) = HeaderValue::from_str(transport.id()) {
                    response.headers_mut().insert(SESSION_HEADER, value);
                }
            }
            response
        }
        Err(rejection) => rpc_reply(StatusCode::BAD_REQUEST, &rejection),
    }
}

/// Releases the stream slot when the SSE body is dropped
struct StreamSlot(Arc<SessionTransport>);

impl Drop for StreamSlot {
    fn drop(&mut self) {
        self.0.release_stream();
        debug!(session_id = %self.0.id(), "Notification stream closed");
    }
}

/// GET: standalone server-to-client notification stream
async fn handle_get(State(router): State<SessionRouter>, headers: HeaderMap) -> Response {
    let Some(transport) = gate(&router, &headers).await else {
        return invalid_session();
    };

    let Some(rx) = transport.open_stream() else {
        return (
            StatusCode::CONFLICT,
            "Conflict: Only one SSE stream is allowed per session",
        )
            .into_response();
    };

    debug!(session_id = %transport.id(), "Notification stream opened");

    let closed = transport.closed();
    let slot = StreamSlot(transport);
    let stream = BroadcastStream::new(rx)
        .filter_map(move |item| {
            let _slot = &slot;
            ready(match item {
                Ok(notification) => match Event::default().event("message").json_data(&notification) {
                    Ok(event) => Some(Ok::<_, Infallible>(event)),
                    Err(e) => {
                        warn!(error = %e, "Failed to encode notification");
                        None
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Notification stream lagged");
                    None
                }
            })
        })
        .take_until(closed.cancelled_owned());

    let keep_alive = KeepAlive::new()
        .interval(router.config.sse_keep_alive)
        .text("keep-alive");

    let mut response = Sse::new(stream).keep_alive(keep_alive).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

/// DELETE: explicit session termination
async fn handle_delete(State(router): State<SessionRouter>, headers: HeaderMap) -> Response {
    let Some(transport) = gate(&router, &headers).await else {
        return invalid_session();
    };

    router.teardown(transport.id()).await;
    StatusCode::OK.into_response()
}
