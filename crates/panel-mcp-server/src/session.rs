//! Protocol sessions and the process-wide session table

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::mcp::{ClientInfo, LogLevel, Notification, Response};

/// Opaque session identifier handed to clients
pub type SessionId = String;

/// Buffered server-to-client notifications per session
const NOTIFICATION_CAPACITY: usize = 64;

/// Logger name used in `notifications/message`
pub const LOGGER_NAME: &str = "panel-mcp";

/// Outcome of the `initialize` handshake
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub protocol_version: String,
    pub client: ClientInfo,
}

/// Per-session protocol state
///
/// Shared by every request on the session; none of it is held across an
/// upstream call.
pub struct SessionState {
    negotiated: OnceLock<Negotiated>,
    min_log_level: AtomicU8,
    events: broadcast::Sender<Notification>,
}

impl SessionState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            negotiated: OnceLock::new(),
            min_log_level: AtomicU8::new(LogLevel::Info as u8),
            events,
        }
    }

    /// Record the handshake; returns false if the session was already initialized
    pub fn mark_initialized(&self, negotiated: Negotiated) -> bool {
        self.negotiated.set(negotiated).is_ok()
    }

    pub fn is_initialized(&self) -> bool {
        self.negotiated.get().is_some()
    }

    pub fn negotiated(&self) -> Option<&Negotiated> {
        self.negotiated.get()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.min_log_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_log_level.load(Ordering::Relaxed))
    }

    /// Subscribe to notifications pushed on this session
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Push a log notification if it passes the session's level
    ///
    /// Dropped silently when nobody is listening.
    pub fn log(&self, level: LogLevel, data: Value) {
        if level < self.log_level() {
            return;
        }
        let _ = self
            .events
            .send(Notification::log_message(level, LOGGER_NAME, data));
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport bound to one HTTP session
///
/// Owns the protocol state, the standalone notification stream slot and the
/// closure signal. Closing is idempotent.
pub struct SessionTransport {
    id: SessionId,
    state: SessionState,
    closed: CancellationToken,
    stream_open: AtomicBool,
    created: Instant,
    last_activity_ms: AtomicU64,
}

impl SessionTransport {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::new(),
            closed: CancellationToken::new(),
            stream_open: AtomicBool::new(false),
            created: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Decode and dispatch one POST body
    pub async fn handle_post(
        &self,
        body: Value,
        dispatcher: &Dispatcher,
    ) -> std::result::Result<Option<Value>, Response> {
        self.touch();
        dispatcher.handle_payload(body, &self.state).await
    }

    /// Claim the standalone SSE stream slot
    ///
    /// Returns `None` while another stream is open on this session.
    pub fn open_stream(&self) -> Option<broadcast::Receiver<Notification>> {
        self.touch();
        if self.stream_open.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.state.subscribe())
    }

    /// Release the standalone SSE stream slot
    pub fn release_stream(&self) {
        self.stream_open.store(false, Ordering::SeqCst);
    }

    pub fn has_open_stream(&self) -> bool {
        self.stream_open.load(Ordering::SeqCst)
    }

    /// Signal closure; teardown hooks waiting on [`Self::closed`] fire once
    pub fn close(&self) {
        if !self.closed.is_cancelled() {
            debug!(session_id = %self.id, "Closing session transport");
        }
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Token cancelled when the session closes
    pub fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    pub fn touch(&self) {
        let elapsed = self.created.elapsed().as_millis() as u64;
        self.last_activity_ms.store(elapsed, Ordering::Relaxed);
    }

    /// Time since the last request on this session
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_activity_ms.load(Ordering::Relaxed));
        self.created.elapsed().saturating_sub(last)
    }
}

/// Table of live sessions
///
/// Holds only live entries; a closed session leaves nothing behind.
#[derive(Default)]
pub struct SessionTable {
    sessions: HashMap<SessionId, Arc<SessionTransport>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh random session id that no live session holds
    pub fn allocate_id(&self) -> SessionId {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }

    /// Insert a transport under its id
    pub fn insert(&mut self, transport: Arc<SessionTransport>) {
        self.sessions.insert(transport.id().to_string(), transport);
    }

    /// Get a live session
    pub fn get(&self, id: &str) -> Option<Arc<SessionTransport>> {
        self.sessions.get(id).cloned()
    }

    /// Remove a session; removing an absent id is a no-op
    pub fn remove(&mut self, id: &str) -> Option<Arc<SessionTransport>> {
        self.sessions.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Sessions idle for at least `idle` with no open stream
    pub fn stale(&self, idle: Duration) -> Vec<Arc<SessionTransport>> {
        self.sessions
            .values()
            .filter(|s| !s.has_open_stream() && s.idle_for() >= idle)
            .cloned()
            .collect()
    }

    /// Remove a session only if it is still idle for at least `idle` with no
    /// open stream
    pub fn remove_if_stale(&mut self, id: &str, idle: Duration) -> Option<Arc<SessionTransport>> {
        let still_stale = self
            .sessions
            .get(id)
            .is_some_and(|s| !s.has_open_stream() && s.idle_for() >= idle);
        if still_stale {
            self.sessions.remove(id)
        } else {
            None
        }
    }

    /// Remove and return every session
    pub fn drain(&mut self) -> Vec<Arc<SessionTransport>> {
        self.sessions.drain().map(|(_, s)| s).collect()
    }

    /// Number of live sessions
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Ids of live sessions
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }
}
