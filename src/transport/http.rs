//! HTTP transport for the chat backend.
//!
//! The backend exposes a plain JSON endpoint (`POST /api/chat` with
//! `{query}`) rather than a socket. `HttpTransport` owns a background
//! driver task that turns that request/response API into the realtime
//! event stream a `ChatSession` consumes:
//!
//! ```text
//!   handshake ──ok──► Connect ──► serve (requests + heartbeat)
//!       │                              │
//!      err                       lost connection
//!       ▼                              ▼
//!   ConnectError ──► reconnect ◄── Disconnect(reason)
//!                      │   ▲
//!     ReconnectAttempt(n)  └── ConnectError (retry)
//!                      │
//!               ReconnectFailed (stop)
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::backend::{BackendError, ChatBackend, Transport, TransportError};
use super::policy::ReconnectPolicy;
use super::types::{ChatMessage, DisconnectReason, TransportEvent, chat_fault};
use crate::core::notices::{Locale, Notice};

pub const DEFAULT_CHAT_PATH: &str = "/api/chat";
pub const DEFAULT_HEALTH_PATH: &str = "/";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HEARTBEAT_MS: u64 = 25_000;

// ============================================================================
// Backend
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub chat_path: String,
    pub health_path: String,
    pub request_timeout: Duration,
    pub handshake_timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            handshake_timeout: Duration::from_millis(super::policy::DEFAULT_HANDSHAKE_TIMEOUT_MS),
        }
    }
}

/// The chat backend reached over HTTP.
pub struct HttpBackend {
    chat_url: String,
    health_url: String,
    request_timeout: Duration,
    handshake_timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &HttpBackendConfig) -> Result<Self, BackendError> {
        let base = reqwest::Url::parse(&config.base_url)
            .map_err(|e| BackendError::Config(format!("invalid url '{}': {e}", config.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(BackendError::Config(format!(
                "unsupported scheme '{}' (expected http or https)",
                base.scheme()
            )));
        }

        Ok(Self {
            chat_url: join_url(&config.base_url, &config.chat_path),
            health_url: join_url(&config.base_url, &config.health_path),
            request_timeout: config.request_timeout,
            handshake_timeout: config.handshake_timeout,
            client: reqwest::Client::new(),
        })
    }
}

/// Joins a base URL and a path without doubling or dropping the slash.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

fn classify(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else if error.is_connect() {
        BackendError::Unreachable(error.to_string())
    } else {
        BackendError::Network(error.to_string())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.chat_url
    }

    async fn handshake(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(&self.health_url)
            .timeout(self.handshake_timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        debug!("Handshake response status: {}", status);
        if status.is_server_error() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: None,
            });
        }
        Ok(())
    }

    async fn ask(&self, message: &ChatMessage) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(message)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let text = response.text().await.map_err(classify)?;
        debug!("Chat response status: {} ({} bytes)", status, text.len());

        if !status.is_success() {
            warn!("Chat API error: {} - {}", status, text);
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: serde_json::from_str(&text).ok(),
            });
        }

        serde_json::from_str(&text).map_err(|e| BackendError::Parse(e.to_string()))
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub policy: ReconnectPolicy,
    /// Liveness probe period while connected. `None` disables it.
    pub heartbeat: Option<Duration>,
    /// Language of the error payloads synthesised by the transport.
    pub locale: Locale,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
            heartbeat: Some(Duration::from_millis(DEFAULT_HEARTBEAT_MS)),
            locale: Locale::default(),
        }
    }
}

/// Handle to a running connection driver.
pub struct HttpTransport {
    outbound: mpsc::UnboundedSender<ChatMessage>,
    task: AbortHandle,
    closed: bool,
}

impl HttpTransport {
    /// Starts the driver. Must be called inside a tokio runtime.
    pub fn spawn(
        backend: Arc<dyn ChatBackend>,
        settings: TransportSettings,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            backend,
            settings,
            events,
            outbound: outbound_rx,
        };
        let handle = tokio::spawn(driver.run());

        Self {
            outbound: outbound_tx,
            task: handle.abort_handle(),
            closed: false,
        }
    }
}

impl Transport for HttpTransport {
    fn emit(&mut self, message: ChatMessage) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(message)
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        if !self.closed {
            info!("Closing HTTP transport");
            self.task.abort();
            self.closed = true;
        }
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// The session stopped listening; nothing left to drive.
struct Stopped;

struct Driver {
    backend: Arc<dyn ChatBackend>,
    settings: TransportSettings,
    events: mpsc::UnboundedSender<TransportEvent>,
    outbound: mpsc::UnboundedReceiver<ChatMessage>,
}

impl Driver {
    async fn run(mut self) {
        info!("Transport driver starting against {}", self.backend.name());
        if self.drive().await.is_err() {
            debug!("Transport driver stopping: event receiver dropped");
        }
    }

    async fn drive(&mut self) -> Result<(), Stopped> {
        let mut connected = self.handshake().await?;
        loop {
            if !connected {
                self.discard_stale();
                if !self.reconnect().await? {
                    warn!(
                        "Giving up after {} reconnect attempts",
                        self.settings.policy.max_attempts
                    );
                    self.emit(TransportEvent::ReconnectFailed)?;
                    return Ok(());
                }
            }

            let reason = self.serve().await?;
            info!("Connection lost: {}", reason);
            let client_side = reason == DisconnectReason::ClientDisconnect;
            self.emit(TransportEvent::Disconnect(reason))?;
            if client_side {
                return Ok(());
            }
            connected = false;
        }
    }

    fn emit(&self, event: TransportEvent) -> Result<(), Stopped> {
        debug!("Transport event: {:?}", event);
        self.events.send(event).map_err(|_| Stopped)
    }

    /// One handshake; emits `Connect` or `ConnectError`.
    async fn handshake(&mut self) -> Result<bool, Stopped> {
        match self.backend.handshake().await {
            Ok(()) => {
                info!("Connected to {}", self.backend.name());
                self.emit(TransportEvent::Connect)?;
                Ok(true)
            }
            Err(e) => {
                warn!("Handshake failed: {}", e);
                self.emit(TransportEvent::ConnectError(e.as_connect_failure()))?;
                Ok(false)
            }
        }
    }

    async fn reconnect(&mut self) -> Result<bool, Stopped> {
        let policy = self.settings.policy.clone();
        for attempt in 1..=policy.max_attempts {
            let delay = policy.delay_for(attempt);
            debug!("Reconnect attempt {} in {:?}", attempt, delay);
            tokio::time::sleep(delay).await;
            self.emit(TransportEvent::ReconnectAttempt(attempt))?;
            if self.handshake().await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Messages queued while the link was down belong to abandoned exchanges.
    fn discard_stale(&mut self) {
        while let Ok(message) = self.outbound.try_recv() {
            warn!(
                "Discarding message queued while disconnected ({} chars)",
                message.query.len()
            );
        }
    }

    /// Runs until the connection is lost; returns why.
    async fn serve(&mut self) -> Result<DisconnectReason, Stopped> {
        let mut heartbeat = self.settings.heartbeat.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                message = self.outbound.recv() => {
                    let Some(message) = message else {
                        return Ok(DisconnectReason::ClientDisconnect);
                    };
                    if let Some(reason) = self.exchange(message).await? {
                        return Ok(reason);
                    }
                    if let Some(interval) = heartbeat.as_mut() {
                        interval.reset();
                    }
                }
                () = tick(&mut heartbeat) => {
                    if let Err(e) = self.backend.handshake().await {
                        warn!("Heartbeat failed: {}", e);
                        return Ok(heartbeat_loss(&e));
                    }
                    debug!("Heartbeat ok");
                }
            }
        }
    }

    /// Sends one query and emits its reply. Returns a reason if the link dropped.
    async fn exchange(&mut self, message: ChatMessage) -> Result<Option<DisconnectReason>, Stopped> {
        info!("Sending chat message ({} chars)", message.query.len());
        let locale = self.settings.locale;
        let event = match self.backend.ask(&message).await {
            Ok(body) => TransportEvent::ChatResponse(body),
            Err(BackendError::Api {
                status,
                body: Some(body),
            }) => {
                debug!("Forwarding JSON error body from HTTP {}", status);
                TransportEvent::ChatResponse(body)
            }
            Err(BackendError::Api { body: None, .. }) => {
                TransportEvent::ChatError(chat_fault(Notice::ServerError.text(locale)))
            }
            Err(BackendError::Timeout) => {
                TransportEvent::ChatError(chat_fault(Notice::RequestTimedOut.text(locale)))
            }
            Err(BackendError::Unreachable(msg)) => {
                warn!("Backend unreachable during exchange: {}", msg);
                return Ok(Some(DisconnectReason::TransportClose));
            }
            Err(other) => {
                warn!("Chat request failed: {}", other);
                TransportEvent::ChatError(chat_fault(Notice::CommunicationError.text(locale)))
            }
        };
        self.emit(event)?;
        Ok(None)
    }
}

async fn tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn heartbeat_loss(error: &BackendError) -> DisconnectReason {
    match error {
        BackendError::Timeout => DisconnectReason::PingTimeout,
        BackendError::Api { .. } => DisconnectReason::ServerDisconnect,
        other => DisconnectReason::TransportError(other.to_string()),
    }
}
