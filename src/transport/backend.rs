use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::types::{ChatMessage, ConnectFailure};

/// Errors returned when handing a message to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport was closed or its driver has stopped.
    Closed,
    /// The transport could not be built at all.
    Unavailable(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::Unavailable(msg) => write!(f, "transport unavailable: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// The outbound half of a realtime channel, as seen by a `ChatSession`.
///
/// Inbound traffic does not go through this trait: a transport delivers
/// `TransportEvent`s on the channel it was created with.
pub trait Transport: Send {
    /// Queue one `chat_message`. Must return without waiting on the network.
    fn emit(&mut self, message: ChatMessage) -> Result<(), TransportError>;

    /// Stop the transport. Idempotent.
    fn close(&mut self);
}

/// Errors that can occur when talking to the chat backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Backend misconfigured (bad URL). Not retryable.
    Config(String),
    /// No answer within the configured timeout.
    Timeout,
    /// Connection refused or reset before any response.
    Unreachable(String),
    /// Backend answered with a non-success status. `body` is set when it was JSON.
    Api { status: u16, body: Option<Value> },
    /// Any other request failure.
    Network(String),
    /// Success status but the body was not JSON.
    Parse(String),
}

impl BackendError {
    pub fn as_connect_failure(&self) -> ConnectFailure {
        match self {
            BackendError::Timeout => ConnectFailure::Timeout,
            BackendError::Unreachable(msg) => ConnectFailure::Unreachable(msg.clone()),
            BackendError::Api { status, .. } => ConnectFailure::Rejected(*status),
            other => ConnectFailure::Other(other.to_string()),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "config error: {msg}"),
            BackendError::Timeout => write!(f, "request timed out"),
            BackendError::Unreachable(msg) => write!(f, "backend unreachable: {msg}"),
            BackendError::Api { status, body } => match body {
                Some(body) => write!(f, "API error (HTTP {status}): {body}"),
                None => write!(f, "API error (HTTP {status})"),
            },
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// The remote conversational backend a transport talks to.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend, for logs.
    fn name(&self) -> &str;

    /// Checks that the backend is reachable. Used for connect and heartbeat.
    async fn handshake(&self) -> Result<(), BackendError>;

    /// Sends one query and returns the JSON reply body.
    async fn ask(&self, message: &ChatMessage) -> Result<Value, BackendError>;
}
