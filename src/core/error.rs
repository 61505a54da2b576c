use std::fmt;

use crate::core::notices::Notice;
use crate::transport::{ConnectFailure, DisconnectReason};

/// Failure taxonomy for a chat session.
///
/// Transport-level variants drive `SessionState`; application-level
/// variants (`MalformedResponse`, `ApplicationError`) only resolve the
/// pending exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No usable transport (bad URL, driver task gone).
    TransportUnavailable(String),
    ConnectionTimeout,
    /// Transport-level failure while connecting or connected.
    ConnectionError(String),
    ServerDisconnect,
    ReconnectExhausted,
    /// Reply matched neither known shape. Carries the raw payload.
    MalformedResponse(String),
    /// Explicit error payload from the peer.
    ApplicationError(String),
}

impl SessionError {
    pub fn from_disconnect(reason: &DisconnectReason) -> Self {
        match reason {
            DisconnectReason::ServerDisconnect => SessionError::ServerDisconnect,
            DisconnectReason::PingTimeout => SessionError::ConnectionTimeout,
            other => SessionError::ConnectionError(other.to_string()),
        }
    }

    pub fn from_connect_failure(failure: &ConnectFailure) -> Self {
        match failure {
            ConnectFailure::Timeout => SessionError::ConnectionTimeout,
            other => SessionError::ConnectionError(other.to_string()),
        }
    }

    /// The status line shown when this error drives a state change.
    pub fn notice(&self) -> Notice {
        match self {
            SessionError::TransportUnavailable(_) => Notice::TransportUnavailable,
            SessionError::ConnectionTimeout => Notice::ConnectionTimeout,
            SessionError::ConnectionError(_) => Notice::ConnectionError,
            SessionError::ServerDisconnect => Notice::ServerDisconnected,
            SessionError::ReconnectExhausted => Notice::ReconnectFailed,
            SessionError::MalformedResponse(_) => Notice::UnexpectedResponse,
            SessionError::ApplicationError(_) => Notice::UnknownChatError,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::TransportUnavailable(msg) => write!(f, "transport unavailable: {msg}"),
            SessionError::ConnectionTimeout => write!(f, "connection timed out"),
            SessionError::ConnectionError(msg) => write!(f, "connection error: {msg}"),
            SessionError::ServerDisconnect => write!(f, "disconnected by server"),
            SessionError::ReconnectExhausted => write!(f, "reconnection attempts exhausted"),
            SessionError::MalformedResponse(raw) => write!(f, "malformed response: {raw}"),
            SessionError::ApplicationError(msg) => write!(f, "application error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_reasons_are_classified() {
        assert_eq!(
            SessionError::from_disconnect(&DisconnectReason::ServerDisconnect),
            SessionError::ServerDisconnect
        );
        assert_eq!(
            SessionError::from_disconnect(&DisconnectReason::PingTimeout),
            SessionError::ConnectionTimeout
        );
        assert!(matches!(
            SessionError::from_disconnect(&DisconnectReason::TransportClose),
            SessionError::ConnectionError(_)
        ));
    }

    #[test]
    fn test_connect_timeout_is_classified_as_timeout() {
        assert_eq!(
            SessionError::from_connect_failure(&ConnectFailure::Timeout),
            SessionError::ConnectionTimeout
        );
        assert!(matches!(
            SessionError::from_connect_failure(&ConnectFailure::Rejected(502)),
            SessionError::ConnectionError(_)
        ));
    }
}
