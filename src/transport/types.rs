use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Wire payloads
// ============================================================================

/// Outbound `chat_message` payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub query: String,
}

impl ChatMessage {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct AnswerPayload {
    response: String,
    #[serde(default)]
    requires_auth: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct FailurePayload {
    error: String,
}

#[derive(Deserialize, Debug)]
struct FaultPayload {
    message: String,
}

/// The recognised shapes of a `chat_response` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Answer {
        response: String,
        requires_auth: bool,
    },
    Failure {
        error: String,
    },
    Malformed,
}

impl ChatReply {
    /// `response` wins over `error` when both are present.
    pub fn parse(payload: &Value) -> Self {
        if let Ok(answer) = serde_json::from_value::<AnswerPayload>(payload.clone()) {
            return ChatReply::Answer {
                response: answer.response,
                requires_auth: answer.requires_auth.as_ref().is_some_and(is_truthy),
            };
        }
        if let Ok(failure) = serde_json::from_value::<FailurePayload>(payload.clone()) {
            return ChatReply::Failure {
                error: failure.error,
            };
        }
        ChatReply::Malformed
    }
}

/// Parses a `chat_error` payload, returning its message if well formed.
pub fn chat_fault_message(payload: &Value) -> Option<String> {
    serde_json::from_value::<FaultPayload>(payload.clone())
        .ok()
        .map(|fault| fault.message)
}

/// Builds a `chat_error` payload.
pub fn chat_fault(message: impl Into<String>) -> Value {
    serde_json::json!({ "message": message.into() })
}

/// Backends are not strict about `requires_auth` being a boolean.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Transport events
// ============================================================================

/// Why an established connection went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    ServerDisconnect,
    ClientDisconnect,
    PingTimeout,
    TransportClose,
    TransportError(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ServerDisconnect => write!(f, "io server disconnect"),
            DisconnectReason::ClientDisconnect => write!(f, "io client disconnect"),
            DisconnectReason::PingTimeout => write!(f, "ping timeout"),
            DisconnectReason::TransportClose => write!(f, "transport close"),
            DisconnectReason::TransportError(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

/// Why a handshake failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectFailure {
    Timeout,
    Unreachable(String),
    /// Server answered the handshake with a 5xx status.
    Rejected(u16),
    Other(String),
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectFailure::Timeout => write!(f, "handshake timed out"),
            ConnectFailure::Unreachable(msg) => write!(f, "server unreachable: {msg}"),
            ConnectFailure::Rejected(status) => write!(f, "handshake rejected (HTTP {status})"),
            ConnectFailure::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Inbound events delivered by a transport, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connect,
    Disconnect(DisconnectReason),
    ConnectError(ConnectFailure),
    ReconnectAttempt(u32),
    ReconnectFailed,
    /// Raw `chat_response` payload; shape is checked by the session.
    ChatResponse(Value),
    /// Raw `chat_error` payload.
    ChatError(Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_answer() {
        let reply = ChatReply::parse(&json!({"response": "hola", "sources": []}));
        assert_eq!(
            reply,
            ChatReply::Answer {
                response: "hola".to_string(),
                requires_auth: false
            }
        );
    }

    #[test]
    fn test_parse_answer_requiring_auth() {
        let reply = ChatReply::parse(&json!({"response": "ok", "requires_auth": true}));
        assert_eq!(
            reply,
            ChatReply::Answer {
                response: "ok".to_string(),
                requires_auth: true
            }
        );
    }

    #[test]
    fn test_requires_auth_uses_truthiness() {
        let falsy = ChatReply::parse(&json!({"response": "ok", "requires_auth": 0}));
        assert!(matches!(falsy, ChatReply::Answer { requires_auth: false, .. }));
        let truthy = ChatReply::parse(&json!({"response": "ok", "requires_auth": "yes"}));
        assert!(matches!(truthy, ChatReply::Answer { requires_auth: true, .. }));
        let null = ChatReply::parse(&json!({"response": "ok", "requires_auth": null}));
        assert!(matches!(null, ChatReply::Answer { requires_auth: false, .. }));
    }

    #[test]
    fn test_parse_failure() {
        let reply = ChatReply::parse(&json!({"error": "Pregunta vacía"}));
        assert_eq!(
            reply,
            ChatReply::Failure {
                error: "Pregunta vacía".to_string()
            }
        );
    }

    #[test]
    fn test_parse_malformed_shapes() {
        assert_eq!(ChatReply::parse(&json!({"response": 42})), ChatReply::Malformed);
        assert_eq!(ChatReply::parse(&json!({"answer": "x"})), ChatReply::Malformed);
        assert_eq!(ChatReply::parse(&json!(null)), ChatReply::Malformed);
        assert_eq!(ChatReply::parse(&json!("plain text")), ChatReply::Malformed);
    }

    #[test]
    fn test_chat_fault_message() {
        assert_eq!(
            chat_fault_message(&json!({"message": "boom"})),
            Some("boom".to_string())
        );
        assert_eq!(chat_fault_message(&json!({"msg": "boom"})), None);
        assert_eq!(chat_fault_message(&chat_fault("x")), Some("x".to_string()));
    }

    #[test]
    fn test_chat_message_serializes_query() {
        let json = serde_json::to_value(ChatMessage::new("hola")).unwrap();
        assert_eq!(json, json!({"query": "hola"}));
    }
}
