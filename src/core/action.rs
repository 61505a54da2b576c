//! # Actions
//!
//! Everything that can happen to a chat session becomes an `Action`.
//! The transport says it connected? That's `Action::Transport(Connect)`.
//! The user pressed Enter? That's `Action::Send(text)`.
//!
//! `update()` takes the current state and one action, mutates the state,
//! and returns an `Outcome`: the events the observer must see, in order,
//! and the effects the caller must execute. No side effects here.
//!
//! ```text
//! ChatState + Action  →  update()  →  ChatState' + Outcome { events, effects }
//! ```
//!
//! The same state and the same actions always produce the same outcomes,
//! so the whole lifecycle can be replayed in a test without a transport.

use log::{debug, info, warn};
use serde_json::Value;

use crate::core::error::SessionError;
use crate::core::message::Message;
use crate::core::notices::Notice;
use crate::core::state::{ChatState, PendingExchange, SessionState};
use crate::transport::{
    ChatMessage, ChatReply, ConnectFailure, DisconnectReason, TransportEvent, chat_fault_message,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// An inbound event from the transport.
    Transport(TransportEvent),
    /// The user asked to send this text.
    Send(String),
    /// The initial-connect watchdog fired.
    WatchdogExpired,
    /// The transport refused an outbound message or its event stream ended.
    TransportClosed(String),
}

/// Work the caller performs after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Transmit(ChatMessage),
    CancelWatchdog,
    CloseTransport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub state: SessionState,
    /// Set on `Reconnecting`.
    pub attempt: Option<u32>,
    /// Set when a failure drove the change.
    pub cause: Option<SessionError>,
    /// User-readable status line; empty once connected.
    pub status: String,
}

/// What the observer is told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged(StateChange),
    Message(Message),
    /// Whether a reply is outstanding; sends are gated while true.
    Awaiting(bool),
    /// Status line update that does not change `SessionState`.
    Status(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub events: Vec<SessionEvent>,
    pub effects: Vec<Effect>,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.effects.is_empty()
    }

    /// The messages in this outcome, in order.
    pub fn messages(&self) -> Vec<&Message> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Message(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
}

/// The single dispatch function of the session state machine.
pub fn update(chat: &mut ChatState, action: Action) -> Outcome {
    let mut out = Outcome::default();
    if chat.closed {
        debug!("Session closed, ignoring {:?}", action);
        return out;
    }

    match action {
        Action::Send(text) => on_send(chat, &text, &mut out),
        Action::WatchdogExpired => on_watchdog(chat, &mut out),
        Action::TransportClosed(detail) => {
            if chat.state.is_terminal() {
                debug!("Transport closed after session failed: {}", detail);
            } else {
                warn!("Transport closed unexpectedly: {}", detail);
                fail(chat, SessionError::TransportUnavailable(detail), &mut out);
            }
        }
        Action::Transport(event) => match event {
            TransportEvent::Connect => on_connect(chat, &mut out),
            TransportEvent::Disconnect(reason) => on_disconnect(chat, &reason, &mut out),
            TransportEvent::ConnectError(failure) => on_connect_error(chat, &failure, &mut out),
            TransportEvent::ReconnectAttempt(n) => on_reconnect_attempt(chat, n, &mut out),
            TransportEvent::ReconnectFailed => on_reconnect_failed(chat, &mut out),
            TransportEvent::ChatResponse(payload) => on_chat_response(chat, &payload, &mut out),
            TransportEvent::ChatError(payload) => on_chat_error(chat, &payload, &mut out),
        },
    }

    out
}

fn transition(
    chat: &mut ChatState,
    state: SessionState,
    attempt: Option<u32>,
    cause: Option<SessionError>,
    status: String,
    out: &mut Outcome,
) {
    info!("Session state: {} -> {}", chat.state, state);
    chat.state = state;
    chat.status = status.clone();
    out.push(SessionEvent::StateChanged(StateChange {
        state,
        attempt,
        cause,
        status,
    }));
}

fn fail(chat: &mut ChatState, cause: SessionError, out: &mut Outcome) {
    if chat.pending.take().is_some() {
        debug!("Abandoning pending exchange: session failed");
        out.push(SessionEvent::Awaiting(false));
    }
    let status = chat.notice(cause.notice());
    transition(chat, SessionState::Failed, None, Some(cause), status, out);
    out.effect(Effect::CancelWatchdog);
    out.effect(Effect::CloseTransport);
}

fn on_connect(chat: &mut ChatState, out: &mut Outcome) {
    match chat.state {
        SessionState::Connected => debug!("Already connected, ignoring connect"),
        SessionState::Failed => debug!("Session failed, ignoring late connect"),
        _ => {
            chat.attempts = 0;
            transition(chat, SessionState::Connected, None, None, String::new(), out);
            out.effect(Effect::CancelWatchdog);
        }
    }
}

fn on_disconnect(chat: &mut ChatState, reason: &DisconnectReason, out: &mut Outcome) {
    if chat.state != SessionState::Connected {
        debug!("Ignoring disconnect ({}) while {}", reason, chat.state);
        return;
    }

    // No resolution message; the gate reopens and the state change says why.
    if let Some(pending) = chat.pending.take() {
        info!(
            "Abandoning pending exchange ({} chars) on disconnect",
            pending.query().len()
        );
        out.push(SessionEvent::Awaiting(false));
    }

    let status = match reason {
        DisconnectReason::ServerDisconnect => chat.notice(Notice::ServerDisconnected),
        _ => chat.notice(Notice::Disconnected),
    };
    let cause = SessionError::from_disconnect(reason);
    transition(chat, SessionState::Disconnected, None, Some(cause), status, out);
    out.effect(Effect::CancelWatchdog);
}

fn on_connect_error(chat: &mut ChatState, failure: &ConnectFailure, out: &mut Outcome) {
    match chat.state {
        SessionState::Connecting => {
            let cause = SessionError::from_connect_failure(failure);
            let status = chat.notice(Notice::ConnectionError);
            transition(chat, SessionState::Disconnected, None, Some(cause), status, out);
            out.effect(Effect::CancelWatchdog);
        }
        SessionState::Disconnected | SessionState::Reconnecting => {
            debug!("Connect error while {}: {}", chat.state, failure);
            chat.status = chat.notice(Notice::ConnectionError);
            out.push(SessionEvent::Status(chat.status.clone()));
        }
        SessionState::Connected | SessionState::Failed => {
            debug!("Ignoring connect error ({}) while {}", failure, chat.state);
        }
    }
}

fn on_reconnect_attempt(chat: &mut ChatState, n: u32, out: &mut Outcome) {
    match chat.state {
        SessionState::Connected | SessionState::Failed => {
            debug!("Ignoring reconnect attempt {} while {}", n, chat.state);
        }
        _ => {
            chat.attempts += 1;
            if chat.attempts != n {
                debug!(
                    "Transport reports attempt {}, session counted {}",
                    n, chat.attempts
                );
            }
            if chat.attempts > chat.config.max_attempts {
                warn!(
                    "Reconnect attempt {} exceeds cap of {}",
                    chat.attempts, chat.config.max_attempts
                );
                fail(chat, SessionError::ReconnectExhausted, out);
                return;
            }
            let attempt = chat.attempts;
            let status = chat.notice(Notice::Reconnecting(attempt));
            transition(chat, SessionState::Reconnecting, Some(attempt), None, status, out);
            out.effect(Effect::CancelWatchdog);
        }
    }
}

fn on_reconnect_failed(chat: &mut ChatState, out: &mut Outcome) {
    match chat.state {
        SessionState::Connected => debug!("Ignoring reconnect_failed while connected"),
        SessionState::Failed => debug!("Already failed"),
        _ => fail(chat, SessionError::ReconnectExhausted, out),
    }
}

fn on_watchdog(chat: &mut ChatState, out: &mut Outcome) {
    if chat.state == SessionState::Connecting {
        info!("Initial connection is taking longer than expected");
        chat.status = chat.notice(Notice::SlowConnection);
        out.push(SessionEvent::Status(chat.status.clone()));
    } else {
        debug!("Watchdog fired while {}, nothing to do", chat.state);
    }
}

fn on_send(chat: &mut ChatState, text: &str, out: &mut Outcome) {
    let query = text.trim();
    if query.is_empty() {
        return;
    }

    if chat.state != SessionState::Connected {
        info!("Rejecting send while {}", chat.state);
        out.push(SessionEvent::Message(Message::system(
            chat.notice(Notice::NotConnected),
        )));
        return;
    }

    if chat.pending.is_some() {
        info!("Rejecting send: a reply is still pending");
        out.push(SessionEvent::Message(Message::system(chat.notice(Notice::Busy))));
        return;
    }

    debug!("Sending query ({} chars)", query.len());
    chat.pending = Some(PendingExchange::new(query));
    out.push(SessionEvent::Message(Message::user(query)));
    out.push(SessionEvent::Awaiting(true));
    out.effect(Effect::Transmit(ChatMessage::new(query)));
}

/// Takes the pending exchange, or logs and returns `None` for an unsolicited reply.
fn resolve(chat: &mut ChatState, kind: &str, payload: &Value) -> Option<PendingExchange> {
    let pending = chat.pending.take();
    if pending.is_none() {
        warn!("Dropping {} with no pending exchange: {}", kind, payload);
    }
    pending
}

fn on_chat_response(chat: &mut ChatState, payload: &Value, out: &mut Outcome) {
    let Some(pending) = resolve(chat, "chat_response", payload) else {
        return;
    };
    debug!("Resolving exchange for {:?}", pending.query());
    out.push(SessionEvent::Awaiting(false));

    match ChatReply::parse(payload) {
        ChatReply::Answer {
            response,
            requires_auth,
        } => {
            out.push(SessionEvent::Message(Message::bot(response)));
            if requires_auth {
                out.push(SessionEvent::Message(Message::bot_info(
                    chat.notice(Notice::LoginAdvisory),
                )));
            }
        }
        ChatReply::Failure { error } => {
            info!("{}", SessionError::ApplicationError(error.clone()));
            out.push(SessionEvent::Message(Message::bot_error(error)));
        }
        ChatReply::Malformed => {
            warn!("{}", SessionError::MalformedResponse(payload.to_string()));
            out.push(SessionEvent::Message(Message::bot_error(
                chat.notice(Notice::UnexpectedResponse),
            )));
        }
    }
}

fn on_chat_error(chat: &mut ChatState, payload: &Value, out: &mut Outcome) {
    if resolve(chat, "chat_error", payload).is_none() {
        return;
    }
    out.push(SessionEvent::Awaiting(false));

    match chat_fault_message(payload) {
        Some(message) => {
            info!("{}", SessionError::ApplicationError(message.clone()));
            out.push(SessionEvent::Message(Message::bot_error(message)));
        }
        None => {
            warn!("Unknown chat_error payload: {}", payload);
            out.push(SessionEvent::Message(Message::bot_error(
                chat.notice(Notice::UnknownChatError),
            )));
        }
    }
}
