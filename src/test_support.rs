//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use tokio::sync::mpsc;

use crate::core::action::SessionEvent;
use crate::core::state::SessionConfig;
use crate::session::ChatSession;
use crate::transport::{ChatMessage, Transport, TransportError, TransportEvent};

/// A transport that records what it is asked to send.
#[derive(Debug, Default)]
pub struct FakeTransport {
    sent: Vec<ChatMessage>,
    closed: bool,
    refuse: bool,
}

impl FakeTransport {
    /// A transport whose driver is already gone.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Default::default()
        }
    }

    pub fn sent_queries(&self) -> Vec<&str> {
        self.sent.iter().map(|m| m.query.as_str()).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for FakeTransport {
    fn emit(&mut self, message: ChatMessage) -> Result<(), TransportError> {
        if self.refuse || self.closed {
            return Err(TransportError::Closed);
        }
        self.sent.push(message);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// A session over `transport` that records every event it reports.
///
/// Returns the sender half of the transport event channel so tests can
/// feed events into `run()`; dropping it ends the event stream.
pub fn session_with(
    transport: FakeTransport,
) -> (
    ChatSession<FakeTransport, Vec<SessionEvent>>,
    mpsc::UnboundedSender<TransportEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = ChatSession::new(transport, rx, Vec::new(), SessionConfig::default());
    (session, tx)
}
