//! # Session State
//!
//! Everything the chat session knows, in one place. No I/O here.
//!
//! ```text
//! ChatState
//! ├── state: SessionState              // connection lifecycle
//! ├── pending: Option<PendingExchange> // the one in-flight request
//! ├── attempts: u32                    // reconnects since last connect
//! ├── status: String                   // classified status line
//! ├── config: SessionConfig            // attempt cap, locale, watchdog
//! └── closed: bool                     // torn down, ignore everything
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::fmt;
use std::time::Duration;

use crate::core::notices::{Locale, Notice};
use crate::transport::policy::DEFAULT_MAX_ATTEMPTS;

pub const DEFAULT_INITIAL_TIMEOUT_MS: u64 = 7000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
    /// Terminal. A new session must be built to try again.
    Failed,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Disconnected => "disconnected",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Failed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The request awaiting its single reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    query: String,
}

impl PendingExchange {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Reconnect attempts tolerated before the session fails on its own.
    pub max_attempts: u32,
    /// How long to wait for the first connect before showing a warning.
    pub initial_timeout: Duration,
    pub locale: Locale,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_timeout: Duration::from_millis(DEFAULT_INITIAL_TIMEOUT_MS),
            locale: Locale::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatState {
    pub(crate) state: SessionState,
    pub(crate) pending: Option<PendingExchange>,
    pub(crate) attempts: u32,
    pub(crate) status: String,
    pub(crate) config: SessionConfig,
    pub(crate) closed: bool,
}

impl ChatState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::Connecting,
            pending: None,
            attempts: 0,
            status: Notice::Connecting.text(config.locale),
            config,
            closed: false,
        }
    }

    /// Builds a state already sitting in `state`, for transition tables.
    #[cfg(test)]
    pub fn in_state(config: SessionConfig, state: SessionState) -> Self {
        Self {
            state,
            ..Self::new(config)
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingExchange> {
        self.pending.as_ref()
    }

    pub fn is_awaiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Sends are accepted only while connected with nothing in flight.
    pub fn input_enabled(&self) -> bool {
        !self.closed && self.state == SessionState::Connected && self.pending.is_none()
    }

    pub(crate) fn notice(&self, notice: Notice) -> String {
        notice.text(self.config.locale)
    }
}
