//! # Core Session Logic
//!
//! This module contains the chat session's state machine.
//! It knows nothing about any specific transport or UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (ChatState)    │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Session   │      │    TUI     │      │   Tests    │
//!     │   shell    │      │  Adapter   │      │  (replay)  │
//!     │  (tokio)   │      │ (ratatui)  │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `ChatState`, the lifecycle state and the pending exchange
//! - [`action`]: `Action`, `SessionEvent` and the `update()` reducer
//! - [`message`]: conversation lines and their origins
//! - [`notices`]: localized status and system text
//! - [`error`]: the session failure taxonomy
//! - [`config`]: file, env and CLI configuration

pub mod action;
pub mod config;
pub mod error;
pub mod message;
pub mod notices;
pub mod state;

pub use action::{Action, Effect, Outcome, SessionEvent, StateChange, update};
pub use error::SessionError;
pub use message::{Message, Origin};
pub use notices::{Locale, Notice};
pub use state::{ChatState, PendingExchange, SessionConfig, SessionState};
