//! Charla: a terminal client for a realtime help-chat backend.
//!
//! The heart of the crate is the [`session::ChatSession`] state machine:
//! connection lifecycle, a one-at-a-time message exchange, reconnection
//! and classified status reporting.

pub mod core;
pub mod session;
pub mod transport;
pub mod tui;

#[cfg(test)]
pub mod test_support;
