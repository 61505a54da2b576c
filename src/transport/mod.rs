//! # Transport
//!
//! The realtime channel underneath a chat session. A transport takes
//! outbound `chat_message`s through the [`Transport`] trait and delivers
//! everything that happens to it as [`TransportEvent`]s on a channel.
//!
//! ```text
//!   ChatSession ──emit()──► Transport ──► backend
//!        ▲                      │
//!        └──── TransportEvent ◄─┘  (connect, disconnect, reconnect_*,
//!                                    chat_response, chat_error)
//! ```
//!
//! ## Modules
//!
//! - [`types`]: wire payloads and the event vocabulary
//! - [`backend`]: the `Transport` and `ChatBackend` traits
//! - [`policy`]: reconnection attempts, delay and backoff
//! - [`http`]: the HTTP backend and its connection driver

pub mod backend;
pub mod http;
pub mod policy;
pub mod types;

pub use backend::{BackendError, ChatBackend, Transport, TransportError};
pub use http::{HttpBackend, HttpBackendConfig, HttpTransport, TransportSettings};
pub use policy::{Backoff, ReconnectPolicy};
pub use types::{
    ChatMessage, ChatReply, ConnectFailure, DisconnectReason, TransportEvent, chat_fault,
    chat_fault_message,
};
