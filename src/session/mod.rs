//! # Chat Session
//!
//! The owned, single-threaded shell around `core::update()`. A
//! `ChatSession` holds the state, the transport, the watchdog and the
//! observer, and processes one input at a time:
//!
//! ```text
//!   TransportEvent ─┐
//!   watchdog expiry ─┼──► dispatch(Action) ──► update() ──► observer.notify(..)
//!   Command (UI)   ─┘                                  └──► effects (emit, cancel, close)
//! ```
//!
//! Several sessions can live side by side; nothing here is global.

mod observer;
mod watchdog;

pub use observer::SessionObserver;
pub use watchdog::Watchdog;

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::action::{Action, Effect, SessionEvent, StateChange, update};
use crate::core::config::ResolvedConfig;
use crate::core::error::SessionError;
use crate::core::state::{ChatState, SessionConfig, SessionState};
use crate::transport::{HttpBackend, HttpTransport, Transport, TransportEvent};

/// Requests from the UI side of a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Close,
}

pub struct ChatSession<T: Transport, O: SessionObserver> {
    id: Uuid,
    chat: ChatState,
    transport: T,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    events_open: bool,
    observer: O,
    watchdog: Watchdog,
}

impl<T: Transport, O: SessionObserver> ChatSession<T, O> {
    /// Creates a session in `Connecting` and arms the initial-connect watchdog.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        transport: T,
        events: mpsc::UnboundedReceiver<TransportEvent>,
        observer: O,
        config: SessionConfig,
    ) -> Self {
        let id = Uuid::new_v4();
        let chat = ChatState::new(config);
        let mut session = Self {
            id,
            chat,
            transport,
            events,
            events_open: true,
            observer,
            watchdog: Watchdog::default(),
        };

        info!("Session {} created", id);
        let initial = SessionEvent::StateChanged(StateChange {
            state: SessionState::Connecting,
            attempt: None,
            cause: None,
            status: session.chat.status().to_string(),
        });
        session.observer.notify(initial);
        session.watchdog.arm(session.chat.config().initial_timeout);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &ChatState {
        &self.chat
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn watchdog_armed(&self) -> bool {
        self.watchdog.is_armed()
    }

    /// Runs one action through the reducer, notifies, then executes effects.
    pub fn dispatch(&mut self, action: Action) {
        let outcome = update(&mut self.chat, action);
        for event in outcome.events {
            self.observer.notify(event);
        }
        for effect in outcome.effects {
            self.execute(effect);
        }
    }

    pub fn send(&mut self, text: impl Into<String>) {
        self.dispatch(Action::Send(text.into()));
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        self.dispatch(Action::Transport(event));
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Transmit(message) => {
                if let Err(e) = self.transport.emit(message) {
                    warn!("Session {}: transport refused message: {}", self.id, e);
                    self.dispatch(Action::TransportClosed(e.to_string()));
                }
            }
            Effect::CancelWatchdog => self.watchdog.cancel(),
            Effect::CloseTransport => {
                info!("Session {}: closing transport", self.id);
                self.transport.close();
            }
        }
    }

    /// Processes transport events, watchdog expiry and commands until closed.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!("Session {} running", self.id);
        while !self.chat.is_closed() {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send(text)) => self.send(text),
                    Some(Command::Close) | None => self.shutdown(),
                },
                event = self.events.recv(), if self.events_open => match event {
                    Some(event) => self.handle_transport_event(event),
                    None => {
                        self.events_open = false;
                        debug!("Session {}: transport event stream ended", self.id);
                        if !self.chat.state().is_terminal() {
                            self.dispatch(Action::TransportClosed(
                                "transport event stream ended".to_string(),
                            ));
                        }
                    }
                },
                () = self.watchdog.expired() => self.dispatch(Action::WatchdogExpired),
            }
        }
        info!("Session {} stopped in state {}", self.id, self.chat.state());
    }

    /// Stops the session. Idempotent; later actions are ignored.
    pub fn shutdown(&mut self) {
        if self.chat.closed {
            return;
        }
        info!("Session {} shutting down", self.id);
        self.chat.closed = true;
        self.chat.pending = None;
        self.watchdog.cancel();
        self.transport.close();
        self.events.close();
    }
}

impl<T: Transport, O: SessionObserver> Drop for ChatSession<T, O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Handle
// ============================================================================

/// A session running on its own task.
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queues a send. Rejections (not connected, busy) arrive as observer messages.
    pub fn send(&self, text: impl Into<String>) {
        if self.commands.send(Command::Send(text.into())).is_err() {
            debug!("Session {} already stopped; send ignored", self.id);
        }
    }

    pub fn close(&self) {
        if self.commands.send(Command::Close).is_err() {
            debug!("Session {} already stopped; close ignored", self.id);
        }
    }

    /// Closes the session and waits for its task to finish.
    pub async fn shutdown(self) {
        self.close();
        if let Err(e) = self.task.await {
            warn!("Session {} task ended abnormally: {}", self.id, e);
        }
    }
}

/// Builds the HTTP transport for `config` and starts a session on a new task.
///
/// Must be called inside a tokio runtime.
pub fn connect<O>(config: &ResolvedConfig, observer: O) -> Result<SessionHandle, SessionError>
where
    O: SessionObserver + Send + 'static,
{
    let backend = HttpBackend::new(&config.backend_config())
        .map_err(|e| SessionError::TransportUnavailable(e.to_string()))?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let transport = HttpTransport::spawn(Arc::new(backend), config.transport_settings(), event_tx);
    let mut session = ChatSession::new(transport, event_rx, observer, config.session_config());
    let id = session.id();

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        session.run(command_rx).await;
    });

    info!("Session {} connecting to {}", id, config.url);
    Ok(SessionHandle {
        id,
        commands: command_tx,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::core::message::{Message, Origin};
    use crate::test_support::{FakeTransport, session_with};
    use crate::transport::DisconnectReason;

    fn messages(events: &[SessionEvent]) -> Vec<&Message> {
        events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Message(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn states(events: &[SessionEvent]) -> Vec<SessionState> {
        events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::StateChanged(change) => Some(change.state),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_new_session_announces_connecting_and_arms_watchdog() {
        let (session, _events) = session_with(FakeTransport::default());
        assert_eq!(states(session.observer()), vec![SessionState::Connecting]);
        assert!(session.watchdog_armed());
        assert!(!session.state().input_enabled());
    }

    #[tokio::test]
    async fn test_connect_cancels_watchdog() {
        let (mut session, _events) = session_with(FakeTransport::default());
        session.handle_transport_event(TransportEvent::Connect);
        assert!(!session.watchdog_armed());
        assert_eq!(session.state().state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_round_trip_reaches_transport_and_observer() {
        let (mut session, _events) = session_with(FakeTransport::default());
        session.handle_transport_event(TransportEvent::Connect);
        session.send("hola");
        assert_eq!(session.transport().sent_queries(), vec!["hola"]);

        session.handle_transport_event(TransportEvent::ChatResponse(
            json!({"response": "hola de vuelta"}),
        ));
        let shown = messages(session.observer());
        assert_eq!(shown, vec![&Message::user("hola"), &Message::bot("hola de vuelta")]);
        assert!(session.state().input_enabled());
    }

    #[tokio::test]
    async fn test_only_one_message_in_flight() {
        let (mut session, _events) = session_with(FakeTransport::default());
        session.handle_transport_event(TransportEvent::Connect);
        session.send("one");
        session.send("two");
        assert_eq!(session.transport().sent_queries(), vec!["one"]);
        let last = *messages(session.observer()).last().unwrap();
        assert_eq!(last.origin(), Origin::System);
    }

    #[tokio::test]
    async fn test_refused_emit_fails_session() {
        let (mut session, _events) = session_with(FakeTransport::refusing());
        session.handle_transport_event(TransportEvent::Connect);
        session.send("hola");

        assert_eq!(session.state().state(), SessionState::Failed);
        assert!(!session.state().is_awaiting());
        assert_eq!(last_awaiting(session.observer()), Some(false));
        let cause = session.observer().iter().rev().find_map(|event| match event {
            SessionEvent::StateChanged(change) => change.cause.clone(),
            _ => None,
        });
        assert!(matches!(cause, Some(SessionError::TransportUnavailable(_))));
    }

    fn last_awaiting(events: &[SessionEvent]) -> Option<bool> {
        events.iter().rev().find_map(|event| match event {
            SessionEvent::Awaiting(awaiting) => Some(*awaiting),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_observer_gate_reopens_after_reconnect() {
        let (mut session, _events) = session_with(FakeTransport::default());
        session.handle_transport_event(TransportEvent::Connect);
        session.send("hola");
        assert_eq!(last_awaiting(session.observer()), Some(true));

        session.handle_transport_event(TransportEvent::Disconnect(
            DisconnectReason::TransportClose,
        ));
        session.handle_transport_event(TransportEvent::ReconnectAttempt(1));
        session.handle_transport_event(TransportEvent::Connect);

        assert!(session.state().input_enabled());
        assert_eq!(last_awaiting(session.observer()), Some(false));
        assert_eq!(messages(session.observer()), vec![&Message::user("hola")]);
    }

    #[tokio::test]
    async fn test_reconnect_exhaustion_closes_transport() {
        let (mut session, _events) = session_with(FakeTransport::default());
        session.handle_transport_event(TransportEvent::ConnectError(
            crate::transport::ConnectFailure::Timeout,
        ));
        for n in 1..=6 {
            session.handle_transport_event(TransportEvent::ReconnectAttempt(n));
        }
        assert_eq!(session.state().state(), SessionState::Failed);
        assert!(session.transport().is_closed());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_silences_session() {
        let (mut session, _events) = session_with(FakeTransport::default());
        session.handle_transport_event(TransportEvent::Connect);
        let seen = session.observer().len();

        session.shutdown();
        session.shutdown();
        assert!(session.transport().is_closed());
        assert!(!session.watchdog_armed());

        session.send("hola");
        session.handle_transport_event(TransportEvent::Disconnect(
            DisconnectReason::ServerDisconnect,
        ));
        assert_eq!(session.observer().len(), seen);
        assert!(session.transport().sent_queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_fires_status_while_connecting() {
        let (mut session, _events) = session_with(FakeTransport::default());
        let (commands, command_rx) = mpsc::unbounded_channel();

        let run = async {
            tokio::time::sleep(Duration::from_millis(7001)).await;
            let _ = commands.send(Command::Close);
        };
        tokio::join!(session.run(command_rx), run);

        assert_eq!(session.state().state(), SessionState::Connecting);
        assert!(session.observer().contains(&SessionEvent::Status(
            "The connection is taking a while. Check the server or try reloading.".into()
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_silent_after_connect() {
        let (mut session, events) = session_with(FakeTransport::default());
        let (commands, command_rx) = mpsc::unbounded_channel();

        events.send(TransportEvent::Connect).unwrap();
        let run = async {
            tokio::time::sleep(Duration::from_millis(10_000)).await;
            let _ = commands.send(Command::Close);
        };
        tokio::join!(session.run(command_rx), run);

        assert!(
            !session
                .observer()
                .iter()
                .any(|event| matches!(event, SessionEvent::Status(_)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_event_stream_fails_session() {
        let (mut session, events) = session_with(FakeTransport::default());
        let (_commands, command_rx) = mpsc::unbounded_channel();
        events.send(TransportEvent::Connect).unwrap();
        drop(events);

        let run = tokio::time::timeout(Duration::from_secs(1), session.run(command_rx));
        // The loop keeps serving commands after failing; it only ends on Close.
        assert!(run.await.is_err());
        assert_eq!(session.state().state(), SessionState::Failed);
        assert_eq!(
            states(session.observer()),
            vec![
                SessionState::Connecting,
                SessionState::Connected,
                SessionState::Failed
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_command_sender_stops_run() {
        let (mut session, _events) = session_with(FakeTransport::default());
        let (commands, command_rx) = mpsc::unbounded_channel::<Command>();
        drop(commands);
        session.run(command_rx).await;
        assert!(session.state().is_closed());
        assert!(session.transport().is_closed());
    }

    #[tokio::test]
    async fn test_handle_on_stopped_session_is_harmless() {
        let (commands, command_rx) = mpsc::unbounded_channel();
        drop(command_rx);
        let handle = SessionHandle {
            id: Uuid::new_v4(),
            commands,
            task: tokio::spawn(async {}),
        };
        handle.send("hola");
        handle.close();
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_connect_rejects_unusable_url() {
        let mut config = crate::core::config::resolve_with(
            &Default::default(),
            &Default::default(),
            &Default::default(),
        )
        .unwrap();
        config.url = "not a url".to_string();
        let result = connect(&config, Vec::new());
        assert!(matches!(result, Err(SessionError::TransportUnavailable(_))));
    }
}
