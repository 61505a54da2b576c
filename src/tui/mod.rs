//! # TUI Adapter
//!
//! The ratatui-specific layer. Renders what a chat session reports and
//! turns key presses into session commands.
//!
//! The session runs on its own tokio task and reports through a
//! `std::sync::mpsc` channel; this loop drains it between frames.
//!
//! ```text
//!   keyboard ──► InputBox ──Submit──► SessionHandle::send()
//!                                          │
//!   draw ◄── TuiState::apply() ◄── SessionEvent (mpsc) ◄── ChatSession
//! ```
//!
//! ## Redraw Strategy
//!
//! - **Awaiting** a reply: draws every ~120ms to animate the typing indicator.
//! - **Idle**: sleeps up to 500ms, only redraws on events or terminal resize.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;

use crate::core::action::{SessionEvent, StateChange};
use crate::core::config::ResolvedConfig;
use crate::core::message::Message;
use crate::core::notices::{Locale, Notice};
use crate::core::state::SessionState;
use crate::session::{self, SessionHandle};
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// What the terminal shows: the observer-side mirror of a session,
/// plus presentation state.
pub struct TuiState {
    pub state: SessionState,
    pub status: String,
    pub awaiting: bool,
    pub messages: Vec<Message>,
    pub locale: Locale,
    pub message_list: MessageListState,
    pub input_box: InputBox,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl TuiState {
    pub fn new(locale: Locale) -> Self {
        Self {
            state: SessionState::Connecting,
            status: Notice::Connecting.text(locale),
            awaiting: false,
            messages: Vec::new(),
            locale,
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
        }
    }

    /// Folds one session event into the view.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged(change) => {
                self.state = change.state;
                self.status = change.status;
            }
            SessionEvent::Message(message) => self.messages.push(message),
            SessionEvent::Awaiting(awaiting) => self.awaiting = awaiting,
            SessionEvent::Status(status) => self.status = status,
        }
    }

    pub fn input_enabled(&self) -> bool {
        self.state == SessionState::Connected && !self.awaiting
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        info!("Terminal modes enabled (mouse, bracketed paste)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

/// Runs the terminal client until the user quits.
///
/// Must be called from within a tokio runtime; the session runs on it.
pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut tui = TuiState::new(config.locale);
    let (tx, rx) = mpsc::channel();

    let handle: Option<SessionHandle> = match session::connect(&config, tx) {
        Ok(handle) => {
            info!("Session {} started", handle.id());
            Some(handle)
        }
        Err(e) => {
            warn!("Could not start session: {}", e);
            tui.apply(SessionEvent::StateChanged(StateChange {
                state: SessionState::Failed,
                attempt: None,
                status: e.notice().text(config.locale),
                cause: Some(e),
            }));
            None
        }
    };

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = Instant::now();
    let mut needs_redraw = true;

    loop {
        if tui.awaiting {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_millis() / 300) as usize;
            terminal.draw(|f| ui::draw_ui(f, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if tui.awaiting {
            Duration::from_millis(120)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::Quit => should_quit = true,
                TuiEvent::Resize => {}
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown
                | TuiEvent::ScrollToBottom => {
                    tui.message_list.handle_event(&event);
                }
                _ => {
                    tui.input_box.enabled = tui.input_enabled();
                    if let Some(InputEvent::Submit(text)) = tui.input_box.handle_event(&event) {
                        match &handle {
                            Some(handle) => {
                                tui.message_list.stick_to_bottom = true;
                                handle.send(text);
                            }
                            None => debug!("No session; dropping submit"),
                        }
                    }
                }
            }
        }

        if should_quit {
            break;
        }

        while let Ok(event) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", event);
            tui.apply(event);
        }
    }

    if let Some(handle) = handle {
        info!("Closing session {}", handle.id());
        handle.close();
    }

    ratatui::restore();
    Ok(())
}
