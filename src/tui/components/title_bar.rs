//! # TitleBar Component
//!
//! Top status bar: connection state, the classified status line, and a
//! "↓ New" marker when messages arrived below the scroll position.
//!
//! Stateless; every field is a prop.
//!
//! ```text
//! Charla ● connected
//! Charla ● reconnecting | Trying to reconnect (2)...
//! Charla ● connected | ↓ New
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::state::SessionState;
use crate::tui::component::Component;

pub struct TitleBar {
    pub state: SessionState,
    pub status: String,
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(state: SessionState, status: impl Into<String>, has_unseen_content: bool) -> Self {
        Self {
            state,
            status: status.into(),
            has_unseen_content,
        }
    }

    pub fn line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("Charla ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("● {}", self.state.label()),
                Style::default().fg(state_color(self.state)),
            ),
        ];
        if !self.status.is_empty() {
            spans.push(Span::raw(format!(" | {}", self.status)));
        }
        if self.has_unseen_content {
            spans.push(Span::styled(" | ↓ New", Style::default().fg(Color::Cyan)));
        }
        Line::from(spans)
    }
}

pub fn state_color(state: SessionState) -> Color {
    match state {
        SessionState::Connected => Color::Green,
        SessionState::Connecting | SessionState::Reconnecting => Color::Yellow,
        SessionState::Disconnected | SessionState::Failed => Color::Red,
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}
