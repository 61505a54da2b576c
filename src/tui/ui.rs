use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::notices::Notice;
use crate::core::state::SessionState;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::input_box::HEIGHT as INPUT_HEIGHT;
use crate::tui::components::{MessageList, TitleBar};

pub fn draw_ui(frame: &mut Frame, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(INPUT_HEIGHT)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    let typing = tui
        .awaiting
        .then(|| Notice::Typing.text(tui.locale));
    MessageList::new(
        &mut tui.message_list,
        &tui.messages,
        typing.as_deref(),
        spinner_frame,
    )
    .render(frame, main_area);

    TitleBar::new(
        tui.state,
        tui.status.clone(),
        tui.message_list.has_unseen_content(),
    )
    .render(frame, title_area);

    tui.input_box.enabled = tui.input_enabled();
    tui.input_box.title = input_title(tui);
    tui.input_box.render(frame, input_area);
}

fn input_title(tui: &TuiState) -> String {
    match tui.state {
        SessionState::Connected if tui.awaiting => Notice::Busy.text(tui.locale),
        SessionState::Connected => "Message (Enter to send, Esc to quit)".to_string(),
        SessionState::Failed => "Disconnected (Esc to quit)".to_string(),
        _ => Notice::NotConnected.text(tui.locale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{SessionEvent, StateChange};
    use crate::core::message::Message;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(tui: &mut TuiState) -> String {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw_ui(f, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn connected() -> SessionEvent {
        SessionEvent::StateChanged(StateChange {
            state: SessionState::Connected,
            attempt: None,
            cause: None,
            status: String::new(),
        })
    }

    #[test]
    fn test_draw_ui_connecting() {
        let mut tui = TuiState::default();
        let text = screen(&mut tui);
        assert!(text.contains("connecting"));
        assert!(!tui.input_box.enabled);
    }

    #[test]
    fn test_draw_ui_awaiting_shows_typing_and_gates_input() {
        let mut tui = TuiState::default();
        tui.apply(connected());
        tui.apply(SessionEvent::Message(Message::user("hola")));
        tui.apply(SessionEvent::Awaiting(true));

        let text = screen(&mut tui);
        assert!(text.contains("hola"));
        assert!(text.contains("The assistant is typing..."));
        assert!(text.contains("Please wait for the assistant to reply."));
        assert!(!tui.input_box.enabled);
    }

    #[test]
    fn test_draw_ui_connected_idle_enables_input() {
        let mut tui = TuiState::default();
        tui.apply(connected());
        let text = screen(&mut tui);
        assert!(text.contains("Enter to send"));
        assert!(tui.input_box.enabled);
    }
}
