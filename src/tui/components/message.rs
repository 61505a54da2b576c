use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::{Message, Origin};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Renders one conversation line in a bordered card styled by its origin.
///
/// Created fresh each frame by `MessageList`.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    pub message: &'a Message,
}

impl<'a> MessageView<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self { message }
    }

    /// Predicts rendered height without rendering.
    ///
    /// The textwrap options must match ratatui's `Paragraph` wrapping so the
    /// prediction and the rendered height agree.
    pub fn calculate_height(message: &Message, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }

        let content = message.text().trim();
        if content.is_empty() {
            return VERTICAL_OVERHEAD;
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(content, options);
        (lines.len() as u16).max(1) + VERTICAL_OVERHEAD
    }
}

pub fn origin_title(origin: Origin) -> &'static str {
    match origin {
        Origin::User => "you",
        Origin::Bot => "assistant",
        Origin::BotError => "error",
        Origin::BotInfo => "info",
        Origin::System => "system",
    }
}

pub fn origin_style(origin: Origin) -> Style {
    match origin {
        Origin::User => Style::default().fg(Color::Green),
        Origin::Bot => Style::default().fg(Color::Blue),
        Origin::BotError => Style::default().fg(Color::Red),
        Origin::BotInfo => Style::default().fg(Color::Yellow),
        Origin::System => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    }
}

impl<'a> Widget for MessageView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let origin = self.message.origin();
        let style = origin_style(origin);
        let border_style = style.add_modifier(Modifier::DIM);

        let block = Block::bordered()
            .title(origin_title(origin))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.message.text().trim())
            .style(style)
            .wrap(Wrap { trim: true })
            .render(inner_area, buf);
    }
}

impl<'a> Component for MessageView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    // ==========================================================================
    // calculate_height
    // ==========================================================================

    #[test]
    fn calculate_height_empty_content_returns_border_height() {
        let message = Message::bot("   \n\t ");
        assert_eq!(MessageView::calculate_height(&message, 80), VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_too_narrow_returns_minimum() {
        let message = Message::user("Hello world");
        assert_eq!(MessageView::calculate_height(&message, HORIZONTAL_OVERHEAD), 1);
    }

    #[test]
    fn calculate_height_wraps_at_width_boundary() {
        // width 9 → content width 5: "Hello" | "world"
        let message = Message::user("Hello world");
        assert_eq!(
            MessageView::calculate_height(&message, 9),
            2 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_breaks_long_words() {
        // width 8 → content width 4: "abcd" | "efgh" | "ij"
        let message = Message::bot("abcdefghij");
        assert_eq!(
            MessageView::calculate_height(&message, 8),
            3 + VERTICAL_OVERHEAD
        );
    }

    // ==========================================================================
    // Styling
    // ==========================================================================

    #[test]
    fn every_origin_has_distinct_title() {
        let origins = [
            Origin::User,
            Origin::Bot,
            Origin::BotError,
            Origin::BotInfo,
            Origin::System,
        ];
        let titles: std::collections::HashSet<_> =
            origins.iter().map(|o| origin_title(*o)).collect();
        assert_eq!(titles.len(), origins.len());
    }

    #[test]
    fn bot_error_is_red() {
        assert_eq!(origin_style(Origin::BotError).fg, Some(Color::Red));
    }

    #[test]
    fn render_shows_title_and_text() {
        let backend = TestBackend::new(30, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let message = Message::bot_error("boom");
        terminal
            .draw(|f| f.render_widget(MessageView::new(&message), f.area()))
            .unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("error"));
        assert!(text.contains("boom"));
    }
}
