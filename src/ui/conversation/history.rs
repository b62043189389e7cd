//! Conversation history display component

use crate::conversation::Message;
use crate::events::Sender;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};

/// Scroll state for the message list.
///
/// Offsets count lines up from the bottom, so `0` always shows the newest message.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    scroll_from_bottom: usize,
    seen_revision: u64,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snap back to the newest message whenever the store has changed
    pub fn sync(&mut self, revision: u64) {
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    #[allow(dead_code)]
    pub fn scroll_from_bottom(&self) -> usize {
        self.scroll_from_bottom
    }
}

/// First visible line for a list of `total` lines shown in `height` rows
pub fn visible_start(total: usize, height: usize, scroll_from_bottom: usize) -> usize {
    let max_start = total.saturating_sub(height);
    max_start.saturating_sub(scroll_from_bottom)
}

/// Renders messages with the history's scroll position
pub struct HistoryView<'a> {
    pub history: &'a ConversationHistory,
    pub messages: &'a [Message],
    pub title: &'a str,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.extend(message_lines(message, inner_area.width));
            all_lines.push(Line::from(""));
        }
        all_lines.pop();

        let height = inner_area.height as usize;
        let total = all_lines.len();
        let start = visible_start(total, height, self.history.scroll_from_bottom);

        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if total > height {
            let mut state = ScrollbarState::new(total.saturating_sub(height)).position(start);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(area, buf, &mut state);
        }
    }
}

/// Render a single message into lines
pub fn message_lines(message: &Message, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let timestamp = message.timestamp.format("%H:%M:%S").to_string();
    lines.push(Line::from(vec![
        Span::styled(
            message.sender.display_name(),
            sender_style(message.sender).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {}", timestamp), Style::default().fg(Color::DarkGray)),
    ]));

    for content_line in wrap_text(&message.text, width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line, sender_style(message.sender)),
        ]));
    }

    lines
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: String = word.to_string();
            let mut word_len = word.chars().count();

            // Hard-split words longer than a whole line
            while word_len > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_len = 0;
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                word_len -= width;
                lines.push(head);
            }

            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_line.push_str(&word);
            current_len += word_len;
        }

        lines.push(current_line);
    }

    lines
}

fn sender_style(sender: Sender) -> Style {
    match sender {
        Sender::User => Style::default().fg(Color::Blue),
        Sender::Bot => Style::default().fg(Color::Green),
        Sender::System => Style::default().fg(Color::Yellow),
    }
}
