use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// "Waiting for reply" indicator shown while requests are outstanding
#[derive(Debug, Clone, Copy)]
pub struct PendingIndicator {
    pub outstanding: usize,
    /// Animation frame, advanced by the UI tick
    pub frame: usize,
}

impl PendingIndicator {
    pub fn label(&self) -> Option<String> {
        let dots = match self.frame % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        };

        match self.outstanding {
            0 => None,
            1 => Some(format!("Bot is typing{}", dots)),
            n => Some(format!("Waiting on {} replies{}", n, dots)),
        }
    }
}

impl Widget for PendingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(label) = self.label() else {
            return;
        };

        let indicator = Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::Yellow)),
            Span::styled(label, Style::default().fg(Color::Green)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}
