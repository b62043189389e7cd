use crate::conversation::ConversationStore;
use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::block::{Position, Title},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// The draft should be submitted to the webhook
    Submit,
    /// The draft was a slash command; it has already been cleared
    Command(ParsedCommand),
    None,
}

/// Cursor and command-palette state for the draft input.
///
/// The draft text itself lives in the [`ConversationStore`].
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    /// Cursor position in chars, not bytes
    cursor: usize,
    placeholder: String,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
    /// Set once Up/Down moves the highlight; only then does Enter pick an entry
    palette_navigated: bool,
}

impl ConversationComposer {
    pub fn new(placeholder: String) -> Self {
        Self {
            cursor: 0,
            placeholder,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
            palette_navigated: false,
        }
    }

    /// Handle key input, editing the store's draft
    pub fn handle_key(&mut self, key: KeyEvent, store: &mut ConversationStore) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.show_command_palette
                    && self.palette_navigated
                    && self.apply_selected_command(store)
                {
                    return ComposerResult::None;
                }
                if !store.can_submit() {
                    return ComposerResult::None;
                }
                if let Some(command) = parse_slash_command(store.draft()) {
                    store.clear_draft();
                    self.cursor = 0;
                    self.close_command_palette();
                    return ComposerResult::Command(command);
                }
                self.cursor = 0;
                self.close_command_palette();
                return ComposerResult::Submit;
            }
            KeyCode::Up if self.show_command_palette => self.move_command_selection(-1),
            KeyCode::Down if self.show_command_palette => self.move_command_selection(1),
            KeyCode::Esc if self.show_command_palette => self.close_command_palette(),
            KeyCode::Tab if self.show_command_palette => {
                self.apply_selected_command(store);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_str(store, &c.to_string());
                self.sync_command_palette(store);
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at(store, self.cursor);
                    self.sync_command_palette(store);
                }
            }
            KeyCode::Delete => {
                if self.cursor < store.draft().chars().count() {
                    self.remove_at(store, self.cursor);
                    self.sync_command_palette(store);
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(store.draft().chars().count());
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = store.draft().chars().count();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor; the input is single-line
    pub fn handle_paste(&mut self, text: &str, store: &mut ConversationStore) {
        let flattened: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.insert_str(store, &flattened);
        self.sync_command_palette(store);
    }

    #[allow(dead_code)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[allow(dead_code)]
    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    fn insert_str(&mut self, store: &mut ConversationStore, text: &str) {
        let mut draft = store.draft().to_string();
        let at = byte_index(&draft, self.cursor);
        draft.insert_str(at, text);
        self.cursor += text.chars().count();
        store.set_draft(draft);
    }

    fn remove_at(&mut self, store: &mut ConversationStore, char_index: usize) {
        let mut draft = store.draft().to_string();
        let at = byte_index(&draft, char_index);
        if at < draft.len() {
            draft.remove(at);
            store.set_draft(draft);
        }
    }

    fn sync_command_palette(&mut self, store: &ConversationStore) {
        self.palette_navigated = false;
        let draft = store.draft();
        let wants_palette = draft.starts_with('/') && !draft.contains(char::is_whitespace);

        if wants_palette {
            if !self.show_command_palette {
                self.show_command_palette = true;
                self.selected_command = Some(0);
            }
            self.refresh_command_palette(draft);
        } else if self.show_command_palette {
            self.close_command_palette();
        }
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
        self.palette_navigated = false;
    }

    fn refresh_command_palette(&mut self, draft: &str) {
        let query = draft.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        if self.filtered_commands.is_empty() {
            self.selected_command = None;
        } else {
            let index = self.selected_command.unwrap_or(0);
            self.selected_command = Some(index.min(self.filtered_commands.len() - 1));
        }
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        self.palette_navigated = true;
        let current = self.selected_command.unwrap_or(0) as isize;
        let len = self.filtered_commands.len() as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self, store: &mut ConversationStore) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index).copied())
        else {
            return false;
        };

        let text = format!("/{}", entry.keyword);
        self.cursor = text.chars().count();
        store.set_draft(text);
        self.close_command_palette();
        true
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Renders the composer over the store's current draft
pub struct ComposerView<'a> {
    pub composer: &'a ConversationComposer,
    pub draft: &'a str,
    pub can_submit: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let send_style = if self.can_submit {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message")
            .title(
                Title::from(Span::styled(" [Send ⏎] ", send_style))
                    .position(Position::Bottom)
                    .alignment(Alignment::Right),
            )
            .style(Style::default().fg(Color::Green));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.draft.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.composer.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.draft.to_string();
            content.insert(byte_index(&content, self.composer.cursor), '▌');

            // Keep the cursor visible when the draft is wider than the box
            let width = inner_area.width as usize;
            let count = content.chars().count();
            let skip = if width > 0 && self.composer.cursor >= width {
                (self.composer.cursor + 1 - width).min(count)
            } else {
                0
            };
            let visible: String = content.chars().skip(skip).collect();
            let line = Line::from(vec![Span::styled(visible, Style::default().fg(Color::White))]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }

        if self.composer.show_command_palette {
            let filtered = &self.composer.filtered_commands;
            let palette_height = (filtered.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in filtered.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if self.composer.selected_command == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled("  ", Style::default()),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);
                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
