use crate::config::UiConfig;
use crate::conversation::{ConversationStore, MessageId};
use crate::dispatch::SubmissionDispatcher;
use crate::events::Sender;
use crate::ui::conversation::{
    get_help_text, lookup_command, ComposerResult, ComposerView, ConversationComposer, ConversationHistory,
    HistoryView, ParsedCommand, PendingIndicator, SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};

const PAGE: usize = 5;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Owns the conversation store and wires input, dispatch and rendering together
pub struct ConversationManager {
    store: ConversationStore,
    history: ConversationHistory,
    composer: ConversationComposer,
    dispatcher: SubmissionDispatcher,
    title: String,
    outstanding: usize,
    frame: usize,
}

impl ConversationManager {
    pub fn new(dispatcher: SubmissionDispatcher, ui: &UiConfig) -> Self {
        Self {
            store: ConversationStore::with_greeting(&ui.greeting),
            history: ConversationHistory::new(),
            composer: ConversationComposer::new(ui.placeholder.clone()),
            dispatcher,
            title: ui.title.clone(),
            outstanding: 0,
            frame: 0,
        }
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Number of submissions still waiting for a reply
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Submit the current draft.
    ///
    /// The user message is appended before this returns; the round trip runs
    /// in the background and comes back through [`Self::handle_reply`].
    pub fn submit(&mut self) -> Option<MessageId> {
        let (id, text) = self.store.take_submission()?;
        tracing::debug!(message_id = id.value(), "Submitting message");

        self.outstanding += 1;
        self.dispatcher.submit(id, text);
        Some(id)
    }

    /// Append a resolved bot reply
    pub fn handle_reply(&mut self, in_reply_to: MessageId, text: String) {
        tracing::debug!(in_reply_to = in_reply_to.value(), "Reply received");
        self.outstanding = self.outstanding.saturating_sub(1);
        self.store.append_message(Sender::Bot, text);
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ConversationAction::Exit;
        }

        match key.code {
            KeyCode::PageUp => {
                self.history.scroll_up(PAGE);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.history.scroll_down(PAGE);
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key, &mut self.store) {
            ComposerResult::Submit => {
                self.submit();
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.handle_paste(text, &mut self.store);
    }

    /// Advance the waiting animation
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Help => {
                let text = match command.argument().and_then(lookup_command) {
                    Some(target) => format!("/{} - {}", target.command(), target.description()),
                    None => get_help_text(),
                };
                self.store.append_message(Sender::System, text);
                ConversationAction::None
            }
            SlashCommand::Session => {
                let note = format!("Session id: {}", self.dispatcher.session_id());
                self.store.append_message(Sender::System, note);
                ConversationAction::None
            }
            SlashCommand::Bye => ConversationAction::Exit,
        }
    }

    /// Render the conversation UI components
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        self.history.sync(self.store.revision());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // History
                Constraint::Length(1), // Waiting indicator
                Constraint::Length(3), // Composer
            ])
            .split(area);

        HistoryView {
            history: &self.history,
            messages: self.store.messages(),
            title: &self.title,
        }
        .render(chunks[0], buf);

        PendingIndicator {
            outstanding: self.outstanding,
            frame: self.frame,
        }
        .render(chunks[1], buf);

        ComposerView {
            composer: &self.composer,
            draft: self.store.draft(),
            can_submit: self.store.can_submit(),
        }
        .render(chunks[2], buf);
    }
}
