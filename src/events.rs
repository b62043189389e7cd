use crate::conversation::MessageId;

/// Internal application events for coordinating between components
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Terminal input forwarded from the input thread
    Tui(TuiEvent),

    /// A webhook round trip resolved for the user message `in_reply_to`
    BotReply { in_reply_to: MessageId, text: String },

    /// Periodic redraw for the waiting indicator
    Tick,
}

/// TUI-specific events (keyboard, paste, resize)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
    /// Local notes (help text, session info) that never reach the webhook
    System,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "Bot",
            Sender::System => "Note",
        }
    }
}
