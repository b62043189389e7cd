//! Conversation UI components for the chat interface

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod pending;

pub use commands::{get_help_text, lookup_command, ParsedCommand, SlashCommand};
pub use composer::{ComposerResult, ComposerView, ConversationComposer};
pub use history::{ConversationHistory, HistoryView};
pub use manager::{ConversationAction, ConversationManager};
pub use pending::PendingIndicator;
