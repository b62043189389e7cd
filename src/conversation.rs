use chrono::{DateTime, Utc};

use crate::events::Sender;
use crate::reply::trim_js_whitespace;

/// Display key for a message; strictly increasing in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A single chat message. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

/// Ordered message list plus the draft input; the only mutable chat state.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    draft: String,
    next_id: u64,
    revision: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with a bot greeting already in place
    pub fn with_greeting(greeting: &str) -> Self {
        let mut store = Self::new();
        if !greeting.is_empty() {
            store.append_message(Sender::Bot, greeting.to_string());
        }
        store
    }

    /// Add a message to the end of the sequence
    pub fn append_message(&mut self, sender: Sender, text: String) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: MessageId(self.next_id),
            text,
            sender,
            timestamp: Utc::now(),
        });
        self.touch();
        &self.messages[self.messages.len() - 1]
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.touch();
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
        self.touch();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Whether the send control should be enabled
    pub fn can_submit(&self) -> bool {
        !trim_js_whitespace(&self.draft).is_empty()
    }

    /// Capture and clear the draft, appending it as a user message.
    ///
    /// Returns `None` and leaves the store untouched when the draft is blank.
    /// The returned text is the raw draft, not trimmed.
    pub fn take_submission(&mut self) -> Option<(MessageId, String)> {
        if !self.can_submit() {
            return None;
        }

        let text = std::mem::take(&mut self.draft);
        let id = self.append_message(Sender::User, text.clone()).id;
        Some((id, text))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Bumped on every mutation; renderers compare it to decide when to snap to the bottom.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
