//! Conversation memory for a chat session.

use serde::{Deserialize, Serialize};

/// A single turn in a conversation, carrying a role and text content.
///
/// # Examples
///
/// ```
/// use helpsmith::memory::ChatMessage;
///
/// let question = ChatMessage::user("How do I reset my password?");
/// assert_eq!(question.role, ChatMessage::USER);
///
/// let reply = ChatMessage::assistant("Open account settings and…");
/// assert_eq!(reply.role, "assistant");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the sender, one of the constants on [`ChatMessage`].
    pub role: String,
    /// Text content of the turn.
    pub content: String,
}

impl ChatMessage {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// Assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";

    /// Creates a message with the given role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Returns true if this message has the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

/// Ordered history of one chat session.
///
/// The presentation layer owns one of these per session and passes it
/// `&mut` to every question. Turns are appended in (question, answer)
/// pairs and never trimmed.
///
/// # Examples
///
/// ```
/// use helpsmith::memory::SessionMemory;
///
/// let mut memory = SessionMemory::new();
/// memory.record_exchange("hi", "Hello! How can I help?");
/// assert_eq!(memory.len(), 2);
/// assert_eq!(memory.turns()[0].content, "hi");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMemory {
    turns: Vec<ChatMessage>,
}

impl SessionMemory {
    /// Creates an empty session history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a question/answer pair to the history.
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.turns.push(ChatMessage::user(question));
        self.turns.push(ChatMessage::assistant(answer));
    }

    /// All turns in insertion order.
    #[must_use]
    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    /// Number of recorded turns (two per exchange).
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true when no turns have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forgets the whole history, starting the session over.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_assign_roles() {
        assert!(ChatMessage::user("q").has_role(ChatMessage::USER));
        assert!(ChatMessage::assistant("a").has_role(ChatMessage::ASSISTANT));
        assert!(!ChatMessage::user("q").has_role(ChatMessage::ASSISTANT));
    }

    #[test]
    fn exchanges_append_in_order() {
        let mut memory = SessionMemory::new();
        assert!(memory.is_empty());

        memory.record_exchange("first question", "first answer");
        memory.record_exchange("second question", "second answer");

        let turns = memory.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], ChatMessage::user("first question"));
        assert_eq!(turns[1], ChatMessage::assistant("first answer"));
        assert_eq!(turns[2], ChatMessage::user("second question"));
        assert_eq!(turns[3], ChatMessage::assistant("second answer"));
    }

    #[test]
    fn clear_resets_the_session() {
        let mut memory = SessionMemory::new();
        memory.record_exchange("q", "a");
        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn serializes_round_trip() {
        let mut memory = SessionMemory::new();
        memory.record_exchange("q", "a");
        let json = serde_json::to_string(&memory).unwrap();
        let parsed: SessionMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(memory, parsed);
    }
}
