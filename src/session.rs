//! In-memory, request-scoped session history.
//!
//! State lives only for the lifetime of one interactive session and is passed
//! explicitly to whatever needs it. Lists are append-only; order reflects the
//! chronological order of user actions.

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The person typing into the session.
    User,
    /// The hosted model's reply.
    Assistant,
}

impl Role {
    /// Returns the role as the string used in prompt transcripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message in the conversation.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Author of the turn.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// One completed scan analysis.
#[derive(Debug, Clone)]
pub struct ScanRecord {
    /// The analysis text returned by the model.
    pub content: String,
}

/// Session-lifetime history of chat turns and scan analyses.
#[derive(Debug, Default)]
pub struct SessionState {
    turns: Vec<ChatTurn>,
    scans: Vec<ScanRecord>,
}

impl SessionState {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: Role::User,
            content: content.into(),
        });
    }

    /// Appends an assistant reply.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// Appends a completed scan analysis.
    pub fn record_scan(&mut self, content: impl Into<String>) {
        self.scans.push(ScanRecord {
            content: content.into(),
        });
    }

    /// All chat turns in submission order.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// All scan analyses in submission order.
    pub fn scans(&self) -> &[ScanRecord] {
        &self.scans
    }

    /// The most recent `n` chat turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_entry_per_message_and_reply() {
        let mut session = SessionState::new();
        assert!(session.turns().is_empty());

        session.push_user("Is ibuprofen safe on an empty stomach?");
        assert_eq!(session.turns().len(), 1);

        session.push_assistant("Take it with food to avoid gastric irritation.");
        assert_eq!(session.turns().len(), 2);
    }

    #[test]
    fn submission_order_is_preserved() {
        let mut session = SessionState::new();
        session.push_user("first");
        session.push_assistant("second");
        session.push_user("third");

        let contents: Vec<&str> = session.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(session.turns()[0].role, Role::User);
        assert_eq!(session.turns()[1].role, Role::Assistant);
    }

    #[test]
    fn scans_accumulate_separately() {
        let mut session = SessionState::new();
        session.record_scan("**Name**: Paracetamol");
        session.record_scan("**Name**: Cetirizine");

        assert_eq!(session.scans().len(), 2);
        assert!(session.turns().is_empty());
        assert_eq!(session.scans()[0].content, "**Name**: Paracetamol");
    }

    #[test]
    fn recent_turns_windows_from_the_end() {
        let mut session = SessionState::new();
        for i in 0..5 {
            session.push_user(format!("message {i}"));
        }

        let recent = session.recent_turns(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "message 2");
        assert_eq!(recent[2].content, "message 4");

        // Window larger than history returns everything
        assert_eq!(session.recent_turns(50).len(), 5);
    }

    #[test]
    fn role_strings_match_transcript_format() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
