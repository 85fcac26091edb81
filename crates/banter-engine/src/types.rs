//! Core domain records for the response engine.
//!
//! One canonical [`Turn`] structure replaces the loosely-typed optional
//! fields the pipeline otherwise accumulates: every stage reads and writes
//! explicit fields instead of probing for their presence.

use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    System,
    Bot,
    User,
    Other,
}

impl Owner {
    /// Lowercase display name used when a message has no participant nickname.
    pub fn as_str(&self) -> &'static str {
        match self {
            Owner::System => "system",
            Owner::Bot => "bot",
            Owner::User => "user",
            Owner::Other => "other",
        }
    }
}

/// One utterance, from either participant or the system.
///
/// Immutable once its turn is appended to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    /// Epoch seconds.
    pub timestamp: i64,
    pub owner: Owner,
    /// Resolved display name: the participant nickname for user messages,
    /// the bot name for bot messages, the owner name otherwise.
    pub nickname: String,
    /// Set when this message asks the user to teach a missing fact.
    pub awaiting_answer: bool,
}

impl ChatMessage {
    /// Build a message stamped with the current time.
    ///
    /// An empty `nickname` resolves to the owner's display name, so system
    /// and anonymous messages still carry a usable label.
    pub fn now(text: impl Into<String>, owner: Owner, nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        let nickname = if nickname.is_empty() {
            owner.as_str().to_string()
        } else {
            nickname
        };
        Self {
            text: text.into(),
            timestamp: chrono::Local::now().timestamp(),
            owner,
            nickname,
            awaiting_answer: false,
        }
    }
}

/// The engine's full account of processing one user utterance.
///
/// Immutable once appended to history; only the in-flight turn is filled in
/// while the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub user_message: ChatMessage,
    /// Sentence-like tokens derived from the utterance.
    pub tokens: Vec<String>,
    /// Keys of actions the user's tokens resolved to, in token order.
    pub matched_action_keys: Vec<String>,
    /// The literal keywords/triggers that matched, for suggestion dedup.
    pub matched_keywords: Vec<String>,
    /// The knowledge fact surfaced this turn, if any.
    pub matched_knowledge: Option<crate::catalog::Knowledge>,
    /// Keys of the bot reactions chosen for the reply, deduplicated.
    pub reaction_keys: Vec<String>,
    pub reply_message: ChatMessage,
    pub suggestions: Vec<String>,
    /// Cleaned question text pending a taught answer.
    pub knowledge_trigger: Option<String>,
    /// The engine asked the user to teach it something.
    pub is_awaiting_answer: bool,
    /// A farewell reaction fired; the session is archived after this turn.
    pub is_user_left: bool,
}

/// What the caller receives for one processed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyResult {
    pub text: String,
    pub suggestions: Vec<String>,
    pub is_awaiting_answer: bool,
    pub is_user_left: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_as_str() {
        assert_eq!(Owner::System.as_str(), "system");
        assert_eq!(Owner::Bot.as_str(), "bot");
        assert_eq!(Owner::User.as_str(), "user");
        assert_eq!(Owner::Other.as_str(), "other");
    }

    #[test]
    fn test_message_now_stamps_time() {
        let msg = ChatMessage::now("hello", Owner::User, "alice");
        let now = chrono::Local::now().timestamp();
        assert!((msg.timestamp - now).abs() < 2);
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.nickname, "alice");
        assert!(!msg.awaiting_answer);
    }

    #[test]
    fn test_message_now_empty_nickname_uses_owner_name() {
        let msg = ChatMessage::now("maintenance", Owner::System, "");
        assert_eq!(msg.nickname, "system");

        let msg = ChatMessage::now("hello", Owner::User, "");
        assert_eq!(msg.nickname, "user");
    }

    #[test]
    fn test_owner_serde_roundtrip() {
        let json = serde_json::to_string(&Owner::Bot).unwrap();
        let back: Owner = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Owner::Bot);
    }

    #[test]
    fn test_reply_result_serializes() {
        let reply = ReplyResult {
            text: "Hello there!".to_string(),
            suggestions: vec!["hi".to_string()],
            is_awaiting_answer: false,
            is_user_left: false,
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains("Hello there!"));
    }
}
