//! Per-session conversation state.
//!
//! History is append-only; phase detection reads only its length and the
//! last turn. The consumed set accumulates every matched keyword and
//! surfaced knowledge trigger for suggestion deduplication.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Turn;

static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{3,8}$").expect("nickname pattern"));

/// Shared nickname rule: 3 to 8 ASCII letters.
pub fn is_valid_nickname(nickname: &str) -> bool {
    NICKNAME_RE.is_match(nickname)
}

/// The live state of one conversation.
#[derive(Debug, Default)]
pub struct SessionState {
    history: Vec<Turn>,
    consumed: HashSet<String>,
    /// Last nickname seen on a user message; the archive key on farewell.
    nickname: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn consumed(&self) -> &HashSet<String> {
        &self.consumed
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// The cleaned question text pending a taught answer, if the last turn
    /// asked the user to teach something.
    pub fn pending_trigger(&self) -> Option<&str> {
        self.history
            .last()
            .filter(|turn| turn.is_awaiting_answer)
            .and_then(|turn| turn.knowledge_trigger.as_deref())
    }

    /// Append a completed turn and fold its matches into the consumed set.
    pub fn record(&mut self, turn: Turn) {
        self.nickname = turn.user_message.nickname.clone();
        for keyword in &turn.matched_keywords {
            self.consumed.insert(keyword.clone());
        }
        if let Some(fact) = &turn.matched_knowledge {
            for trigger in &fact.triggers {
                self.consumed.insert(trigger.clone());
            }
        }
        self.history.push(turn);
    }

    /// Complete the in-flight turn with its suggestion list. Suggestions are
    /// computed after the turn is appended (phase detection counts it), so
    /// this is the one permitted write to a recorded turn.
    pub fn set_last_suggestions(&mut self, suggestions: Vec<String>) {
        if let Some(last) = self.history.last_mut() {
            last.suggestions = suggestions;
        }
    }

    /// Drain the session for archiving: returns the full history and resets
    /// the state to a fresh conversation.
    pub fn drain(&mut self) -> Vec<Turn> {
        self.consumed.clear();
        self.nickname.clear();
        std::mem::take(&mut self.history)
    }
}
