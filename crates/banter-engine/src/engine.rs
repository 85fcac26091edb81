//! Turn orchestration.
//!
//! [`ChatEngine`] owns the shared catalog, the mutable knowledge table, the
//! live session map, and the archive of completed conversations. A turn runs
//! tokenize, match, build reply, compute suggestions, and append to history,
//! strictly in that order, under the session's own lock; independent
//! sessions proceed concurrently. Catalog reload is an atomic swap of an
//! `Arc`, so an in-flight turn sees either the old or the new catalog whole.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use banter_core::config::BanterConfig;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogPayload, Knowledge};
use crate::error::EngineError;
use crate::matcher::{self, Matcher};
use crate::response::ResponseBuilder;
use crate::rng::Dice;
use crate::session::SessionState;
use crate::suggest::SuggestionEngine;
use crate::tokenizer::Tokenizer;
use crate::types::{ChatMessage, Owner, ReplyResult, Turn};

/// The rule-based conversational-response engine.
pub struct ChatEngine {
    config: BanterConfig,
    tokenizer: Tokenizer,
    matcher: Matcher,
    responder: ResponseBuilder,
    suggester: SuggestionEngine,
    catalog: RwLock<Option<Arc<Catalog>>>,
    knowledge: Mutex<Vec<Knowledge>>,
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<SessionState>>>>,
    archive: Mutex<HashMap<String, Vec<Turn>>>,
    dice: Mutex<Dice>,
}

impl ChatEngine {
    pub fn new(config: BanterConfig) -> Self {
        Self::with_dice(config, Dice::new())
    }

    /// Deterministic engine for tests: every randomized decision draws from
    /// the given seed.
    pub fn seeded(config: BanterConfig, seed: u64) -> Self {
        Self::with_dice(config, Dice::seeded(seed))
    }

    fn with_dice(config: BanterConfig, dice: Dice) -> Self {
        Self {
            tokenizer: Tokenizer::new(&config.persona.bot_name),
            matcher: Matcher::new(&config.matcher, &config.lexicon),
            responder: ResponseBuilder::new(&config.persona, &config.lexicon),
            suggester: SuggestionEngine::new(&config.suggestions, &config.lexicon),
            catalog: RwLock::new(None),
            knowledge: Mutex::new(Vec::new()),
            sessions: Mutex::new(HashMap::new()),
            archive: Mutex::new(HashMap::new()),
            dice: Mutex::new(dice),
            config,
        }
    }

    // ========================================================================
    // Catalog loading
    // ========================================================================

    /// Swap in a new catalog and reseed the knowledge table.
    ///
    /// On failure the previous catalog (if any) stays active.
    pub fn load_catalog(&self, payload: &CatalogPayload) -> Result<(), EngineError> {
        let catalog = Catalog::from_payload(payload)?;
        self.install(catalog, payload.knowledge_base.clone())
    }

    /// Parse a raw JSON payload and swap it in.
    pub fn load_catalog_json(&self, raw: &str) -> Result<(), EngineError> {
        let (catalog, knowledge) = Catalog::from_json(raw)?;
        self.install(catalog, knowledge)
    }

    fn install(&self, catalog: Catalog, knowledge: Vec<Knowledge>) -> Result<(), EngineError> {
        *lock(&self.knowledge, "knowledge")? = knowledge;
        *write_lock(&self.catalog)? = Some(Arc::new(catalog));
        Ok(())
    }

    // ========================================================================
    // Turn processing
    // ========================================================================

    /// Process one user utterance for the given session.
    ///
    /// An unknown session id starts a fresh session. An empty or
    /// whitespace-only utterance is a no-op signal: no turn is recorded.
    pub fn process_turn(
        &self,
        session_id: Uuid,
        text: &str,
        nickname: &str,
    ) -> Result<ReplyResult, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        let catalog = self.current_catalog()?;

        let session = self.session(session_id)?;
        let mut state = lock(&session, "session")?;
        let mut knowledge = lock(&self.knowledge, "knowledge")?;
        let mut dice = lock(&self.dice, "dice")?;

        let user_message = ChatMessage::now(text, Owner::User, nickname);

        // Learning continuation: the whole utterance is the taught answer.
        if let Some(trigger) = state.pending_trigger().map(String::from) {
            info!("learned '{}' -> '{}'", trigger, text);
            matcher::learn(&mut knowledge, &trigger, text);
            let reply_text = self.responder.learned_ack().to_string();
            return self.finish_turn(
                &catalog,
                &knowledge,
                &mut state,
                &mut dice,
                Turn {
                    user_message,
                    tokens: vec![],
                    matched_action_keys: vec![],
                    matched_keywords: vec![],
                    matched_knowledge: None,
                    reaction_keys: vec![],
                    reply_message: ChatMessage::now(reply_text, Owner::Bot, &self.config.persona.bot_name),
                    suggestions: vec![],
                    knowledge_trigger: None,
                    is_awaiting_answer: false,
                    is_user_left: false,
                },
                vec![],
            );
        }

        let tokens = self.tokenizer.tokenize(text);
        let first_turn = state.history().is_empty();
        let outcome = self
            .matcher
            .match_turn(&tokens, &catalog, &knowledge, first_turn, &mut dice);
        let is_awaiting_answer = outcome.awaiting_trigger.is_some();
        let is_user_left = outcome
            .reaction_keys
            .iter()
            .any(|key| self.config.lexicon.farewell_keys.contains(key));

        let reply_text = self.responder.build(
            &catalog,
            outcome.matched_knowledge.as_ref().map(|k| k.response.as_str()),
            &outcome.reaction_keys,
            is_awaiting_answer,
            nickname,
            first_turn,
            &mut dice,
        );
        let mut reply_message =
            ChatMessage::now(reply_text, Owner::Bot, &self.config.persona.bot_name);
        reply_message.awaiting_answer = is_awaiting_answer;

        debug!(
            "turn: actions {:?}, reactions {:?}, awaiting {}, left {}",
            outcome.matched_action_keys, outcome.reaction_keys, is_awaiting_answer, is_user_left
        );

        self.finish_turn(
            &catalog,
            &knowledge,
            &mut state,
            &mut dice,
            Turn {
                user_message,
                tokens,
                matched_action_keys: outcome.matched_action_keys,
                matched_keywords: outcome.matched_keywords,
                matched_knowledge: outcome.matched_knowledge,
                reaction_keys: outcome.reaction_keys,
                reply_message,
                suggestions: vec![],
                knowledge_trigger: outcome.awaiting_trigger,
                is_awaiting_answer,
                is_user_left,
            },
            outcome.near_miss_suggestions,
        )
    }

    /// Append the turn, compute its suggestions, and archive on farewell.
    fn finish_turn(
        &self,
        catalog: &Catalog,
        knowledge: &[Knowledge],
        state: &mut SessionState,
        dice: &mut Dice,
        turn: Turn,
        near_misses: Vec<String>,
    ) -> Result<ReplyResult, EngineError> {
        let reply = ReplyResult {
            text: turn.reply_message.text.clone(),
            suggestions: vec![],
            is_awaiting_answer: turn.is_awaiting_answer,
            is_user_left: turn.is_user_left,
        };
        state.record(turn);

        // A confused question offers its near-miss candidates instead of the
        // generic pool.
        let suggestions = if reply.is_awaiting_answer && !near_misses.is_empty() {
            dice.pick_many(&near_misses, self.config.suggestions.cap)
        } else {
            self.suggester
                .suggest(catalog, knowledge, state.history(), state.consumed(), dice)
        };
        state.set_last_suggestions(suggestions.clone());

        if reply.is_user_left {
            let nickname = state.nickname().to_string();
            let turns = state.drain();
            info!("session archived under '{}' ({} turns)", nickname, turns.len());
            lock(&self.archive, "archive")?.insert(nickname, turns);
        }

        Ok(ReplyResult {
            suggestions,
            ..reply
        })
    }

    // ========================================================================
    // Suggestions
    // ========================================================================

    /// Standalone suggestions for a session's current state, usable to seed
    /// the very first prompt before any utterance exists.
    pub fn suggestions(&self, session_id: Uuid) -> Result<Vec<String>, EngineError> {
        let catalog = self.current_catalog()?;
        let session = self.session(session_id)?;
        let state = lock(&session, "session")?;
        let knowledge = lock(&self.knowledge, "knowledge")?;
        let mut dice = lock(&self.dice, "dice")?;
        Ok(self
            .suggester
            .suggest(&catalog, &knowledge, state.history(), state.consumed(), &mut dice))
    }

    /// Archived history for a nickname, if that participant said farewell.
    pub fn archived(&self, nickname: &str) -> Result<Option<Vec<Turn>>, EngineError> {
        Ok(lock(&self.archive, "archive")?.get(nickname).cloned())
    }

    fn current_catalog(&self) -> Result<Arc<Catalog>, EngineError> {
        self.catalog
            .read()
            .map_err(|_| EngineError::LockPoisoned("catalog".to_string()))?
            .clone()
            .ok_or(EngineError::CatalogNotLoaded)
    }

    fn session(&self, session_id: Uuid) -> Result<Arc<Mutex<SessionState>>, EngineError> {
        let mut sessions = lock(&self.sessions, "sessions")?;
        Ok(sessions
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(SessionState::new())))
            .clone())
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, EngineError> {
    mutex
        .lock()
        .map_err(|_| EngineError::LockPoisoned(what.to_string()))
}

fn write_lock<T>(
    rwlock: &RwLock<T>,
) -> Result<std::sync::RwLockWriteGuard<'_, T>, EngineError> {
    rwlock
        .write()
        .map_err(|_| EngineError::LockPoisoned("catalog".to_string()))
}
