//! Phase-dependent follow-up suggestions.
//!
//! The focused pool is selected by conversation phase (turn count), filtered
//! against suggestions the session already consumed, sampled to the cap,
//! padded with a shuffled noise pool, and shuffled once more.

use std::collections::HashSet;

use banter_core::config::{LexiconConfig, SuggestionConfig};

use crate::catalog::{Catalog, Knowledge};
use crate::rng::Dice;
use crate::types::Turn;

/// Produces candidate next utterances for the caller to offer.
pub struct SuggestionEngine {
    cap: usize,
    farewell_after_turns: usize,
    lexicon: LexiconConfig,
}

impl SuggestionEngine {
    pub fn new(suggestions: &SuggestionConfig, lexicon: &LexiconConfig) -> Self {
        Self {
            cap: suggestions.cap,
            farewell_after_turns: suggestions.farewell_after_turns,
            lexicon: lexicon.clone(),
        }
    }

    /// Compute suggestions for the session's current state.
    ///
    /// `consumed` holds every keyword and knowledge trigger the session has
    /// already matched; those are never offered again.
    pub fn suggest(
        &self,
        catalog: &Catalog,
        knowledge: &[Knowledge],
        history: &[Turn],
        consumed: &HashSet<String>,
        dice: &mut Dice,
    ) -> Vec<String> {
        // A fresh conversation only invites the identity question; the
        // opening phase never mixes in the noise pool.
        if history.is_empty() {
            let opening = dedup_filtered(
                self.keywords_of(catalog, std::slice::from_ref(&self.lexicon.introduce_key)),
                consumed,
            );
            return dice.pick_many(&opening, self.cap);
        }

        let focused = self.focused_pool(catalog, knowledge, history);
        let focused = dedup_filtered(focused, consumed);
        let mut suggestions = dice.pick_many(&focused, self.cap);

        let mut noise = self.noise_pool(catalog, consumed, &suggestions);
        dice.shuffle(&mut noise);
        suggestions.extend(noise);

        dice.shuffle(&mut suggestions);
        suggestions.truncate(self.cap);
        suggestions
    }

    /// The phase-dependent primary pool for a conversation under way.
    ///
    /// One turn in, greetings; after enough turns, farewells; in between,
    /// knowledge triggers plus keywords one reaction-hop beyond what the bot
    /// just said.
    fn focused_pool(
        &self,
        catalog: &Catalog,
        knowledge: &[Knowledge],
        history: &[Turn],
    ) -> Vec<String> {
        if history.len() == 1 {
            return self.keywords_of(catalog, &self.lexicon.greeting_keys);
        }
        if history.len() >= self.farewell_after_turns {
            return self.keywords_of(catalog, &self.lexicon.farewell_keys);
        }

        let mut pool: Vec<String> = knowledge
            .iter()
            .flat_map(|fact| fact.triggers.iter().cloned())
            .collect();
        if let Some(last) = history.last() {
            for key in &last.reaction_keys {
                let Some(idx) = catalog.find(key) else {
                    continue;
                };
                for &reaction_idx in &catalog.action(idx).reactions {
                    pool.extend(catalog.action(reaction_idx).keywords.iter().cloned());
                }
            }
        }
        pool
    }

    /// Every keyword outside the ignore-list, minus anything consumed or
    /// already selected.
    fn noise_pool(
        &self,
        catalog: &Catalog,
        consumed: &HashSet<String>,
        selected: &[String],
    ) -> Vec<String> {
        let ignored: HashSet<&str> = self
            .lexicon
            .ignored_suggestion_keys
            .iter()
            .map(String::as_str)
            .collect();
        let mut seen: HashSet<&str> = selected.iter().map(String::as_str).collect();
        let mut pool = Vec::new();
        for action in catalog.actions() {
            if ignored.contains(action.key.as_str()) {
                continue;
            }
            for keyword in &action.keywords {
                if consumed.contains(keyword) || !seen.insert(keyword) {
                    continue;
                }
                pool.push(keyword.clone());
            }
        }
        pool
    }

    fn keywords_of(&self, catalog: &Catalog, keys: &[String]) -> Vec<String> {
        keys.iter()
            .filter_map(|key| catalog.find(key))
            .flat_map(|idx| catalog.action(idx).keywords.iter().cloned())
            .collect()
    }
}

/// Order-preserving dedup with the consumed set removed.
fn dedup_filtered(pool: Vec<String>, consumed: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    pool.into_iter()
        .filter(|s| !consumed.contains(s) && seen.insert(s.clone()))
        .collect()
}
