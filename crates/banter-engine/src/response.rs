//! Reply text assembly.
//!
//! Builds the outgoing message from the turn's matched knowledge and chosen
//! reactions, avoiding verbatim repetition within one reply, then runs name
//! placeholder substitution.

use banter_core::config::{LexiconConfig, PersonaConfig};

use crate::catalog::Catalog;
use crate::rng::Dice;

/// Returned when a turn produced no phrases and is not asking to be taught.
pub const NO_REPLY_SENTINEL: &str = "404";

/// Placeholder for the bot's own display name. Always substituted.
pub const SELF_PLACEHOLDER: &str = "{self}";

/// Placeholder for the user's nickname. Substituted on the first turn, and
/// on a coin toss thereafter.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Assembles reply text for one turn.
pub struct ResponseBuilder {
    bot_name: String,
    teach_prompt: String,
    learned_ack: String,
}

impl ResponseBuilder {
    pub fn new(persona: &PersonaConfig, lexicon: &LexiconConfig) -> Self {
        Self {
            bot_name: persona.bot_name.clone(),
            teach_prompt: lexicon.teach_prompt.clone(),
            learned_ack: lexicon.learned_ack.clone(),
        }
    }

    /// Fixed acknowledgement for a turn that taught the engine a new fact.
    pub fn learned_ack(&self) -> &str {
        &self.learned_ack
    }

    /// Compose the reply for one matched turn.
    ///
    /// Knowledge text leads, then one phrase per reaction in turn order. For
    /// each reaction up to 3 random picks are tried, skipping any phrase
    /// already contained in the text so far. An empty assembly falls back to
    /// the teach prompt when the turn awaits an answer, or to the sentinel.
    pub fn build(
        &self,
        catalog: &Catalog,
        knowledge_response: Option<&str>,
        reaction_keys: &[String],
        awaiting_answer: bool,
        nickname: &str,
        first_turn: bool,
        dice: &mut Dice,
    ) -> String {
        let mut text = String::new();
        if let Some(response) = knowledge_response {
            text.push_str(response);
        }

        for key in reaction_keys {
            let Some(idx) = catalog.find(key) else {
                continue;
            };
            let phrases = &catalog.action(idx).phrases;
            for _ in 0..3 {
                let Some(phrase) = dice.pick(phrases) else {
                    break;
                };
                if !text.contains(phrase.as_str()) {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(phrase);
                    break;
                }
            }
        }

        if text.is_empty() {
            text = if awaiting_answer {
                self.teach_prompt.clone()
            } else {
                NO_REPLY_SENTINEL.to_string()
            };
        }

        let text = replace_placeholder(&text, SELF_PLACEHOLDER, &self.bot_name, true, dice);
        let insert_target = first_turn || dice.coin_toss();
        replace_placeholder(&text, TARGET_PLACEHOLDER, nickname, insert_target, dice)
    }
}

/// Replace exactly one uniformly chosen occurrence of `placeholder` with a
/// space followed by `name`, and delete every other occurrence. When
/// `insert` is false all occurrences are deleted. Text without the
/// placeholder is returned unchanged.
pub(crate) fn replace_placeholder(
    text: &str,
    placeholder: &str,
    name: &str,
    insert: bool,
    dice: &mut Dice,
) -> String {
    let positions: Vec<usize> = text.match_indices(placeholder).map(|(i, _)| i).collect();
    if positions.is_empty() {
        return text.to_string();
    }

    let chosen = if insert {
        Some(positions[dice.index(positions.len())])
    } else {
        None
    };

    let mut out = String::with_capacity(text.len() + name.len());
    let mut last = 0;
    for &pos in &positions {
        out.push_str(&text[last..pos]);
        if Some(pos) == chosen {
            out.push(' ');
            out.push_str(name);
        }
        last = pos + placeholder.len();
    }
    out.push_str(&text[last..]);
    out
}
