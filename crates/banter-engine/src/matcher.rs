//! Token-to-intent resolution.
//!
//! Each token is resolved by an ordered chain of strategies: exact keyword
//! match, exact knowledge-trigger match, two-stage fuzzy match, and finally
//! the confused fallback. Learning continuation and first-turn identity are
//! handled above the per-token tiers. Every strategy either resolves the
//! token or passes to the next; the chain is total.

use banter_core::config::{LexiconConfig, MatcherConfig};
use strsim::jaro_winkler;
use tracing::debug;

use crate::catalog::{Catalog, Knowledge};
use crate::rng::Dice;
use crate::tokenizer::{contains_exact_phrase, sanitize};

/// How a single token resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenMatch {
    Action { index: usize, keyword: String },
    Knowledge { index: usize, trigger: String },
    Confused { question: bool, near_misses: Vec<String> },
}

/// Everything the matcher decided for one turn.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Keys of actions the user's tokens resolved to, in token order.
    pub matched_action_keys: Vec<String>,
    /// Literal keywords/triggers that matched (consumed for suggestions).
    pub matched_keywords: Vec<String>,
    /// First knowledge fact surfaced this turn, if any.
    pub matched_knowledge: Option<Knowledge>,
    /// Chosen bot reaction keys, deduplicated, in selection order.
    pub reaction_keys: Vec<String>,
    /// Cleaned question text stored when the engine asks to be taught.
    pub awaiting_trigger: Option<String>,
    /// Keywords of near-miss fuzzy candidates, offered instead of the
    /// generic suggestion pool when a question confused the engine.
    pub near_miss_suggestions: Vec<String>,
}

/// A fuzzy candidate inside the loose cutoff.
#[derive(Debug, Clone)]
struct FuzzyCandidate {
    index: usize,
    matched: String,
    score: f64,
}

/// Resolves tokens against the catalog and knowledge table.
pub struct Matcher {
    strict_threshold: f64,
    loose_threshold: f64,
    lexicon: LexiconConfig,
}

impl Matcher {
    pub fn new(matcher: &MatcherConfig, lexicon: &LexiconConfig) -> Self {
        Self {
            strict_threshold: matcher.strict_threshold,
            loose_threshold: matcher.loose_threshold,
            lexicon: lexicon.clone(),
        }
    }

    /// Run the full per-turn matching pass.
    ///
    /// `history_is_empty` forces the identity introduction: the very first
    /// turn of a session is always treated as a name exchange, whatever the
    /// user typed.
    pub fn match_turn(
        &self,
        tokens: &[String],
        catalog: &Catalog,
        knowledge: &[Knowledge],
        history_is_empty: bool,
        dice: &mut Dice,
    ) -> MatchOutcome {
        let mut out = MatchOutcome::default();
        let introduce_idx = catalog.find(&self.lexicon.introduce_key);

        for token in tokens {
            let resolved = match (history_is_empty, introduce_idx) {
                // Forced identity match: no literal keyword was consumed.
                (true, Some(index)) => TokenMatch::Action {
                    index,
                    keyword: String::new(),
                },
                _ => self.resolve_token(token, catalog, knowledge),
            };

            match resolved {
                TokenMatch::Action { index, keyword } => {
                    let action = catalog.action(index);
                    debug!("token '{}' matched action '{}'", token, action.key);
                    out.matched_action_keys.push(action.key.clone());
                    if !keyword.is_empty() {
                        out.matched_keywords.push(keyword);
                    }
                    self.select_reactions(index, catalog, dice, &mut out.reaction_keys);
                }
                TokenMatch::Knowledge { index, trigger } => {
                    debug!("token '{}' matched knowledge trigger '{}'", token, trigger);
                    out.matched_keywords.push(trigger);
                    if out.matched_knowledge.is_none() {
                        out.matched_knowledge = Some(knowledge[index].clone());
                    }
                }
                TokenMatch::Confused {
                    question,
                    near_misses,
                } => {
                    debug!("token '{}' confused (question: {})", token, question);
                    if question {
                        out.awaiting_trigger = Some(sanitize(token).trim().to_string());
                        for suggestion in near_misses {
                            push_unique(&mut out.near_miss_suggestions, &suggestion);
                        }
                    } else {
                        self.select_filler(catalog, dice, &mut out.reaction_keys);
                    }
                }
            }
        }

        // When nothing provoked a reply, a coin toss may offer help, unless
        // this turn is already asking the user to teach something.
        if out.reaction_keys.is_empty() && out.awaiting_trigger.is_none() && dice.coin_toss() {
            if catalog.find(&self.lexicon.offer_help_key).is_some() {
                out.reaction_keys.push(self.lexicon.offer_help_key.clone());
            }
        }

        out
    }

    /// Resolve one token through the exact / fuzzy / confused tiers.
    pub fn resolve_token(
        &self,
        token: &str,
        catalog: &Catalog,
        knowledge: &[Knowledge],
    ) -> TokenMatch {
        // Exact tier: first catalog-order whole-word keyword hit wins, and
        // an action hit beats a knowledge hit for the same token.
        for (index, action) in catalog.actions().iter().enumerate() {
            if let Some(keyword) = action
                .keywords
                .iter()
                .find(|kw| contains_exact_phrase(token, kw))
            {
                return TokenMatch::Action {
                    index,
                    keyword: keyword.clone(),
                };
            }
        }
        for (index, fact) in knowledge.iter().enumerate() {
            if let Some(trigger) = fact
                .triggers
                .iter()
                .find(|tr| contains_exact_phrase(token, tr))
            {
                return TokenMatch::Knowledge {
                    index,
                    trigger: trigger.clone(),
                };
            }
        }

        // Fuzzy tier: loose recall cutoff first, then strict acceptance on
        // the best survivor. Lower score is better; 0 is a perfect match.
        let normalized = sanitize(token);
        let action_candidates = self.fuzzy_actions(&normalized, catalog);
        let knowledge_candidates = self.fuzzy_knowledge(&normalized, knowledge);

        let best_action = action_candidates
            .iter()
            .min_by(|a, b| a.score.total_cmp(&b.score))
            .cloned();
        let best_knowledge = knowledge_candidates
            .iter()
            .min_by(|a, b| a.score.total_cmp(&b.score))
            .cloned();

        let accepted_action = best_action.filter(|c| c.score <= self.strict_threshold);
        let accepted_knowledge = best_knowledge.filter(|c| c.score <= self.strict_threshold);

        match (accepted_action, accepted_knowledge) {
            (Some(a), Some(k)) if k.score < a.score => {
                return TokenMatch::Knowledge {
                    index: k.index,
                    trigger: k.matched,
                };
            }
            (Some(a), _) => {
                return TokenMatch::Action {
                    index: a.index,
                    keyword: a.matched,
                };
            }
            (None, Some(k)) => {
                return TokenMatch::Knowledge {
                    index: k.index,
                    trigger: k.matched,
                };
            }
            (None, None) => {}
        }

        // Confused tier. Near misses are everything the loose cutoff kept.
        let mut near_misses = Vec::new();
        for candidate in &action_candidates {
            for keyword in &catalog.action(candidate.index).keywords {
                push_unique(&mut near_misses, keyword);
            }
        }
        for candidate in &knowledge_candidates {
            for trigger in &knowledge[candidate.index].triggers {
                push_unique(&mut near_misses, trigger);
            }
        }

        TokenMatch::Confused {
            question: token.trim_end().ends_with('?'),
            near_misses,
        }
    }

    fn fuzzy_actions(&self, normalized: &str, catalog: &Catalog) -> Vec<FuzzyCandidate> {
        let introduce_idx = catalog.find(&self.lexicon.introduce_key);
        catalog
            .actions()
            .iter()
            .enumerate()
            // The introduction is forced on the first turn and never
            // fuzzy-matched, so a garbled greeting cannot re-trigger it.
            .filter(|(index, _)| Some(*index) != introduce_idx)
            .filter_map(|(index, action)| {
                best_phrase_score(normalized, &action.keywords).map(|(matched, score)| {
                    FuzzyCandidate {
                        index,
                        matched,
                        score,
                    }
                })
            })
            .filter(|c| c.score <= self.loose_threshold)
            .collect()
    }

    fn fuzzy_knowledge(&self, normalized: &str, knowledge: &[Knowledge]) -> Vec<FuzzyCandidate> {
        knowledge
            .iter()
            .enumerate()
            .filter_map(|(index, fact)| {
                best_phrase_score(normalized, &fact.triggers).map(|(matched, score)| {
                    FuzzyCandidate {
                        index,
                        matched,
                        score,
                    }
                })
            })
            .filter(|c| c.score <= self.loose_threshold)
            .collect()
    }

    /// Append one random reaction of the matched action, and on a coin toss
    /// one random follow-up of that reaction. Both are deduplicated by key.
    fn select_reactions(
        &self,
        action_idx: usize,
        catalog: &Catalog,
        dice: &mut Dice,
        reaction_keys: &mut Vec<String>,
    ) {
        let action = catalog.action(action_idx);
        let Some(&reaction_idx) = dice.pick(&action.reactions) else {
            return;
        };
        let reaction = catalog.action(reaction_idx);
        push_unique(reaction_keys, &reaction.key);

        if dice.coin_toss() {
            if let Some(&follow_up_idx) = dice.pick(&reaction.follow_ups) {
                push_unique(reaction_keys, &catalog.action(follow_up_idx).key);
            }
        }
    }

    /// Append one random filler reaction for a confused non-question token.
    fn select_filler(&self, catalog: &Catalog, dice: &mut Dice, reaction_keys: &mut Vec<String>) {
        let available: Vec<&String> = self
            .lexicon
            .filler_keys
            .iter()
            .filter(|key| catalog.find(key).is_some())
            .collect();
        if let Some(key) = dice.pick(&available) {
            push_unique(reaction_keys, key);
        }
    }
}

/// Best (lowest) score of `normalized` against a set of phrases, with the
/// phrase that produced it. `1 - jaro_winkler` maps similarity onto the
/// lower-is-better scale the thresholds use.
fn best_phrase_score(normalized: &str, phrases: &[String]) -> Option<(String, f64)> {
    phrases
        .iter()
        .map(|phrase| (phrase.clone(), 1.0 - jaro_winkler(normalized, &sanitize(phrase))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Record a taught trigger/response pair.
///
/// Append-only: a response identical to an existing entry's text gains the
/// trigger on that entry instead of creating a duplicate.
pub fn learn(knowledge: &mut Vec<Knowledge>, trigger: &str, response: &str) {
    let response = response.trim();
    if let Some(entry) = knowledge.iter_mut().find(|k| k.response == response) {
        if !entry.triggers.iter().any(|t| t == trigger) {
            entry.triggers.push(trigger.to_string());
        }
        return;
    }
    knowledge.push(Knowledge {
        triggers: vec![trigger.to_string()],
        response: response.to_string(),
    });
}
