//! Action/knowledge catalog: payload parsing and cross-reference resolution.
//!
//! A catalog is immutable once built. Follow-up and reaction key sets are
//! resolved to index sets in a second pass, after all actions exist, so
//! forward references work; dangling keys resolve to nothing rather than
//! erroring.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineError;

/// Wire shape of one action, as supplied by the caller's data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    pub key: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default, rename = "followUpKeys")]
    pub follow_up_keys: Vec<String>,
    #[serde(default, rename = "reactionKeys")]
    pub reaction_keys: Vec<String>,
}

/// A learned trigger/response fact.
///
/// Created at catalog load, or appended at runtime when the engine could not
/// answer a question and the user supplied the missing fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Knowledge {
    #[serde(default)]
    pub triggers: Vec<String>,
    pub response: String,
}

/// The full catalog payload: actions plus the seed knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPayload {
    pub actions: Vec<ActionSpec>,
    #[serde(default, rename = "knowledgeBase")]
    pub knowledge_base: Vec<Knowledge>,
}

/// A named conversational intent with resolved cross-references.
#[derive(Debug, Clone)]
pub struct Action {
    pub key: String,
    /// Trigger phrases that identify this action in user text.
    pub keywords: Vec<String>,
    /// Candidate reply sentences; one is chosen per use.
    pub phrases: Vec<String>,
    /// Indices of actions that may be chained after this one fires.
    pub follow_ups: Vec<usize>,
    /// Indices of actions this one's match is expected to provoke as a reply.
    pub reactions: Vec<usize>,
}

/// Immutable, fully-resolved action table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    actions: Vec<Action>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from a parsed payload.
    ///
    /// Two-pass: materialize every action, then resolve `followUpKeys` /
    /// `reactionKeys` against the full action set. Fails atomically on a
    /// structurally invalid payload (empty or duplicate keys); on failure the
    /// caller's previous catalog remains whatever it was.
    pub fn from_payload(payload: &CatalogPayload) -> Result<Self, EngineError> {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, spec) in payload.actions.iter().enumerate() {
            if spec.key.trim().is_empty() {
                return Err(EngineError::Data(format!("action {} has an empty key", i)));
            }
            if index.insert(spec.key.clone(), i).is_some() {
                return Err(EngineError::Data(format!(
                    "duplicate action key: {}",
                    spec.key
                )));
            }
        }

        let actions = payload
            .actions
            .iter()
            .map(|spec| {
                let resolve = |keys: &[String]| -> Vec<usize> {
                    keys.iter()
                        .filter_map(|key| {
                            let found = index.get(key).copied();
                            if found.is_none() {
                                debug!("dangling reference '{}' in action '{}'", key, spec.key);
                            }
                            found
                        })
                        .collect()
                };
                Action {
                    key: spec.key.clone(),
                    keywords: spec.keywords.clone(),
                    phrases: spec.phrases.clone(),
                    follow_ups: resolve(&spec.follow_up_keys),
                    reactions: resolve(&spec.reaction_keys),
                }
            })
            .collect::<Vec<_>>();

        info!(
            "Catalog loaded: {} actions, {} knowledge entries",
            actions.len(),
            payload.knowledge_base.len()
        );
        Ok(Self { actions, index })
    }

    /// Parse a raw JSON payload and build the catalog plus its seed
    /// knowledge table.
    pub fn from_json(raw: &str) -> Result<(Self, Vec<Knowledge>), EngineError> {
        let payload: CatalogPayload =
            serde_json::from_str(raw).map_err(|e| EngineError::Data(e.to_string()))?;
        let catalog = Self::from_payload(&payload)?;
        Ok((catalog, payload.knowledge_base))
    }

    /// Index of the action with the given key.
    pub fn find(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// The action at `idx`. Indices come from this catalog, so this is total
    /// for any index the catalog handed out.
    pub fn action(&self, idx: usize) -> &Action {
        &self.actions[idx]
    }

    /// All actions in catalog order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
