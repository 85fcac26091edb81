//! Rule-based conversational-response engine.
//!
//! Resolves short free-text utterances to catalogued actions or learned
//! knowledge facts, composes replies from pre-authored phrases, and proposes
//! phase-dependent follow-up suggestions to keep the conversation going.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod response;
pub mod rng;
pub mod session;
pub mod suggest;
pub mod tokenizer;
pub mod types;

pub use catalog::{Action, Catalog, CatalogPayload, Knowledge};
pub use engine::ChatEngine;
pub use error::EngineError;
pub use matcher::{MatchOutcome, Matcher, TokenMatch};
pub use response::ResponseBuilder;
pub use rng::Dice;
pub use session::{is_valid_nickname, SessionState};
pub use suggest::SuggestionEngine;
pub use tokenizer::{contains_exact_phrase, sanitize, Tokenizer};
pub use types::{ChatMessage, Owner, ReplyResult, Turn};
