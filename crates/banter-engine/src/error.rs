//! Error types for the response engine.

use banter_core::error::BanterError;

/// Errors from the chat engine.
///
/// Matching failures are not errors: "no action matched" and "no knowledge
/// matched" resolve to the confused path, which always yields a reply.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("catalog data error: {0}")]
    Data(String),
    #[error("utterance cannot be empty")]
    EmptyInput,
    #[error("no catalog loaded")]
    CatalogNotLoaded,
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<BanterError> for EngineError {
    fn from(err: BanterError) -> Self {
        EngineError::Data(err.to_string())
    }
}
