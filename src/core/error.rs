use thiserror::Error;

/// Deterministic computation errors. Retrying with the same inputs yields
/// the same error, so callers surface these directly instead of recovering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("monthly debt obligations leave no capacity for a housing payment")]
    NotAffordable,
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }
}
