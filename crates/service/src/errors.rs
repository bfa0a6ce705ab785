use thiserror::Error;

use crate::remote::errors::RemoteError;

#[derive(Debug, Error)]
pub enum PoolError {
    /// No credential in the pool has spare capacity. Surfaced to the caller;
    /// never retried internally.
    #[error("no credential with spare capacity")]
    CapacityExhausted,
    /// A migration was requested but the intended target cannot be
    /// determined. Distinct from CapacityExhausted.
    #[error("cannot determine target credential: {0}")]
    NoTargetCredential(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("remote platform error: {0}")]
    Remote(#[from] RemoteError),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl PoolError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }
}
