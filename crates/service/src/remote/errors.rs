use thiserror::Error;

/// Typed failures from the remote voice platform. `Clone` so mocks can
/// script repeated failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Credential secret rejected by the remote system. Requires operator
    /// intervention; never triggers automatic migration away.
    #[error("credential rejected by remote platform")]
    Auth,
    #[error("rate limited by remote platform")]
    RateLimited,
    #[error("remote registration not found")]
    NotFound,
    #[error("remote call timed out")]
    Timeout,
    #[error("remote platform error: {0}")]
    Unknown(String),
}

impl RemoteError {
    /// Timeouts and rate limits are worth replaying; auth failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Timeout | RemoteError::RateLimited | RemoteError::Unknown(_))
    }
}
