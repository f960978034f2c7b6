use thiserror::Error;

/// Typed error hierarchy for chatrelay.
///
/// Use at module boundaries (provider calls, config validation).
/// Application glue can keep using `anyhow::Result`; the `Internal` variant
/// converts through the `?` operator.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    #[error("Rate limit exceeded")]
    RateLimit { retry_after: Option<u64> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed provider response: {0}")]
    Parse(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Whether this error is transient and the request may be retried.
    ///
    /// Auth, quota and malformed-response errors are final for the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { retryable, .. } => *retryable,
            Self::RateLimit { .. } | Self::Timeout(_) | Self::Transport(_) => true,
            Self::Auth(_)
            | Self::Config(_)
            | Self::Parse(_)
            | Self::Internal(_) => false,
        }
    }
}
