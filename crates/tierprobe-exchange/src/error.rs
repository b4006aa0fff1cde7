//! Exchange error types.

use tierprobe_core::Leverage;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    /// Missing or invalid credentials. Never retried.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network failure, timeout, rate limit or server-side 5xx.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The exchange declined a leverage value (account limit, above symbol max).
    #[error("Leverage {leverage} rejected (code {code}): {message}")]
    LeverageRejected {
        leverage: Leverage,
        code: i64,
        message: String,
    },

    /// Non-zero business code on a read.
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),
}

impl ExchangeError {
    /// Only transport failures are worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
