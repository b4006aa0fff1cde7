//! Application error types.

use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const FAILURE: u8 = 1;
    /// Authentication or transport failure talking to the exchange.
    pub const EXCHANGE: u8 = 2;
    /// Leverage could not be restored; check the account manually.
    pub const CRITICAL: u8 = 3;
    /// Validation accuracy below the requested threshold.
    pub const BELOW_THRESHOLD: u8 = 4;
    /// Reference dataset failed the integrity check.
    pub const INTEGRITY: u8 = 5;
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Symbol {0} is not listed on the exchange")]
    NotListed(String),

    #[error("Core error: {0}")]
    Core(#[from] tierprobe_core::CoreError),

    #[error("Reference error: {0}")]
    Reference(#[from] tierprobe_reference::ReferenceError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] tierprobe_exchange::ExchangeError),

    #[error(transparent)]
    Discovery(#[from] tierprobe_discovery::DiscoveryError),

    #[error(transparent)]
    Validation(#[from] tierprobe_validation::ValidationError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tierprobe_telemetry::TelemetryError),

    #[error("Accuracy {actual:.1}% below required {required:.1}%")]
    BelowThreshold { actual: f64, required: f64 },

    #[error("{failed} symbol(s) failed validation, {critical} critical")]
    BatchFailed { failed: usize, critical: usize },

    #[error("Reference dataset has {0} integrity issue(s)")]
    Integrity(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Discovery(e) if e.is_critical() => exit_code::CRITICAL,
            Self::Validation(e) if e.is_critical() => exit_code::CRITICAL,
            Self::Exchange(_) | Self::Discovery(_) => exit_code::EXCHANGE,
            Self::Validation(tierprobe_validation::ValidationError::Discovery(_)) => {
                exit_code::EXCHANGE
            }
            Self::BatchFailed { critical, .. } if *critical > 0 => exit_code::CRITICAL,
            Self::BatchFailed { .. } => exit_code::EXCHANGE,
            Self::BelowThreshold { .. } => exit_code::BELOW_THRESHOLD,
            Self::Integrity(_) => exit_code::INTEGRITY,
            _ => exit_code::FAILURE,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
