//! Validation error types.

use thiserror::Error;
use tierprobe_discovery::DiscoveryError;
use tierprobe_reference::ReferenceError;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Invalid tolerance: {0}")]
    InvalidTolerance(String),
}

impl ValidationError {
    /// True when account state may have been left altered.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Discovery(e) if e.is_critical())
    }

    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Discovery(e) if e.is_authentication())
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
