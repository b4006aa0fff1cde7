//! Reference store error types.

use tierprobe_core::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("No reference data for {0}")]
    NotFound(Symbol),

    #[error("Reference parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Reference data integrity check failed: {0}")]
    DataIntegrity(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReferenceResult<T> = Result<T, ReferenceError>;
