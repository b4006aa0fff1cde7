//! Compare discovered leverage tiers against reference data.
//!
//! - `Tolerance`: how far a boundary may drift and still count as a match
//! - `validate`: positional comparison producing a `ValidationReport`
//! - `ValidationSummary`: aggregate over several symbols
//! - `ValidationService`: discovery plus comparison against the reference store

pub mod compare;
pub mod error;
pub mod report;
pub mod service;
pub mod summary;
pub mod tolerance;

pub use compare::{compare_pair, MatchKind, TierPair};
pub use error::{ValidationError, ValidationResult};
pub use report::{validate, ValidationReport};
pub use service::{SymbolOutcome, ValidationBatch, ValidationService, DEFAULT_SYMBOL_DELAY};
pub use summary::ValidationSummary;
pub use tolerance::Tolerance;
