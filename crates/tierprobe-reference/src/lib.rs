//! Reference leverage tier tables.
//!
//! Loads the tier schedule published on the exchange website (a static CSV
//! snapshot), checks it for structural integrity, and serves read-only lookups.
//! The store is constructed explicitly and shared via `Arc`; there is no
//! process-global table.

pub mod error;
pub mod integrity;
pub mod loader;
pub mod store;

pub use error::{ReferenceError, ReferenceResult};
pub use integrity::{check_dataset, IntegrityIssue, IntegrityReport, SymbolSummary};
pub use loader::{parse_csv, TierDataset};
pub use store::ReferenceStore;
