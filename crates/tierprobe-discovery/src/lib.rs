//! Leverage tier discovery by probing.
//!
//! The exchange has no bracket-lookup endpoint, so tiers are inferred: set
//! the account leverage to a descending series of candidates, record the max
//! position value the exchange reports for each, and collapse runs of equal
//! values into tiers. The original leverage is always restored afterwards.
//!
//! - `ProbePlan`: ordered candidate leverages
//! - `ProbePacer`: fixed minimum interval between probes
//! - `collapse_observations`: observations to tier records
//! - `RestoreGuard` / `InFlightRegistry`: account-state safety
//! - `TierDiscovery`: the engine tying these together

pub mod collapse;
pub mod engine;
pub mod error;
pub mod guard;
pub mod pacer;
pub mod plan;

pub use collapse::{collapse_observations, Collapsed};
pub use engine::{DiscoveryConfig, DiscoveryResult, SkipReason, SkippedProbe, TierDiscovery};
pub use error::{DiscoveryError, Result};
pub use guard::{InFlightGuard, InFlightRegistry, RestoreGuard};
pub use pacer::ProbePacer;
pub use plan::{ProbePlan, DEFAULT_PROBE_LEVERAGES};
