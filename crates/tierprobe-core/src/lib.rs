//! Core domain types for leverage tier discovery.
//!
//! This crate provides the types shared by every other crate in the workspace:
//! - `Symbol`: Normalized exchange trading pair (e.g., "BTC-USDT")
//! - `Leverage`, `Notional`: Strongly typed leverage and position values
//! - `TierRecord`: One bracket of a leverage tier schedule
//! - `ProbeObservation`: One (leverage, max position value) sample from probing
//! - `check_schedule`: Structural invariants of a tier schedule

pub mod error;
pub mod notional;
pub mod symbol;
pub mod tier;

pub use error::{CoreError, Result};
pub use notional::{Leverage, Notional};
pub use symbol::Symbol;
pub use tier::{check_schedule, ProbeObservation, ScheduleViolation, TierRecord};
