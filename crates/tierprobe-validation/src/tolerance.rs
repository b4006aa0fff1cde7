//! Boundary tolerance policy.
//!
//! Notional caps range from tens of thousands to hundreds of millions, so the
//! bound is relative to the reference value, with an absolute floor for small
//! values (tier 1 floor is always 0).

use crate::error::{ValidationError, ValidationResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierprobe_core::Notional;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Allowed difference as a fraction of the reference value.
    #[serde(default = "default_relative")]
    pub relative: Decimal,
    /// Minimum allowed difference in quote currency.
    #[serde(default = "default_min_absolute")]
    pub min_absolute: Decimal,
    /// Differences up to this count as exact.
    #[serde(default)]
    pub epsilon: Decimal,
}

fn default_relative() -> Decimal {
    Decimal::new(5, 2)
}

fn default_min_absolute() -> Decimal {
    Decimal::from(1000)
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: default_relative(),
            min_absolute: default_min_absolute(),
            epsilon: Decimal::ZERO,
        }
    }
}

impl Tolerance {
    /// Largest difference from `reference` that still counts as close.
    pub fn allowed(&self, reference: Notional) -> Decimal {
        (reference.inner() * self.relative).max(self.min_absolute)
    }

    pub fn is_exact(&self, diff: Decimal) -> bool {
        diff <= self.epsilon
    }

    pub fn is_close(&self, reference: Notional, diff: Decimal) -> bool {
        diff <= self.allowed(reference)
    }

    /// Reject negative bounds and an epsilon wider than the close bound.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.relative.is_sign_negative() {
            return Err(ValidationError::InvalidTolerance(format!(
                "relative must be >= 0, got {}",
                self.relative
            )));
        }
        if self.min_absolute.is_sign_negative() {
            return Err(ValidationError::InvalidTolerance(format!(
                "min_absolute must be >= 0, got {}",
                self.min_absolute
            )));
        }
        if self.epsilon.is_sign_negative() || self.epsilon > self.min_absolute {
            return Err(ValidationError::InvalidTolerance(format!(
                "epsilon must be between 0 and min_absolute ({}), got {}",
                self.min_absolute, self.epsilon
            )));
        }
        Ok(())
    }
}
