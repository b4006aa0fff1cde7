//! Precision-safe notional and leverage types.
//!
//! Position limits are reported by the exchange as decimal strings. `Notional`
//! wraps `Decimal` so tier boundaries compare exactly, without the rounding
//! noise a float comparison would introduce.

use crate::error::{CoreError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Non-negative notional value (price × size) in quote currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notional(Decimal);

impl Notional {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a notional value, rejecting negatives.
    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CoreError::InvalidNotional(format!(
                "notional must be non-negative, got {value}"
            )));
        }
        Ok(Self(value.normalize()))
    }

    #[inline]
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Absolute difference between two notional values.
    #[inline]
    pub fn abs_diff(&self, other: Notional) -> Decimal {
        (self.0 - other.0).abs()
    }
}

impl fmt::Display for Notional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Notional {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // Website tables print thousands separators ("1,000,000").
        let value: Decimal = if trimmed.contains(',') {
            trimmed.replace(',', "").parse()?
        } else {
            trimmed.parse()?
        };
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Notional {
    type Error = CoreError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

/// Leverage multiplier (always >= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Leverage(u32);

impl Leverage {
    /// 1x, the lowest leverage every probe plan ends with.
    pub const ONE: Self = Self(1);

    pub fn new(value: u32) -> Result<Self> {
        if value == 0 {
            return Err(CoreError::InvalidLeverage(
                "leverage must be at least 1".to_string(),
            ));
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}X", self.0)
    }
}

impl FromStr for Leverage {
    type Err = CoreError;

    /// Accepts "150", "150X" and "150x".
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_end_matches(['X', 'x']).trim();
        let value: u32 = digits
            .parse()
            .map_err(|_| CoreError::InvalidLeverage(format!("not a leverage value: '{s}'")))?;
        Self::new(value)
    }
}

impl TryFrom<u32> for Leverage {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Leverage> for u32 {
    fn from(leverage: Leverage) -> Self {
        leverage.0
    }
}
