//! Leverage tier records and schedule invariants.

use crate::{Leverage, Notional};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One bracket of a leverage tier schedule.
///
/// Positions with notional value in `[floor, cap)` may use at most `max_leverage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRecord {
    /// 1-based tier index (tier 1 = highest leverage, smallest positions).
    pub index: u32,
    /// Lower notional bound.
    pub floor: Notional,
    /// Upper notional bound.
    pub cap: Notional,
    /// Maximum leverage allowed within this tier.
    pub max_leverage: Leverage,
}

impl TierRecord {
    pub fn new(index: u32, floor: Notional, cap: Notional, max_leverage: Leverage) -> Self {
        Self {
            index,
            floor,
            cap,
            max_leverage,
        }
    }
}

impl fmt::Display for TierRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tier {} | {} ~ {} | {}",
            self.index, self.floor, self.cap, self.max_leverage
        )
    }
}

/// One successful probe: leverage set, and the max position value reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeObservation {
    pub leverage_tried: Leverage,
    pub max_position_value: Notional,
    /// Position of this probe in the probe sequence (0-based).
    pub reported_at: usize,
}

/// A violation of the tier schedule invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleViolation {
    /// Tier indices must run 1, 2, 3, ...
    NonContiguousIndex { position: usize, expected: u32, found: u32 },
    /// The first tier must start at zero notional.
    NonZeroFirstFloor { floor: Notional },
    /// Each tier must have `floor < cap`.
    EmptyRange { index: u32, floor: Notional, cap: Notional },
    /// `cap[i]` must equal `floor[i + 1]`.
    Discontinuity { index: u32, cap: Notional, next_floor: Notional },
    /// Leverage must strictly decrease as the tier index grows.
    LeverageNotDecreasing { index: u32, leverage: Leverage, next_leverage: Leverage },
}

impl fmt::Display for ScheduleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonContiguousIndex {
                position,
                expected,
                found,
            } => write!(
                f,
                "tier at position {position} has index {found}, expected {expected}"
            ),
            Self::NonZeroFirstFloor { floor } => {
                write!(f, "first tier floor is {floor}, expected 0")
            }
            Self::EmptyRange { index, floor, cap } => {
                write!(f, "tier {index} has floor {floor} >= cap {cap}")
            }
            Self::Discontinuity {
                index,
                cap,
                next_floor,
            } => write!(
                f,
                "gap between tier {index} and {}: cap {cap} vs next floor {next_floor}",
                index + 1
            ),
            Self::LeverageNotDecreasing {
                index,
                leverage,
                next_leverage,
            } => write!(
                f,
                "leverage does not decrease from tier {index} ({leverage}) to tier {} ({next_leverage})",
                index + 1
            ),
        }
    }
}

/// Check a tier schedule against its structural invariants.
///
/// Returns every violation found, in tier order. An empty schedule is valid.
pub fn check_schedule(tiers: &[TierRecord]) -> Vec<ScheduleViolation> {
    let mut violations = Vec::new();

    if let Some(first) = tiers.first() {
        if !first.floor.is_zero() {
            violations.push(ScheduleViolation::NonZeroFirstFloor { floor: first.floor });
        }
    }

    for (position, tier) in tiers.iter().enumerate() {
        let expected = position as u32 + 1;
        if tier.index != expected {
            violations.push(ScheduleViolation::NonContiguousIndex {
                position,
                expected,
                found: tier.index,
            });
        }
        if tier.floor >= tier.cap {
            violations.push(ScheduleViolation::EmptyRange {
                index: tier.index,
                floor: tier.floor,
                cap: tier.cap,
            });
        }
    }

    for pair in tiers.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.cap != next.floor {
            violations.push(ScheduleViolation::Discontinuity {
                index: current.index,
                cap: current.cap,
                next_floor: next.floor,
            });
        }
        if next.max_leverage >= current.max_leverage {
            violations.push(ScheduleViolation::LeverageNotDecreasing {
                index: current.index,
                leverage: current.max_leverage,
                next_leverage: next.max_leverage,
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(index: u32, floor: u64, cap: u64, lev: u32) -> TierRecord {
        TierRecord::new(
            index,
            Notional::from_u64(floor),
            Notional::from_u64(cap),
            Leverage::new(lev).unwrap(),
        )
    }

    #[test]
    fn test_valid_schedule() {
        let tiers = vec![
            tier(1, 0, 300_000, 150),
            tier(2, 300_000, 800_000, 100),
            tier(3, 800_000, 3_000_000, 50),
        ];
        assert!(check_schedule(&tiers).is_empty());
        assert!(check_schedule(&[]).is_empty());
    }

    #[test]
    fn test_floor_not_below_cap_rejected() {
        let tiers = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 300_000, 100)];
        let violations = check_schedule(&tiers);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0],
            ScheduleViolation::EmptyRange { index: 2, .. }
        ));
    }

    #[test]
    fn test_leverage_must_strictly_decrease() {
        let tiers = vec![tier(1, 0, 300_000, 100), tier(2, 300_000, 800_000, 100)];
        let violations = check_schedule(&tiers);
        assert_eq!(
            violations,
            vec![ScheduleViolation::LeverageNotDecreasing {
                index: 1,
                leverage: Leverage::new(100).unwrap(),
                next_leverage: Leverage::new(100).unwrap(),
            }]
        );
    }

    #[test]
    fn test_gap_and_index_violations() {
        let tiers = vec![tier(1, 10, 300_000, 150), tier(3, 350_000, 800_000, 100)];
        let violations = check_schedule(&tiers);

        assert!(violations.contains(&ScheduleViolation::NonZeroFirstFloor {
            floor: Notional::from_u64(10)
        }));
        assert!(violations
            .iter()
            .any(|v| matches!(v, ScheduleViolation::NonContiguousIndex { found: 3, .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, ScheduleViolation::Discontinuity { index: 1, .. })));
    }

    #[test]
    fn test_violation_display() {
        let v = ScheduleViolation::Discontinuity {
            index: 2,
            cap: Notional::from_u64(800_000),
            next_floor: Notional::from_u64(900_000),
        };
        assert_eq!(
            v.to_string(),
            "gap between tier 2 and 3: cap 800000 vs next floor 900000"
        );
    }
}
