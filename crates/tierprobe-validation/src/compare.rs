//! Per-tier comparison.

use crate::tolerance::Tolerance;
use rust_decimal::Decimal;
use serde::Serialize;
use tierprobe_core::TierRecord;

/// How well one discovered tier matches its reference counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// Same leverage, bounds within epsilon.
    Exact,
    /// Same leverage, bounds within tolerance.
    Close {
        floor_diff: Decimal,
        cap_diff: Decimal,
    },
    /// Different leverage, or a bound outside tolerance.
    Mismatch {
        floor_diff: Decimal,
        cap_diff: Decimal,
        reason: String,
    },
}

impl MatchKind {
    /// Exact or close.
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::Mismatch { .. })
    }
}

/// A reference tier and the discovered tier at the same position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierPair {
    pub reference: TierRecord,
    pub discovered: TierRecord,
    pub kind: MatchKind,
}

/// Compare one pair of tiers.
pub fn compare_pair(reference: &TierRecord, discovered: &TierRecord, tolerance: &Tolerance) -> TierPair {
    let floor_diff = reference.floor.abs_diff(discovered.floor);
    let cap_diff = reference.cap.abs_diff(discovered.cap);

    let kind = if reference.max_leverage != discovered.max_leverage {
        MatchKind::Mismatch {
            floor_diff,
            cap_diff,
            reason: format!(
                "leverage {} vs reference {}",
                discovered.max_leverage, reference.max_leverage
            ),
        }
    } else if tolerance.is_exact(floor_diff) && tolerance.is_exact(cap_diff) {
        MatchKind::Exact
    } else if tolerance.is_close(reference.floor, floor_diff)
        && tolerance.is_close(reference.cap, cap_diff)
    {
        MatchKind::Close {
            floor_diff,
            cap_diff,
        }
    } else {
        let mut out_of_bounds = Vec::new();
        if !tolerance.is_close(reference.floor, floor_diff) {
            out_of_bounds.push(format!(
                "floor off by {floor_diff} (allowed {})",
                tolerance.allowed(reference.floor)
            ));
        }
        if !tolerance.is_close(reference.cap, cap_diff) {
            out_of_bounds.push(format!(
                "cap off by {cap_diff} (allowed {})",
                tolerance.allowed(reference.cap)
            ));
        }
        MatchKind::Mismatch {
            floor_diff,
            cap_diff,
            reason: out_of_bounds.join(", "),
        }
    };

    TierPair {
        reference: *reference,
        discovered: *discovered,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tierprobe_core::{Leverage, Notional};

    fn tier(index: u32, floor: u64, cap: u64, leverage: u32) -> TierRecord {
        TierRecord::new(
            index,
            Notional::from_u64(floor),
            Notional::from_u64(cap),
            Leverage::new(leverage).unwrap(),
        )
    }

    #[test]
    fn test_exact() {
        let t = tier(1, 0, 300_000, 150);
        assert_eq!(compare_pair(&t, &t, &Tolerance::default()).kind, MatchKind::Exact);
    }

    #[test]
    fn test_close_reports_diff() {
        let reference = tier(2, 300_000, 800_000, 100);
        let discovered = tier(2, 300_000, 805_000, 100);

        let pair = compare_pair(&reference, &discovered, &Tolerance::default());
        assert_eq!(
            pair.kind,
            MatchKind::Close {
                floor_diff: dec!(0),
                cap_diff: dec!(5000),
            }
        );
        assert!(pair.kind.is_match());
    }

    #[test]
    fn test_leverage_difference_always_mismatch() {
        let reference = tier(2, 300_000, 800_000, 100);
        let discovered = tier(2, 300_000, 800_000, 90);

        let pair = compare_pair(&reference, &discovered, &Tolerance::default());
        match pair.kind {
            MatchKind::Mismatch { reason, .. } => {
                assert_eq!(reason, "leverage 90X vs reference 100X");
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_bound_outside_tolerance_is_mismatch() {
        let reference = tier(2, 300_000, 800_000, 100);
        let discovered = tier(2, 300_000, 1_000_000, 100);

        let pair = compare_pair(&reference, &discovered, &Tolerance::default());
        match pair.kind {
            MatchKind::Mismatch { cap_diff, reason, .. } => {
                assert_eq!(cap_diff, dec!(200000));
                assert!(reason.contains("cap off by 200000"));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }
}
