//! Validation report for one symbol.

use crate::compare::{compare_pair, MatchKind, TierPair};
use crate::tolerance::Tolerance;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tierprobe_core::{Leverage, Symbol, TierRecord};

/// Structured diff of discovered tiers against reference tiers.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub symbol: Symbol,
    pub generated_at: DateTime<Utc>,
    pub expected_count: usize,
    pub discovered_count: usize,
    pub exact_matches: Vec<TierPair>,
    pub close_matches: Vec<TierPair>,
    pub mismatches: Vec<TierPair>,
    /// Reference tiers beyond the discovered schedule.
    pub missing: Vec<TierRecord>,
    /// Discovered tiers beyond the reference schedule.
    pub extra: Vec<TierRecord>,
    /// Reference leverages that no discovered tier has, descending.
    pub missing_leverages: Vec<Leverage>,
    /// Discovered leverages that no reference tier has, descending.
    pub extra_leverages: Vec<Leverage>,
    /// Number of paired tiers.
    pub total_boundaries: usize,
    /// Exact plus close matches.
    pub boundary_matches: usize,
}

impl ValidationReport {
    /// `boundary_matches / total_boundaries`, or `None` with nothing paired.
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.boundary_matches, self.total_boundaries)
    }

    /// Exact matches over paired tiers.
    pub fn exact_accuracy(&self) -> Option<f64> {
        ratio(self.exact_matches.len(), self.total_boundaries)
    }

    /// Every pair, in tier order.
    pub fn pairs(&self) -> impl Iterator<Item = &TierPair> {
        let mut all: Vec<&TierPair> = self
            .exact_matches
            .iter()
            .chain(&self.close_matches)
            .chain(&self.mismatches)
            .collect();
        all.sort_by_key(|p| p.reference.index);
        all.into_iter()
    }

    /// True when every tier paired and matched on both sides.
    pub fn is_full_match(&self) -> bool {
        self.mismatches.is_empty()
            && self.missing.is_empty()
            && self.extra.is_empty()
            && self.expected_count > 0
    }
}

pub(crate) fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

fn descending_difference(a: &BTreeSet<Leverage>, b: &BTreeSet<Leverage>) -> Vec<Leverage> {
    let mut out: Vec<Leverage> = a.difference(b).copied().collect();
    out.reverse();
    out
}

/// Compare `discovered` against `reference` tier by tier.
///
/// Tiers pair by position up to the shorter schedule. Leftover reference
/// tiers are `missing`, leftover discovered tiers are `extra`.
pub fn validate(
    symbol: &Symbol,
    discovered: &[TierRecord],
    reference: &[TierRecord],
    tolerance: &Tolerance,
) -> ValidationReport {
    let paired = discovered.len().min(reference.len());

    let mut exact_matches = Vec::new();
    let mut close_matches = Vec::new();
    let mut mismatches = Vec::new();

    for (r, d) in reference.iter().zip(discovered) {
        let pair = compare_pair(r, d, tolerance);
        match pair.kind {
            MatchKind::Exact => exact_matches.push(pair),
            MatchKind::Close { .. } => close_matches.push(pair),
            MatchKind::Mismatch { .. } => mismatches.push(pair),
        }
    }

    let reference_levs: BTreeSet<Leverage> = reference.iter().map(|t| t.max_leverage).collect();
    let discovered_levs: BTreeSet<Leverage> = discovered.iter().map(|t| t.max_leverage).collect();

    let boundary_matches = exact_matches.len() + close_matches.len();

    ValidationReport {
        symbol: symbol.clone(),
        generated_at: Utc::now(),
        expected_count: reference.len(),
        discovered_count: discovered.len(),
        exact_matches,
        close_matches,
        mismatches,
        missing: reference[paired..].to_vec(),
        extra: discovered[paired..].to_vec(),
        missing_leverages: descending_difference(&reference_levs, &discovered_levs),
        extra_leverages: descending_difference(&discovered_levs, &reference_levs),
        total_boundaries: paired,
        boundary_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tierprobe_core::Notional;

    fn tier(index: u32, floor: u64, cap: u64, leverage: u32) -> TierRecord {
        TierRecord::new(
            index,
            Notional::from_u64(floor),
            Notional::from_u64(cap),
            Leverage::new(leverage).unwrap(),
        )
    }

    fn btc() -> Symbol {
        Symbol::parse("BTC-USDT").unwrap()
    }

    #[test]
    fn test_identical_tiers_all_exact() {
        let tiers = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 100)];
        let report = validate(&btc(), &tiers, &tiers, &Tolerance::default());

        assert_eq!(report.boundary_matches, 2);
        assert_eq!(report.total_boundaries, 2);
        assert_eq!(report.exact_matches.len(), 2);
        assert!(report.close_matches.is_empty());
        assert_eq!(report.accuracy(), Some(1.0));
        assert_eq!(report.exact_accuracy(), Some(1.0));
        assert!(report.is_full_match());
    }

    #[test]
    fn test_close_match_diff() {
        let reference = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 100)];
        let discovered = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 805_000, 100)];
        let report = validate(&btc(), &discovered, &reference, &Tolerance::default());

        assert_eq!(report.boundary_matches, 2);
        assert_eq!(report.exact_matches.len(), 1);
        assert_eq!(report.close_matches.len(), 1);
        assert_eq!(
            report.close_matches[0].kind,
            MatchKind::Close {
                floor_diff: dec!(0),
                cap_diff: dec!(5000)
            }
        );
        assert_eq!(report.exact_accuracy(), Some(0.5));
    }

    #[test]
    fn test_leverage_mismatch() {
        let reference = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 100)];
        let discovered = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 90)];
        let report = validate(&btc(), &discovered, &reference, &Tolerance::default());

        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].reference.index, 2);
        assert_eq!(report.boundary_matches, 1);
        assert_eq!(report.accuracy(), Some(0.5));
        assert_eq!(report.missing_leverages, vec![Leverage::new(100).unwrap()]);
        assert_eq!(report.extra_leverages, vec![Leverage::new(90).unwrap()]);
    }

    #[test]
    fn test_missing_and_extra_tiers() {
        let reference = vec![
            tier(1, 0, 300_000, 150),
            tier(2, 300_000, 800_000, 100),
            tier(3, 800_000, 3_000_000, 50),
        ];
        let report = validate(&btc(), &reference[..1], &reference, &Tolerance::default());
        assert_eq!(report.total_boundaries, 1);
        assert_eq!(report.missing.len(), 2);
        assert!(report.extra.is_empty());
        assert!(!report.is_full_match());

        let report = validate(&btc(), &reference, &reference[..2], &Tolerance::default());
        assert_eq!(report.total_boundaries, 2);
        assert_eq!(report.extra, vec![reference[2]]);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_nothing_discovered_has_no_accuracy() {
        let reference = vec![tier(1, 0, 300_000, 150)];
        let report = validate(&btc(), &[], &reference, &Tolerance::default());
        assert_eq!(report.accuracy(), None);
        assert_eq!(report.missing.len(), 1);
    }

    #[test]
    fn test_pairs_in_tier_order() {
        let reference = vec![
            tier(1, 0, 300_000, 150),
            tier(2, 300_000, 800_000, 100),
            tier(3, 800_000, 3_000_000, 50),
        ];
        let discovered = vec![
            tier(1, 0, 300_000, 125),
            tier(2, 300_000, 805_000, 100),
            tier(3, 805_000, 3_000_000, 50),
        ];
        let report = validate(&btc(), &discovered, &reference, &Tolerance::default());
        let order: Vec<u32> = report.pairs().map(|p| p.reference.index).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
