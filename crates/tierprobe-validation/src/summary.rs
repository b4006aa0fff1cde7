//! Aggregate over several validation reports.

use crate::report::{ratio, ValidationReport};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub symbols_tested: usize,
    /// Reference tiers across all symbols.
    pub total_expected: usize,
    pub total_paired: usize,
    pub exact_matches: usize,
    pub close_matches: usize,
    pub mismatches: usize,
    pub missing_tiers: usize,
    pub extra_tiers: usize,
    pub missing_leverages: usize,
}

impl ValidationSummary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a ValidationReport>) -> Self {
        reports
            .into_iter()
            .fold(Self::default(), |mut acc, report| {
                acc.symbols_tested += 1;
                acc.total_expected += report.expected_count;
                acc.total_paired += report.total_boundaries;
                acc.exact_matches += report.exact_matches.len();
                acc.close_matches += report.close_matches.len();
                acc.mismatches += report.mismatches.len();
                acc.missing_tiers += report.missing.len();
                acc.extra_tiers += report.extra.len();
                acc.missing_leverages += report.missing_leverages.len();
                acc
            })
    }

    /// Exact matches over all reference tiers.
    pub fn exact_accuracy(&self) -> Option<f64> {
        ratio(self.exact_matches, self.total_expected)
    }

    /// Exact plus close matches over all reference tiers. Missing tiers count
    /// against this, unlike the per-symbol boundary accuracy.
    pub fn total_accuracy(&self) -> Option<f64> {
        ratio(self.exact_matches + self.close_matches, self.total_expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::validate;
    use crate::tolerance::Tolerance;
    use tierprobe_core::{Leverage, Notional, Symbol, TierRecord};

    fn tier(index: u32, floor: u64, cap: u64, leverage: u32) -> TierRecord {
        TierRecord::new(
            index,
            Notional::from_u64(floor),
            Notional::from_u64(cap),
            Leverage::new(leverage).unwrap(),
        )
    }

    #[test]
    fn test_summary_aggregates() {
        let btc_ref = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 100)];
        let btc_found = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 805_000, 100)];
        let eth_ref = vec![
            tier(1, 0, 200_000, 100),
            tier(2, 200_000, 1_000_000, 75),
            tier(3, 1_000_000, 5_000_000, 50),
        ];
        let eth_found = vec![tier(1, 0, 200_000, 100), tier(2, 200_000, 1_000_000, 75)];

        let tol = Tolerance::default();
        let reports = vec![
            validate(&Symbol::parse("BTC-USDT").unwrap(), &btc_found, &btc_ref, &tol),
            validate(&Symbol::parse("ETH-USDT").unwrap(), &eth_found, &eth_ref, &tol),
        ];
        let summary = ValidationSummary::from_reports(&reports);

        assert_eq!(summary.symbols_tested, 2);
        assert_eq!(summary.total_expected, 5);
        assert_eq!(summary.total_paired, 4);
        assert_eq!(summary.exact_matches, 3);
        assert_eq!(summary.close_matches, 1);
        assert_eq!(summary.missing_tiers, 1);
        assert_eq!(summary.missing_leverages, 1);
        assert_eq!(summary.exact_accuracy(), Some(0.6));
        assert_eq!(summary.total_accuracy(), Some(0.8));
    }

    #[test]
    fn test_empty_summary() {
        let summary = ValidationSummary::from_reports(&[]);
        assert_eq!(summary.symbols_tested, 0);
        assert_eq!(summary.total_accuracy(), None);
    }
}
