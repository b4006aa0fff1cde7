//! Offline integrity check of the reference dataset.
//!
//! Runs without network access. Every symbol's schedule must satisfy the tier
//! invariants (contiguous ranges, `floor < cap`, strictly decreasing leverage).
//! All violations are collected so one pass reports the whole dataset.

use crate::loader::TierDataset;
use std::collections::BTreeSet;
use tierprobe_core::{check_schedule, Leverage, Notional, ScheduleViolation, Symbol};
use tracing::{info, warn};

/// Per-symbol statistics for offline reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSummary {
    pub symbol: Symbol,
    pub tier_count: usize,
    pub min_leverage: Leverage,
    pub max_leverage: Leverage,
    /// Cap of the topmost tier.
    pub max_position: Notional,
}

/// A schedule violation tied to the symbol it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    pub symbol: Symbol,
    pub violation: ScheduleViolation,
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.symbol, self.violation)
    }
}

/// Result of checking a whole dataset.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    /// Summaries in symbol order.
    pub summaries: Vec<SymbolSummary>,
    /// Violations in symbol order, then tier order.
    pub issues: Vec<IntegrityIssue>,
    /// Every leverage value in the dataset, descending.
    pub all_leverages: Vec<Leverage>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check every symbol's schedule in the dataset.
pub fn check_dataset(dataset: &TierDataset) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    let mut leverages = BTreeSet::new();

    for (symbol, tiers) in dataset {
        for violation in check_schedule(tiers) {
            warn!(symbol = %symbol, %violation, "Reference tier violation");
            report.issues.push(IntegrityIssue {
                symbol: symbol.clone(),
                violation,
            });
        }

        let (Some(min_leverage), Some(max_leverage), Some(max_position)) = (
            tiers.iter().map(|t| t.max_leverage).min(),
            tiers.iter().map(|t| t.max_leverage).max(),
            tiers.iter().map(|t| t.cap).max(),
        ) else {
            continue;
        };

        leverages.extend(tiers.iter().map(|t| t.max_leverage));
        report.summaries.push(SymbolSummary {
            symbol: symbol.clone(),
            tier_count: tiers.len(),
            min_leverage,
            max_leverage,
            max_position,
        });
    }

    report.all_leverages = leverages.into_iter().rev().collect();

    info!(
        symbols = report.summaries.len(),
        issues = report.issues.len(),
        "Reference integrity check complete"
    );

    report
}
