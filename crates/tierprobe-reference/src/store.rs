//! Read-only reference tier store.

use crate::error::{ReferenceError, ReferenceResult};
use crate::integrity::check_dataset;
use crate::loader::{parse_csv, TierDataset};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tierprobe_core::{Leverage, Symbol, TierRecord};
use tracing::{error, info};

/// Snapshot of the website tier table bundled with the crate.
const EMBEDDED_CSV: &str = include_str!("../data/tiers_from_website.csv");

/// Immutable mapping from symbol to its published tier schedule.
///
/// Construction fails with [`ReferenceError::DataIntegrity`] if any schedule
/// violates the tier invariants; a constructed store is always consistent.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    tiers: TierDataset,
}

impl ReferenceStore {
    /// Build a store from already-parsed schedules.
    pub fn from_tiers(tiers: TierDataset) -> ReferenceResult<Self> {
        let report = check_dataset(&tiers);
        if !report.is_clean() {
            let issues: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
            error!(
                issues = issues.len(),
                "Reference dataset failed integrity check"
            );
            return Err(ReferenceError::DataIntegrity(issues.join("; ")));
        }

        info!(symbols = tiers.len(), "Reference store loaded");
        Ok(Self { tiers })
    }

    /// Load from CSV in website format.
    pub fn from_csv_reader<R: Read>(reader: R) -> ReferenceResult<Self> {
        Self::from_tiers(parse_csv(reader)?)
    }

    /// Load from a CSV file on disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> ReferenceResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Load the bundled snapshot.
    pub fn embedded() -> ReferenceResult<Self> {
        Self::from_csv_reader(EMBEDDED_CSV.as_bytes())
    }

    /// Raw CSV of the bundled snapshot, for offline checks.
    pub fn embedded_csv() -> &'static str {
        EMBEDDED_CSV
    }

    /// Tier schedule for a symbol, ordered by index.
    pub fn lookup(&self, symbol: &Symbol) -> ReferenceResult<&[TierRecord]> {
        self.tiers
            .get(symbol)
            .map(Vec::as_slice)
            .ok_or_else(|| ReferenceError::NotFound(symbol.clone()))
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.tiers.contains_key(symbol)
    }

    /// Symbols with reference data, sorted alphabetically.
    pub fn list_supported_symbols(&self) -> Vec<Symbol> {
        // BTreeMap keys are unique and already ordered.
        self.tiers.keys().cloned().collect()
    }

    /// Leverage values of one symbol's tiers, descending.
    pub fn leverage_values(&self, symbol: &Symbol) -> ReferenceResult<Vec<Leverage>> {
        Ok(self
            .lookup(symbol)?
            .iter()
            .map(|t| t.max_leverage)
            .collect())
    }

    /// Every leverage value appearing in the dataset, descending and unique.
    pub fn all_leverage_values(&self) -> Vec<Leverage> {
        let set: BTreeSet<Leverage> = self
            .tiers
            .values()
            .flat_map(|tiers| tiers.iter().map(|t| t.max_leverage))
            .collect();
        set.into_iter().rev().collect()
    }

    /// Iterate over (symbol, tiers) in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &[TierRecord])> {
        self.tiers.iter().map(|(s, t)| (s, t.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}
