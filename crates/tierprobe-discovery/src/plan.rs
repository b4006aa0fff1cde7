//! Probe plans: which leverages to try, in which order.

use std::collections::BTreeSet;
use tierprobe_core::Leverage;

/// Candidates tried when the caller gives none. Covers every tier leverage
/// published for BingX perpetuals, so tiers such as 34X or 4X are not merged
/// into their neighbours.
pub const DEFAULT_PROBE_LEVERAGES: [u32; 30] = [
    250, 200, 150, 125, 100, 75, 50, 40, 34, 30, 25, 20, 19, 17, 16, 15, 14, 13, 12, 11, 10, 9, 8,
    7, 6, 5, 4, 3, 2, 1,
];

/// Strictly descending list of candidate leverages, always ending at 1x.
///
/// Tier detection depends on the descending order: each new, larger max
/// position value marks a tier boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePlan {
    leverages: Vec<Leverage>,
}

impl Default for ProbePlan {
    fn default() -> Self {
        Self::custom(
            DEFAULT_PROBE_LEVERAGES
                .iter()
                .copied()
                .filter_map(|v| Leverage::new(v).ok()),
        )
    }
}

impl ProbePlan {
    /// Build a plan from arbitrary values: deduplicated, sorted descending,
    /// with 1x appended if absent.
    pub fn custom(leverages: impl IntoIterator<Item = Leverage>) -> Self {
        let mut set: BTreeSet<Leverage> = leverages.into_iter().collect();
        set.insert(Leverage::ONE);
        Self {
            leverages: set.into_iter().rev().collect(),
        }
    }

    /// This plan plus `extra` candidates (e.g. reference tier leverages).
    pub fn with_additional(&self, extra: impl IntoIterator<Item = Leverage>) -> Self {
        Self::custom(self.leverages.iter().copied().chain(extra))
    }

    pub fn leverages(&self) -> &[Leverage] {
        &self.leverages
    }

    pub fn iter(&self) -> impl Iterator<Item = Leverage> + '_ {
        self.leverages.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.leverages.len()
    }

    /// Never true: every plan contains 1x.
    pub fn is_empty(&self) -> bool {
        self.leverages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levs(values: &[u32]) -> Vec<Leverage> {
        values.iter().map(|v| Leverage::new(*v).unwrap()).collect()
    }

    fn values(plan: &ProbePlan) -> Vec<u32> {
        plan.iter().map(|l| l.get()).collect()
    }

    #[test]
    fn test_default_plan() {
        let plan = ProbePlan::default();
        assert_eq!(values(&plan), DEFAULT_PROBE_LEVERAGES.to_vec());
    }

    #[test]
    fn test_default_plan_covers_low_tiers() {
        let plan = ProbePlan::default();
        assert_eq!(plan.len(), 30);
        assert_eq!(plan.leverages().first(), Some(&Leverage::new(250).unwrap()));
        for value in [34, 19, 4] {
            assert!(plan.leverages().contains(&Leverage::new(value).unwrap()));
        }
    }

    #[test]
    fn test_custom_plan_sorted_deduped_with_one() {
        let plan = ProbePlan::custom(levs(&[20, 100, 50, 100]));
        assert_eq!(values(&plan), vec![100, 50, 20, 1]);
    }

    #[test]
    fn test_with_additional_merges() {
        let plan = ProbePlan::custom(levs(&[100, 50])).with_additional(levs(&[75, 50, 200]));
        assert_eq!(values(&plan), vec![200, 100, 75, 50, 1]);
    }

    #[test]
    fn test_plan_never_empty() {
        let plan = ProbePlan::custom(Vec::new());
        assert_eq!(values(&plan), vec![1]);
        assert!(!plan.is_empty());
    }
}
