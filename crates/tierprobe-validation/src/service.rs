//! Discovery plus comparison against the reference store.

use crate::error::{ValidationError, ValidationResult};
use crate::report::{validate, ValidationReport};
use crate::summary::ValidationSummary;
use crate::tolerance::Tolerance;
use std::sync::Arc;
use std::time::Duration;
use tierprobe_core::{Symbol, TierRecord};
use tierprobe_discovery::{DiscoveryError, ProbePlan, TierDiscovery};
use tierprobe_reference::ReferenceStore;
use tierprobe_telemetry::Metrics;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Pause between symbols in a batch.
pub const DEFAULT_SYMBOL_DELAY: Duration = Duration::from_millis(500);

/// Result for one symbol of a batch.
#[derive(Debug)]
pub enum SymbolOutcome {
    Validated(ValidationReport),
    /// No reference data; the account was not touched.
    Skipped { symbol: Symbol, reason: String },
    Failed {
        symbol: Symbol,
        error: ValidationError,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Validated(report) => &report.symbol,
            Self::Skipped { symbol, .. } | Self::Failed { symbol, .. } => symbol,
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validated(report) => Some(report),
            _ => None,
        }
    }
}

/// Outcomes of [`ValidationService::validate_many`].
#[derive(Debug)]
pub struct ValidationBatch {
    pub outcomes: Vec<SymbolOutcome>,
    pub summary: ValidationSummary,
    /// Set when the batch stopped before the last symbol.
    pub stopped_early: bool,
}

impl ValidationBatch {
    pub fn failures(&self) -> impl Iterator<Item = (&Symbol, &ValidationError)> {
        self.outcomes.iter().filter_map(|o| match o {
            SymbolOutcome::Failed { symbol, error } => Some((symbol, error)),
            _ => None,
        })
    }
}

pub struct ValidationService {
    discovery: TierDiscovery,
    reference: Arc<ReferenceStore>,
    tolerance: Tolerance,
    symbol_delay: Duration,
    cancel: CancellationToken,
}

impl ValidationService {
    pub fn new(
        discovery: TierDiscovery,
        reference: Arc<ReferenceStore>,
        tolerance: Tolerance,
    ) -> ValidationResult<Self> {
        tolerance.validate()?;
        Ok(Self {
            discovery,
            reference,
            tolerance,
            symbol_delay: DEFAULT_SYMBOL_DELAY,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_symbol_delay(mut self, delay: Duration) -> Self {
        self.symbol_delay = delay;
        self
    }

    /// Cancel in-progress discovery (and batches) through `token`.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn reference(&self) -> &ReferenceStore {
        &self.reference
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    /// Configured plan plus every leverage the reference lists for `symbol`,
    /// so each reference tier gets probed at its own leverage.
    pub fn probe_plan_for(&self, symbol: &Symbol) -> ValidationResult<ProbePlan> {
        let reference_levs = self.reference.leverage_values(symbol)?;
        Ok(self
            .discovery
            .config()
            .plan
            .with_additional(reference_levs))
    }

    /// Validate one symbol. Runs discovery when `discovered` is `None`.
    ///
    /// Fails with a reference error before touching the account if the
    /// symbol has no reference data.
    pub async fn validate_symbol(
        &self,
        symbol: &Symbol,
        discovered: Option<&[TierRecord]>,
    ) -> ValidationResult<ValidationReport> {
        let reference = self.reference.lookup(symbol)?;

        let report = match discovered {
            Some(tiers) => validate(symbol, tiers, reference, &self.tolerance),
            None => {
                let plan = self.probe_plan_for(symbol)?;
                let result = self
                    .discovery
                    .discover_with_plan(symbol, &plan, &self.cancel)
                    .await?;
                validate(symbol, &result.tiers, reference, &self.tolerance)
            }
        };

        if let Some(accuracy) = report.accuracy() {
            Metrics::validation_accuracy(symbol.as_str(), accuracy);
        }
        info!(
            %symbol,
            expected = report.expected_count,
            discovered = report.discovered_count,
            exact = report.exact_matches.len(),
            close = report.close_matches.len(),
            mismatches = report.mismatches.len(),
            "Validation complete"
        );

        Ok(report)
    }

    /// Validate symbols one after another with a pause in between.
    ///
    /// Symbols without reference data are skipped. A failed discovery is
    /// recorded and the batch continues, except for authentication failures,
    /// restore failures and cancellation, which stop it.
    pub async fn validate_many(&self, symbols: &[Symbol]) -> ValidationBatch {
        let mut outcomes = Vec::with_capacity(symbols.len());
        let mut stopped_early = false;

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.symbol_delay.is_zero() {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => {
                        stopped_early = true;
                        break;
                    }
                    () = tokio::time::sleep(self.symbol_delay) => {}
                }
            }

            if !self.reference.contains(symbol) {
                warn!(%symbol, "No reference data, skipping");
                outcomes.push(SymbolOutcome::Skipped {
                    symbol: symbol.clone(),
                    reason: "no reference data".to_string(),
                });
                continue;
            }

            match self.validate_symbol(symbol, None).await {
                Ok(report) => outcomes.push(SymbolOutcome::Validated(report)),
                Err(e) => {
                    let fatal = e.is_authentication()
                        || e.is_critical()
                        || matches!(e, ValidationError::Discovery(DiscoveryError::Cancelled(_)));
                    if fatal {
                        error!(%symbol, error = %e, "Validation batch stopped");
                    } else {
                        warn!(%symbol, error = %e, "Validation failed, continuing");
                    }
                    outcomes.push(SymbolOutcome::Failed {
                        symbol: symbol.clone(),
                        error: e,
                    });
                    if fatal {
                        stopped_early = true;
                        break;
                    }
                }
            }
        }

        let summary = ValidationSummary::from_reports(outcomes.iter().filter_map(SymbolOutcome::report));
        ValidationBatch {
            outcomes,
            summary,
            stopped_early,
        }
    }
}
