//! Tier discovery engine.
//!
//! One run for one symbol:
//! 1. Claim the symbol (no concurrent runs on the same account and symbol)
//! 2. Read the current leverage as the restore point
//! 3. Set each candidate leverage in plan order, paced
//! 4. Restore the original leverage, whatever happened in step 3
//! 5. Collapse the observations into tiers
//!
//! The engine only ever reads and sets leverage. It never places orders.

use crate::collapse::collapse_observations;
use crate::error::{DiscoveryError, Result};
use crate::guard::{InFlightRegistry, RestoreGuard};
use crate::pacer::ProbePacer;
use crate::plan::ProbePlan;
use std::time::Duration;
use tierprobe_core::{check_schedule, Leverage, ProbeObservation, Symbol, TierRecord};
use tierprobe_exchange::{with_retry, DynLeverageApi, ExchangeError, RetryPolicy};
use tierprobe_telemetry::{Metrics, ProbeOutcome};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Engine settings.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Minimum spacing between probes.
    pub probe_interval: Duration,
    /// Policy for reading the restore point.
    pub read_retry: RetryPolicy,
    /// Policy for restoring leverage.
    pub restore_retry: RetryPolicy,
    /// Plan used by [`TierDiscovery::discover`].
    pub plan: ProbePlan,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_millis(100),
            read_retry: RetryPolicy::reads(),
            restore_retry: RetryPolicy::restore(),
            plan: ProbePlan::default(),
        }
    }
}

/// Why a probe produced no observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The exchange declined the leverage (above symbol max or account limit).
    Rejected { code: i64, message: String },
    /// Transport or API failure.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedProbe {
    pub leverage: Leverage,
    pub reason: SkipReason,
}

/// Outcome of a successful discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    pub symbol: Symbol,
    /// Inferred tiers, ascending by index.
    pub tiers: Vec<TierRecord>,
    /// Every accepted probe, in probe order.
    pub observations: Vec<ProbeObservation>,
    pub skipped: Vec<SkippedProbe>,
    /// Observations dropped during collapse.
    pub discarded: Vec<ProbeObservation>,
    /// Leverage in effect before and after the run.
    pub restore_point: Leverage,
}

impl DiscoveryResult {
    /// Highest leverage the account could use on this symbol.
    pub fn max_leverage(&self) -> Option<Leverage> {
        self.tiers.first().map(|t| t.max_leverage)
    }
}

/// Probe-phase results before restore.
#[derive(Debug, Default)]
struct ProbeRun {
    observations: Vec<ProbeObservation>,
    skipped: Vec<SkippedProbe>,
    /// Set when probing stopped early.
    abort: Option<DiscoveryError>,
}

/// Discovers leverage tiers through a [`LeverageApi`](tierprobe_exchange::LeverageApi).
///
/// Clones share the in-flight registry, so concurrent runs for the same
/// symbol through any clone are rejected.
#[derive(Clone)]
pub struct TierDiscovery {
    api: DynLeverageApi,
    config: DiscoveryConfig,
    in_flight: InFlightRegistry,
}

impl TierDiscovery {
    pub fn new(api: DynLeverageApi, config: DiscoveryConfig) -> Self {
        Self {
            api,
            config,
            in_flight: InFlightRegistry::new(),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discover with the configured plan and no external cancellation.
    pub async fn discover(&self, symbol: &Symbol) -> Result<DiscoveryResult> {
        self.discover_with_plan(symbol, &self.config.plan, &CancellationToken::new())
            .await
    }

    /// Discover with an explicit plan. Cancelling `cancel` stops probing;
    /// leverage is still restored before returning [`DiscoveryError::Cancelled`].
    pub async fn discover_with_plan(
        &self,
        symbol: &Symbol,
        plan: &ProbePlan,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryResult> {
        let in_flight = self.in_flight.try_acquire(symbol).ok_or_else(|| {
            warn!(%symbol, "Discovery already in flight, rejecting");
            DiscoveryError::AlreadyInFlight(symbol.clone())
        })?;

        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled(symbol.clone()));
        }

        let api = self.api.as_ref();
        let read = with_retry(self.config.read_retry, "current_leverage", || {
            api.current_leverage(symbol)
        });
        let restore_point = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DiscoveryError::Cancelled(symbol.clone())),
            result = read => result.map_err(|source| {
                error!(%symbol, error = %source, "Failed to read restore point");
                DiscoveryError::RestorePoint {
                    symbol: symbol.clone(),
                    source,
                }
            })?,
        };

        info!(
            %symbol,
            %restore_point,
            probes = plan.len(),
            "Starting tier discovery"
        );

        let guard = RestoreGuard::new(
            self.api.clone(),
            symbol.clone(),
            restore_point,
            self.config.restore_retry,
        )
        .holding(in_flight);
        let run = self.run_probes(symbol, plan, cancel).await;
        let restored = guard.restore().await;

        match (restored, run.abort) {
            (Err(source), original) => Err(DiscoveryError::RestoreFailed {
                symbol: symbol.clone(),
                restore_point,
                source,
                original: original.map(Box::new),
            }),
            (Ok(()), Some(abort)) => Err(abort),
            (Ok(()), None) => {
                if run.observations.is_empty() {
                    warn!(%symbol, skipped = run.skipped.len(), "No probe succeeded");
                    return Err(DiscoveryError::NoObservations {
                        symbol: symbol.clone(),
                        skipped: run.skipped.len(),
                    });
                }

                let collapsed = collapse_observations(symbol, &run.observations);
                for violation in check_schedule(&collapsed.tiers) {
                    // Collapse guarantees the invariants; this would be a bug.
                    error!(%symbol, %violation, "Discovered schedule violates tier invariants");
                }

                info!(
                    %symbol,
                    tiers = collapsed.tiers.len(),
                    observations = run.observations.len(),
                    skipped = run.skipped.len(),
                    "Tier discovery complete"
                );

                Ok(DiscoveryResult {
                    symbol: symbol.clone(),
                    tiers: collapsed.tiers,
                    observations: run.observations,
                    skipped: run.skipped,
                    discarded: collapsed.discarded,
                    restore_point,
                })
            }
        }
    }

    async fn run_probes(
        &self,
        symbol: &Symbol,
        plan: &ProbePlan,
        cancel: &CancellationToken,
    ) -> ProbeRun {
        let mut run = ProbeRun::default();
        let mut pacer = ProbePacer::new(self.config.probe_interval);

        for (position, leverage) in plan.iter().enumerate() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(%symbol, probed = position, "Discovery cancelled");
                    run.abort = Some(DiscoveryError::Cancelled(symbol.clone()));
                    break;
                }
                () = pacer.wait() => {}
            }

            let started = Instant::now();
            let result = self.api.set_leverage(symbol, leverage).await;
            Metrics::probe_latency(started.elapsed().as_secs_f64() * 1000.0);

            match result {
                Ok(update) => {
                    Metrics::probe(ProbeOutcome::Observed);
                    debug!(
                        %symbol,
                        %leverage,
                        max_position = %update.max_position_value,
                        "Probe observed"
                    );
                    run.observations.push(ProbeObservation {
                        leverage_tried: leverage,
                        max_position_value: update.max_position_value,
                        reported_at: position,
                    });
                }
                Err(ExchangeError::LeverageRejected { code, message, .. }) => {
                    Metrics::probe(ProbeOutcome::Rejected);
                    debug!(%symbol, %leverage, code, %message, "Probe rejected");
                    run.skipped.push(SkippedProbe {
                        leverage,
                        reason: SkipReason::Rejected { code, message },
                    });
                }
                Err(e) if e.is_authentication() => {
                    Metrics::probe(ProbeOutcome::Failed);
                    error!(%symbol, %leverage, error = %e, "Authentication failed, aborting discovery");
                    run.abort = Some(DiscoveryError::Aborted {
                        symbol: symbol.clone(),
                        source: e,
                    });
                    break;
                }
                Err(e) => {
                    Metrics::probe(ProbeOutcome::Failed);
                    warn!(%symbol, %leverage, error = %e, "Probe failed, skipping");
                    run.skipped.push(SkippedProbe {
                        leverage,
                        reason: SkipReason::Failed(e.to_string()),
                    });
                }
            }
        }

        run
    }
}
