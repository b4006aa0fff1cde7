//! Account-state guards.
//!
//! - [`InFlightRegistry`]: at most one discovery per symbol at a time
//! - [`RestoreGuard`]: the original leverage is put back on every exit path

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tierprobe_core::{Leverage, Symbol};
use tierprobe_exchange::{with_retry_when, DynLeverageApi, ExchangeResult, LeverageApi, RetryPolicy};
use tierprobe_telemetry::{Metrics, RestoreOutcome};
use tracing::{error, info, warn};

/// Symbols with a discovery currently running.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<DashMap<Symbol, ()>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `symbol`, or `None` if it is already claimed.
    pub fn try_acquire(&self, symbol: &Symbol) -> Option<InFlightGuard> {
        match self.active.entry(symbol.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightGuard {
                    active: Arc::clone(&self.active),
                    symbol: symbol.clone(),
                })
            }
        }
    }

    pub fn is_active(&self, symbol: &Symbol) -> bool {
        self.active.contains_key(symbol)
    }
}

/// Releases the symbol claim on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<DashMap<Symbol, ()>>,
    symbol: Symbol,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.remove(&self.symbol);
    }
}

/// Puts the account back at its restore point.
///
/// Call [`RestoreGuard::restore`] on every normal exit path. If the guard is
/// dropped without completing a restore (the owning future was dropped), a
/// best-effort restore task is spawned on the current tokio runtime.
///
/// A claim attached with [`RestoreGuard::holding`] is released only after the
/// restore finishes, including the spawned one.
pub struct RestoreGuard {
    api: DynLeverageApi,
    symbol: Symbol,
    restore_point: Leverage,
    policy: RetryPolicy,
    claim: Option<InFlightGuard>,
    armed: bool,
}

impl RestoreGuard {
    pub fn new(
        api: DynLeverageApi,
        symbol: Symbol,
        restore_point: Leverage,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            symbol,
            restore_point,
            policy,
            claim: None,
            armed: true,
        }
    }

    /// Keep `claim` until the account is back at the restore point.
    pub fn holding(mut self, claim: InFlightGuard) -> Self {
        self.claim = Some(claim);
        self
    }

    pub fn restore_point(&self) -> Leverage {
        self.restore_point
    }

    /// Restore the original leverage, retrying per the policy.
    pub async fn restore(mut self) -> ExchangeResult<()> {
        let result =
            restore_leverage(self.api.as_ref(), &self.symbol, self.restore_point, self.policy)
                .await;
        // Only disarm once the attempt finished; a drop mid-await still restores.
        self.armed = false;
        result
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!(
            symbol = %self.symbol,
            restore_point = %self.restore_point,
            "Discovery dropped before restore, spawning restore task"
        );

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(
                symbol = %self.symbol,
                restore_point = %self.restore_point,
                "CRITICAL: no runtime to restore leverage, account may be left at a probe leverage"
            );
            Metrics::restore(RestoreOutcome::Failed);
            return;
        };

        let api = Arc::clone(&self.api);
        let symbol = self.symbol.clone();
        let restore_point = self.restore_point;
        let policy = self.policy;
        let claim = self.claim.take();
        handle.spawn(async move {
            let _ = restore_leverage(api.as_ref(), &symbol, restore_point, policy).await;
            drop(claim);
        });
    }
}

async fn restore_leverage(
    api: &dyn LeverageApi,
    symbol: &Symbol,
    restore_point: Leverage,
    policy: RetryPolicy,
) -> ExchangeResult<()> {
    // Any answer short of an auth failure may clear up; keep trying.
    let result = with_retry_when(
        policy,
        "restore_leverage",
        |e| !e.is_authentication(),
        || api.set_leverage(symbol, restore_point),
    )
    .await;

    match &result {
        Ok(_) => {
            Metrics::restore(RestoreOutcome::Restored);
            info!(%symbol, %restore_point, "Leverage restored");
        }
        Err(e) => {
            Metrics::restore(RestoreOutcome::Failed);
            error!(
                %symbol,
                %restore_point,
                error = %e,
                "CRITICAL: failed to restore leverage"
            );
        }
    }

    result.map(|_| ())
}
