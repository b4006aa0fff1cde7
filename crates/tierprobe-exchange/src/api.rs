//! Leverage-setting capability trait.
//!
//! Provides a trait-based abstraction over the two account operations the
//! discovery engine is allowed to perform. This allows for:
//! - Dependency injection for testing
//! - Running the engine against a simulated tier schedule

use crate::error::{ExchangeError, ExchangeResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tierprobe_core::{Leverage, Notional, Symbol, TierRecord};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Exchange response to a successful leverage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeverageUpdate {
    /// Leverage now in effect.
    pub leverage: Leverage,
    /// Largest long position value the exchange permits at this leverage.
    pub max_position_value: Notional,
}

/// Authenticated leverage read/write for one account.
///
/// Implementations must not place orders or touch positions.
pub trait LeverageApi: Send + Sync {
    /// Read the account's current (long side) leverage for a symbol.
    fn current_leverage<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, ExchangeResult<Leverage>>;

    /// Set the account's (long side) leverage for a symbol.
    ///
    /// Fails with [`ExchangeError::LeverageRejected`] when the exchange declines
    /// the value.
    fn set_leverage<'a>(
        &'a self,
        symbol: &'a Symbol,
        leverage: Leverage,
    ) -> BoxFuture<'a, ExchangeResult<LeverageUpdate>>;
}

/// Arc wrapper for LeverageApi trait objects.
pub type DynLeverageApi = Arc<dyn LeverageApi>;

/// Simulated exchange account driven by a fixed tier schedule.
///
/// Setting leverage `L` reports the cap of the deepest tier whose max leverage
/// is still `>= L`, which is how the live exchange behaves. Values above the
/// top tier or above the account limit are rejected.
#[derive(Debug)]
pub struct MockLeverageApi {
    /// Tier schedule, tier 1 first.
    schedule: Vec<TierRecord>,
    /// Account-level cap (KYC/VIP), if any.
    account_limit: Option<Leverage>,
    /// Leverage currently in effect, per symbol.
    current: Mutex<HashMap<String, Leverage>>,
    /// Leverage every symbol starts at.
    initial: Leverage,
    /// Every set_leverage call, in order.
    set_calls: Mutex<Vec<Leverage>>,
    /// Number of current_leverage calls.
    read_calls: Mutex<u32>,
    /// One-shot failures consumed by successive reads.
    read_failures: Mutex<VecDeque<ExchangeError>>,
    /// One-shot failures consumed by sets of a given leverage.
    set_failures: Mutex<HashMap<Leverage, VecDeque<ExchangeError>>>,
    /// Failures returned on every set of a given leverage.
    sticky_failures: Mutex<HashMap<Leverage, ExchangeError>>,
    /// Artificial latency per call.
    latency: Mutex<Option<Duration>>,
}

impl MockLeverageApi {
    /// Create a mock account with the given schedule, starting at `initial`.
    pub fn new(schedule: Vec<TierRecord>, initial: Leverage) -> Self {
        Self {
            schedule,
            account_limit: None,
            current: Mutex::new(HashMap::new()),
            initial,
            set_calls: Mutex::new(Vec::new()),
            read_calls: Mutex::new(0),
            read_failures: Mutex::new(VecDeque::new()),
            set_failures: Mutex::new(HashMap::new()),
            sticky_failures: Mutex::new(HashMap::new()),
            latency: Mutex::new(None),
        }
    }

    /// Cap the leverage this account may use.
    pub fn with_account_limit(mut self, limit: Leverage) -> Self {
        self.account_limit = Some(limit);
        self
    }

    /// Fail the next `current_leverage` call.
    pub fn push_read_failure(&self, error: ExchangeError) {
        self.read_failures.lock().push_back(error);
    }

    /// Fail the next set of `leverage`.
    pub fn push_set_failure(&self, leverage: Leverage, error: ExchangeError) {
        self.set_failures
            .lock()
            .entry(leverage)
            .or_default()
            .push_back(error);
    }

    /// Fail every set of `leverage`.
    pub fn set_sticky_failure(&self, leverage: Leverage, error: ExchangeError) {
        self.sticky_failures.lock().insert(leverage, error);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Leverage currently in effect for a symbol.
    pub fn leverage_of(&self, symbol: &Symbol) -> Leverage {
        self.current
            .lock()
            .get(symbol.as_str())
            .copied()
            .unwrap_or(self.initial)
    }

    /// Every set_leverage call, in order.
    pub fn set_calls(&self) -> Vec<Leverage> {
        self.set_calls.lock().clone()
    }

    pub fn read_calls(&self) -> u32 {
        *self.read_calls.lock()
    }

    /// Cap reported at `leverage`, or None if the schedule does not allow it.
    pub fn max_position_at(&self, leverage: Leverage) -> Option<Notional> {
        self.schedule
            .iter()
            .filter(|t| t.max_leverage >= leverage)
            .last()
            .map(|t| t.cap)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl LeverageApi for MockLeverageApi {
    fn current_leverage<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, ExchangeResult<Leverage>> {
        Box::pin(async move {
            self.simulate_latency().await;
            *self.read_calls.lock() += 1;
            if let Some(error) = self.read_failures.lock().pop_front() {
                return Err(error);
            }
            Ok(self.leverage_of(symbol))
        })
    }

    fn set_leverage<'a>(
        &'a self,
        symbol: &'a Symbol,
        leverage: Leverage,
    ) -> BoxFuture<'a, ExchangeResult<LeverageUpdate>> {
        Box::pin(async move {
            self.simulate_latency().await;
            self.set_calls.lock().push(leverage);

            let one_shot = self
                .set_failures
                .lock()
                .get_mut(&leverage)
                .and_then(VecDeque::pop_front);
            if let Some(error) = one_shot {
                return Err(error);
            }
            if let Some(error) = self.sticky_failures.lock().get(&leverage) {
                return Err(error.clone());
            }

            let over_account_limit = self.account_limit.is_some_and(|limit| leverage > limit);
            let max_position = match self.max_position_at(leverage) {
                Some(cap) if !over_account_limit => cap,
                _ => {
                    return Err(ExchangeError::LeverageRejected {
                        leverage,
                        code: 109_400,
                        message: "leverage exceeds the maximum allowed".to_string(),
                    })
                }
            };

            self.current
                .lock()
                .insert(symbol.as_str().to_string(), leverage);

            Ok(LeverageUpdate {
                leverage,
                max_position_value: max_position,
            })
        })
    }
}
