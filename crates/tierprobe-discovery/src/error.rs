//! Discovery error types.

use thiserror::Error;
use tierprobe_core::{Leverage, Symbol};
use tierprobe_exchange::ExchangeError;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Another discovery for the same symbol is running on this account.
    #[error("Discovery already in flight for {0}")]
    AlreadyInFlight(Symbol),

    /// Could not read the current leverage. Nothing was changed.
    #[error("Failed to read restore point for {symbol}: {source}")]
    RestorePoint {
        symbol: Symbol,
        source: ExchangeError,
    },

    /// A fatal error stopped probing. Leverage was restored.
    #[error("Discovery aborted for {symbol}: {source}")]
    Aborted {
        symbol: Symbol,
        source: ExchangeError,
    },

    /// Cancelled by the caller. Leverage was restored if it had been touched.
    #[error("Discovery cancelled for {0}")]
    Cancelled(Symbol),

    /// Every probe was rejected or failed.
    #[error("No probe succeeded for {symbol} ({skipped} skipped)")]
    NoObservations { symbol: Symbol, skipped: usize },

    /// The account may be left at a probe leverage.
    #[error(
        "CRITICAL: failed to restore {symbol} to {restore_point}: {source}{}",
        original_suffix(.original)
    )]
    RestoreFailed {
        symbol: Symbol,
        restore_point: Leverage,
        source: ExchangeError,
        /// Probe-phase error that preceded the restore, if any.
        original: Option<Box<DiscoveryError>>,
    },
}

fn original_suffix(original: &Option<Box<DiscoveryError>>) -> String {
    match original {
        Some(e) => format!(" (after: {e})"),
        None => String::new(),
    }
}

impl DiscoveryError {
    /// True when account state may have been left altered.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::RestoreFailed { .. })
    }

    /// True when the root cause is missing or rejected credentials.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        match self {
            Self::RestorePoint { source, .. } | Self::Aborted { source, .. } => {
                source.is_authentication()
            }
            Self::RestoreFailed {
                source, original, ..
            } => {
                source.is_authentication()
                    || original.as_deref().is_some_and(Self::is_authentication)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> Symbol {
        Symbol::parse("BTC-USDT").unwrap()
    }

    #[test]
    fn test_restore_failed_is_critical_and_reports_original() {
        let err = DiscoveryError::RestoreFailed {
            symbol: btc(),
            restore_point: Leverage::new(20).unwrap(),
            source: ExchangeError::Transport("timeout".to_string()),
            original: Some(Box::new(DiscoveryError::Aborted {
                symbol: btc(),
                source: ExchangeError::Authentication("bad key".to_string()),
            })),
        };
        assert!(err.is_critical());
        assert!(err.is_authentication());

        let text = err.to_string();
        assert!(text.starts_with("CRITICAL: failed to restore BTC-USDT to 20X"));
        assert!(text.contains("(after: Discovery aborted for BTC-USDT"));
    }

    #[test]
    fn test_non_restore_errors_not_critical() {
        assert!(!DiscoveryError::AlreadyInFlight(btc()).is_critical());
        assert!(!DiscoveryError::Cancelled(btc()).is_critical());
        assert!(!DiscoveryError::NoObservations {
            symbol: btc(),
            skipped: 13
        }
        .is_critical());
    }
}
