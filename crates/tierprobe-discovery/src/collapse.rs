//! Collapse probe observations into tier records.

use tierprobe_core::{Notional, ProbeObservation, Symbol, TierRecord};
use tracing::warn;

/// Output of [`collapse_observations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collapsed {
    /// Tiers in ascending index order.
    pub tiers: Vec<TierRecord>,
    /// Observations dropped because they would break the schedule.
    pub discarded: Vec<ProbeObservation>,
}

/// Turn observations, in probe order (descending leverage), into tiers.
///
/// Single pass: a tier starts at the first observation whose max position
/// value is larger than the current tier's cap. That candidate becomes the
/// tier's max leverage and the value its cap. Later observations with the
/// same value belong to the same tier.
///
/// Zero values and values below the current cap cannot come from a
/// well-behaved exchange and are discarded.
pub fn collapse_observations(symbol: &Symbol, observations: &[ProbeObservation]) -> Collapsed {
    let mut out = Collapsed::default();
    let mut current_cap = Notional::ZERO;

    for obs in observations {
        let value = obs.max_position_value;

        if value.is_zero() {
            warn!(
                %symbol,
                leverage = %obs.leverage_tried,
                "Discarding zero max position value"
            );
            out.discarded.push(*obs);
            continue;
        }

        if value == current_cap {
            continue;
        }

        if value < current_cap {
            warn!(
                %symbol,
                leverage = %obs.leverage_tried,
                value = %value,
                current_cap = %current_cap,
                "Discarding non-monotone max position value"
            );
            out.discarded.push(*obs);
            continue;
        }

        if let Some(prev) = out.tiers.last() {
            if obs.leverage_tried >= prev.max_leverage {
                warn!(
                    %symbol,
                    leverage = %obs.leverage_tried,
                    previous = %prev.max_leverage,
                    "Discarding observation out of probe order"
                );
                out.discarded.push(*obs);
                continue;
            }
        }

        let index = out.tiers.len() as u32 + 1;
        out.tiers
            .push(TierRecord::new(index, current_cap, value, obs.leverage_tried));
        current_cap = value;
    }

    out
}
