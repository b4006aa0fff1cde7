//! CSV loader for website tier tables.
//!
//! Format (one row per tier):
//!
//! ```text
//! Pair,Tier,Position (Notional Value),Max. Leverage
//! BTCUSDT,Tier 1,0 ~ 300000,150X
//! ```

use crate::error::{ReferenceError, ReferenceResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use tierprobe_core::{Leverage, Notional, Symbol, TierRecord};
use tracing::debug;

/// Tier schedules keyed by symbol, each sorted by tier index.
pub type TierDataset = BTreeMap<Symbol, Vec<TierRecord>>;

/// Raw CSV row as published on the website.
#[derive(Debug, Deserialize)]
struct RawTierRow {
    #[serde(rename = "Pair")]
    pair: String,
    #[serde(rename = "Tier")]
    tier: String,
    #[serde(rename = "Position (Notional Value)")]
    position: String,
    #[serde(rename = "Max. Leverage")]
    max_leverage: String,
}

/// Parse a tier table from CSV.
///
/// Rows may appear in any order; each symbol's tiers are sorted by index.
/// Structural checks (contiguity, monotonic leverage) are left to
/// [`crate::check_dataset`] so that offline validation can report every issue.
pub fn parse_csv<R: Read>(reader: R) -> ReferenceResult<TierDataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut dataset = TierDataset::new();

    for (row_idx, row) in rdr.deserialize::<RawTierRow>().enumerate() {
        // Header is line 1.
        let line = row_idx as u64 + 2;
        let (symbol, tier) = parse_row(&row?).map_err(|message| ReferenceError::Parse {
            line,
            message,
        })?;
        dataset.entry(symbol).or_default().push(tier);
    }

    for tiers in dataset.values_mut() {
        tiers.sort_by_key(|t| t.index);
    }

    debug!(symbols = dataset.len(), "Parsed reference tier table");
    Ok(dataset)
}

fn parse_row(row: &RawTierRow) -> Result<(Symbol, TierRecord), String> {
    let symbol = Symbol::parse(&row.pair).map_err(|e| e.to_string())?;

    let index = parse_tier_index(&row.tier)?;

    let (floor_str, cap_str) = row
        .position
        .split_once('~')
        .ok_or_else(|| format!("position range '{}' is not 'floor ~ cap'", row.position))?;
    let floor: Notional = floor_str.parse().map_err(|e| format!("floor: {e}"))?;
    let cap: Notional = cap_str.parse().map_err(|e| format!("cap: {e}"))?;

    let max_leverage: Leverage = row
        .max_leverage
        .parse()
        .map_err(|e| format!("max leverage: {e}"))?;

    Ok((symbol, TierRecord::new(index, floor, cap, max_leverage)))
}

/// "Tier 3" -> 3
fn parse_tier_index(raw: &str) -> Result<u32, String> {
    let digits = raw
        .trim()
        .strip_prefix("Tier")
        .unwrap_or(raw)
        .trim();
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => Err(format!("invalid tier label '{raw}'")),
        Ok(index) => Ok(index),
    }
}
