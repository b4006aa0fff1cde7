//! Human-readable and JSON rendering of command results.
//!
//! Renderers return `String` so the caller decides where output goes
//! (stdout for results, logs on stderr).

use crate::error::AppResult;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;
use tierprobe_core::{Leverage, Notional, Symbol, TierRecord};
use tierprobe_discovery::{DiscoveryResult, SkipReason};
use tierprobe_reference::{IntegrityReport, ReferenceStore};
use tierprobe_validation::{
    MatchKind, SymbolOutcome, ValidationBatch, ValidationReport, ValidationSummary,
};

/// Format a decimal with `,` thousands separators, keeping any fraction.
pub fn group_thousands(value: Decimal) -> String {
    let normalized = value.normalize().to_string();
    let (sign, unsigned) = match normalized.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", normalized.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

fn notional(value: Notional) -> String {
    group_thousands(value.inner())
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}

/// Tier table, one row per tier.
pub fn tier_table(tiers: &[TierRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:>16} {:>16} {:>8}",
        "Tier", "Floor", "Cap", "Max Lev"
    );
    for tier in tiers {
        let _ = writeln!(
            out,
            "{:<6} {:>16} {:>16} {:>8}",
            tier.index,
            notional(tier.floor),
            notional(tier.cap),
            tier.max_leverage.to_string()
        );
    }
    out
}

pub fn discovery_text(result: &DiscoveryResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Symbol:        {}", result.symbol);
    let _ = writeln!(out, "Restore point: {}", result.restore_point);
    if let Some(max) = result.max_leverage() {
        let _ = writeln!(out, "Max leverage:  {max}");
    }
    let _ = writeln!(
        out,
        "Probes:        {} observed, {} skipped, {} discarded",
        result.observations.len(),
        result.skipped.len(),
        result.discarded.len()
    );
    out.push('\n');
    out.push_str(&tier_table(&result.tiers));

    if !result.skipped.is_empty() {
        out.push_str("\nSkipped probes:\n");
        for skip in &result.skipped {
            let _ = writeln!(out, "  {:>5}  {}", skip.leverage.to_string(), skip_reason(&skip.reason));
        }
    }
    out
}

/// Reference tiers shown when discovery cannot run (no API keys).
pub fn reference_text(symbol: &Symbol, tiers: &[TierRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Reference data for {symbol} (not discovered):");
    out.push('\n');
    out.push_str(&tier_table(tiers));
    out
}

fn skip_reason(reason: &SkipReason) -> String {
    match reason {
        SkipReason::Rejected { code, message } => format!("rejected ({code}): {message}"),
        SkipReason::Failed(message) => format!("failed: {message}"),
    }
}

fn match_label(kind: &MatchKind) -> String {
    match kind {
        MatchKind::Exact => "exact".to_string(),
        MatchKind::Close { floor_diff, cap_diff } => format!(
            "close (floor ±{}, cap ±{})",
            group_thousands(*floor_diff),
            group_thousands(*cap_diff)
        ),
        MatchKind::Mismatch { reason, .. } if !reason.is_empty() => {
            format!("MISMATCH: {reason}")
        }
        MatchKind::Mismatch { floor_diff, cap_diff, .. } => format!(
            "MISMATCH (floor ±{}, cap ±{})",
            group_thousands(*floor_diff),
            group_thousands(*cap_diff)
        ),
    }
}

fn leverage_list(leverages: &[Leverage]) -> String {
    leverages
        .iter()
        .map(Leverage::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn validation_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {}/{} boundaries match ({}), exact {}",
        report.symbol,
        report.boundary_matches,
        report.total_boundaries,
        percent(report.accuracy()),
        percent(report.exact_accuracy())
    );
    let _ = writeln!(
        out,
        "  expected {} tiers, discovered {}",
        report.expected_count, report.discovered_count
    );

    for pair in report.pairs() {
        let _ = writeln!(
            out,
            "  Tier {:<3} ref {:>14} ~ {:<14} {:>5} | found {:>14} ~ {:<14} {:>5} | {}",
            pair.reference.index,
            notional(pair.reference.floor),
            notional(pair.reference.cap),
            pair.reference.max_leverage.to_string(),
            notional(pair.discovered.floor),
            notional(pair.discovered.cap),
            pair.discovered.max_leverage.to_string(),
            match_label(&pair.kind)
        );
    }
    for tier in &report.missing {
        let _ = writeln!(out, "  missing  {tier}");
    }
    for tier in &report.extra {
        let _ = writeln!(out, "  extra    {tier}");
    }
    if !report.missing_leverages.is_empty() {
        let _ = writeln!(
            out,
            "  leverages not discovered: {}",
            leverage_list(&report.missing_leverages)
        );
    }
    if !report.extra_leverages.is_empty() {
        let _ = writeln!(
            out,
            "  leverages not in reference: {}",
            leverage_list(&report.extra_leverages)
        );
    }
    out
}

pub fn summary_text(summary: &ValidationSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Symbols tested:   {}", summary.symbols_tested);
    let _ = writeln!(out, "Reference tiers:  {}", summary.total_expected);
    let _ = writeln!(out, "Paired tiers:     {}", summary.total_paired);
    let _ = writeln!(out, "Exact matches:    {}", summary.exact_matches);
    let _ = writeln!(out, "Close matches:    {}", summary.close_matches);
    let _ = writeln!(out, "Mismatches:       {}", summary.mismatches);
    let _ = writeln!(out, "Missing tiers:    {}", summary.missing_tiers);
    let _ = writeln!(out, "Extra tiers:      {}", summary.extra_tiers);
    let _ = writeln!(out, "Exact accuracy:   {}", percent(summary.exact_accuracy()));
    let _ = writeln!(out, "Total accuracy:   {}", percent(summary.total_accuracy()));
    out
}

pub fn batch_text(batch: &ValidationBatch) -> String {
    let mut out = String::new();
    for outcome in &batch.outcomes {
        match outcome {
            SymbolOutcome::Validated(report) => out.push_str(&validation_text(report)),
            SymbolOutcome::Skipped { symbol, reason } => {
                let _ = writeln!(out, "{symbol}: skipped ({reason})");
            }
            SymbolOutcome::Failed { symbol, error } => {
                let _ = writeln!(out, "{symbol}: FAILED: {error}");
            }
        }
    }
    if batch.stopped_early {
        out.push_str("\nBatch stopped early; remaining symbols were not tested.\n");
    }
    out.push('\n');
    out.push_str(&summary_text(&batch.summary));
    out
}

/// One row of `list`.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolRow {
    pub symbol: Symbol,
    pub tier_count: usize,
    pub max_leverage: Option<Leverage>,
    pub max_position: Option<Notional>,
}

pub fn symbol_rows(store: &ReferenceStore) -> Vec<SymbolRow> {
    store
        .iter()
        .map(|(symbol, tiers)| SymbolRow {
            symbol: symbol.clone(),
            tier_count: tiers.len(),
            max_leverage: tiers.first().map(|t| t.max_leverage),
            max_position: tiers.last().map(|t| t.cap),
        })
        .collect()
}

pub fn symbol_list_text(rows: &[SymbolRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>8} {:>18}",
        "Symbol", "Tiers", "Max Lev", "Max Position"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>8} {:>18}",
            row.symbol.as_str(),
            row.tier_count,
            row.max_leverage.map_or_else(|| "-".to_string(), |l| l.to_string()),
            row.max_position.map_or_else(|| "-".to_string(), notional)
        );
    }
    let _ = writeln!(out, "\n{} symbols", rows.len());
    out
}

pub fn integrity_text(report: &IntegrityReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} symbols, {} distinct leverage values",
        report.summaries.len(),
        report.all_leverages.len()
    );
    let _ = writeln!(out, "Leverages: {}", leverage_list(&report.all_leverages));
    if report.is_clean() {
        out.push_str("No integrity issues.\n");
    } else {
        let _ = writeln!(out, "{} integrity issue(s):", report.issues.len());
        for issue in &report.issues {
            let _ = writeln!(out, "  {issue}");
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct SkippedView {
    leverage: Leverage,
    reason: String,
}

#[derive(Debug, Serialize)]
struct DiscoveryView<'a> {
    symbol: &'a Symbol,
    restore_point: Leverage,
    max_leverage: Option<Leverage>,
    tiers: &'a [TierRecord],
    observations: usize,
    skipped: Vec<SkippedView>,
    discarded: usize,
}

pub fn discovery_json(result: &DiscoveryResult) -> AppResult<String> {
    let view = DiscoveryView {
        symbol: &result.symbol,
        restore_point: result.restore_point,
        max_leverage: result.max_leverage(),
        tiers: &result.tiers,
        observations: result.observations.len(),
        skipped: result
            .skipped
            .iter()
            .map(|s| SkippedView {
                leverage: s.leverage,
                reason: skip_reason(&s.reason),
            })
            .collect(),
        discarded: result.discarded.len(),
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

#[derive(Debug, Serialize)]
struct ReferenceView<'a> {
    symbol: &'a Symbol,
    source: &'static str,
    tiers: &'a [TierRecord],
}

pub fn reference_json(symbol: &Symbol, tiers: &[TierRecord]) -> AppResult<String> {
    let view = ReferenceView {
        symbol,
        source: "reference",
        tiers,
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum OutcomeView<'a> {
    Validated {
        #[serde(flatten)]
        report: &'a ValidationReport,
        accuracy: Option<f64>,
    },
    Skipped {
        symbol: &'a Symbol,
        reason: &'a str,
    },
    Failed {
        symbol: &'a Symbol,
        error: String,
        critical: bool,
    },
}

#[derive(Debug, Serialize)]
struct BatchView<'a> {
    outcomes: Vec<OutcomeView<'a>>,
    summary: &'a ValidationSummary,
    exact_accuracy: Option<f64>,
    total_accuracy: Option<f64>,
    stopped_early: bool,
}

pub fn batch_json(batch: &ValidationBatch) -> AppResult<String> {
    let outcomes = batch
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            SymbolOutcome::Validated(report) => OutcomeView::Validated {
                report,
                accuracy: report.accuracy(),
            },
            SymbolOutcome::Skipped { symbol, reason } => OutcomeView::Skipped { symbol, reason },
            SymbolOutcome::Failed { symbol, error } => OutcomeView::Failed {
                symbol,
                error: error.to_string(),
                critical: error.is_critical(),
            },
        })
        .collect();

    let view = BatchView {
        outcomes,
        summary: &batch.summary,
        exact_accuracy: batch.summary.exact_accuracy(),
        total_accuracy: batch.summary.total_accuracy(),
        stopped_early: batch.stopped_early,
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

pub fn symbol_list_json(rows: &[SymbolRow]) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[derive(Debug, Serialize)]
struct IntegrityView {
    symbols: usize,
    leverages: Vec<Leverage>,
    issues: Vec<String>,
}

pub fn integrity_json(report: &IntegrityReport) -> AppResult<String> {
    let view = IntegrityView {
        symbols: report.summaries.len(),
        leverages: report.all_leverages.clone(),
        issues: report.issues.iter().map(ToString::to_string).collect(),
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tierprobe_validation::{validate, Tolerance};

    fn tier(index: u32, floor: u64, cap: u64, leverage: u32) -> TierRecord {
        TierRecord::new(
            index,
            Notional::from_u64(floor),
            Notional::from_u64(cap),
            Leverage::new(leverage).unwrap(),
        )
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(dec!(0)), "0");
        assert_eq!(group_thousands(dec!(999)), "999");
        assert_eq!(group_thousands(dec!(1000)), "1,000");
        assert_eq!(group_thousands(dec!(300000)), "300,000");
        assert_eq!(group_thousands(dec!(150000000)), "150,000,000");
        assert_eq!(group_thousands(dec!(1234567.50)), "1,234,567.5");
        assert_eq!(group_thousands(dec!(-5000)), "-5,000");
    }

    #[test]
    fn test_tier_table() {
        let table = tier_table(&[tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 100)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("300,000"));
        assert!(lines[1].ends_with("150X"));
        assert!(lines[2].contains("800,000"));
    }

    #[test]
    fn test_reference_text_and_json() {
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        let tiers = vec![tier(1, 0, 300_000, 150)];

        let text = reference_text(&symbol, &tiers);
        assert!(text.starts_with("Reference data for BTC-USDT"));
        assert!(text.contains("300,000"));

        let json: serde_json::Value =
            serde_json::from_str(&reference_json(&symbol, &tiers).unwrap()).unwrap();
        assert_eq!(json["source"], "reference");
        assert_eq!(json["tiers"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_validation_text_marks_mismatch() {
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        let reference = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 100)];
        let discovered = vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 90)];
        let report = validate(&symbol, &discovered, &reference, &Tolerance::default());

        let text = validation_text(&report);
        assert!(text.starts_with("BTC-USDT: 1/2 boundaries match (50.0%)"));
        assert!(text.contains("MISMATCH: leverage 90X vs reference 100X"));
        assert!(text.contains("leverages not discovered: 100X"));
    }

    #[test]
    fn test_symbol_rows() {
        let mut dataset = tierprobe_reference::TierDataset::new();
        dataset.insert(
            Symbol::parse("BTC-USDT").unwrap(),
            vec![tier(1, 0, 300_000, 150), tier(2, 300_000, 800_000, 100)],
        );
        let store = ReferenceStore::from_tiers(dataset).unwrap();

        let rows = symbol_rows(&store);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tier_count, 2);
        assert_eq!(rows[0].max_leverage, Some(Leverage::new(150).unwrap()));
        assert_eq!(rows[0].max_position, Some(Notional::from_u64(800_000)));

        let text = symbol_list_text(&rows);
        assert!(text.contains("800,000"));
        assert!(text.contains("1 symbols"));

        let json: serde_json::Value = serde_json::from_str(&symbol_list_json(&rows).unwrap()).unwrap();
        assert_eq!(json[0]["tier_count"], 2);
    }

    #[test]
    fn test_batch_json_tags_outcomes() {
        let symbol = Symbol::parse("BTC-USDT").unwrap();
        let tiers = vec![tier(1, 0, 300_000, 150)];
        let report = validate(&symbol, &tiers, &tiers, &Tolerance::default());
        let batch = ValidationBatch {
            summary: ValidationSummary::from_reports([&report]),
            outcomes: vec![
                SymbolOutcome::Validated(report),
                SymbolOutcome::Skipped {
                    symbol: Symbol::parse("DOGE-USDT").unwrap(),
                    reason: "no reference data".to_string(),
                },
            ],
            stopped_early: false,
        };

        let json: serde_json::Value = serde_json::from_str(&batch_json(&batch).unwrap()).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "validated");
        assert_eq!(json["outcomes"][0]["symbol"], "BTC-USDT");
        assert_eq!(json["outcomes"][0]["accuracy"], 1.0);
        assert_eq!(json["outcomes"][1]["status"], "skipped");
        assert_eq!(json["summary"]["symbols_tested"], 1);
        assert_eq!(json["stopped_early"], false);
    }
}
