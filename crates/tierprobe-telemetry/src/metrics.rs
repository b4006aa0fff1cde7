//! Prometheus metrics for tier discovery and validation.
//!
//! Metrics live in the default registry and are rendered on demand with
//! [`Metrics::render`]; there is no HTTP exporter.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A failure means a
//! duplicate metric name, which is a programming error caught on first use.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram, CounterVec, Encoder, GaugeVec,
    Histogram, TextEncoder,
};

/// Probe results. Labels: outcome (observed/rejected/failed)
pub static PROBES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tierprobe_probes_total",
        "Total leverage probes by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Restore attempts. Labels: outcome (restored/failed)
pub static RESTORE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tierprobe_restore_total",
        "Total leverage restores by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Round trip of a single set-leverage probe.
pub static PROBE_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "tierprobe_probe_latency_ms",
        "Set-leverage probe latency in milliseconds",
        vec![10.0, 25.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0]
    )
    .unwrap()
});

/// Last validation accuracy per symbol, 0.0 - 1.0.
pub static VALIDATION_ACCURACY: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "tierprobe_validation_accuracy",
        "Boundary match ratio of the last validation",
        &["symbol"]
    )
    .unwrap()
});

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Exchange accepted the leverage and reported a max position value.
    Observed,
    /// Exchange declined the leverage.
    Rejected,
    /// Transport or API failure; probe skipped.
    Failed,
}

impl ProbeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Failed,
}

impl RestoreOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restored => "restored",
            Self::Failed => "failed",
        }
    }
}

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a probe result.
    pub fn probe(outcome: ProbeOutcome) {
        PROBES_TOTAL.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn probe_latency(latency_ms: f64) {
        PROBE_LATENCY_MS.observe(latency_ms);
    }

    /// Record a restore result.
    pub fn restore(outcome: RestoreOutcome) {
        RESTORE_TOTAL.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn validation_accuracy(symbol: &str, accuracy: f64) {
        VALIDATION_ACCURACY
            .with_label_values(&[symbol])
            .set(accuracy);
    }

    /// Current count for a probe outcome.
    pub fn probe_count(outcome: ProbeOutcome) -> f64 {
        PROBES_TOTAL.with_label_values(&[outcome.as_str()]).get()
    }

    /// Current count for a restore outcome.
    pub fn restore_count(outcome: RestoreOutcome) -> f64 {
        RESTORE_TOTAL.with_label_values(&[outcome.as_str()]).get()
    }

    /// Render every registered metric in Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let families = prometheus::gather();
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
