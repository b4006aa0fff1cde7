//! Prometheus metrics and structured logging for tierprobe.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for probes, restores and validation accuracy

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with};
pub use metrics::{Metrics, ProbeOutcome, RestoreOutcome};
