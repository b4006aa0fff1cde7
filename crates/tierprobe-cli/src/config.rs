//! Application configuration.
//!
//! Loaded from TOML; every key has a default so an empty file (or no file)
//! is a valid configuration.

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tierprobe_core::Leverage;
use tierprobe_discovery::{DiscoveryConfig, ProbePlan, DEFAULT_PROBE_LEVERAGES};
use tierprobe_exchange::{ClientConfig, RetryPolicy, DEFAULT_BASE_URL};
use tierprobe_validation::Tolerance;

/// Config path used when neither `--config` nor `TIERPROBE_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Overrides `exchange.base_url`.
pub const BASE_URL_ENV: &str = "BINGX_BASE_URL";

/// Exchange connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Discovery engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    /// Minimum spacing between probes (ms). Default: 100.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Candidate leverages. Sorted descending and deduplicated on use.
    #[serde(default = "default_probe_leverages")]
    pub probe_leverages: Vec<u32>,
    /// Retry policy for reading the current leverage.
    #[serde(default = "RetryPolicy::reads")]
    pub read_retry: RetryPolicy,
    /// Retry policy for restoring the original leverage.
    #[serde(default = "RetryPolicy::restore")]
    pub restore_retry: RetryPolicy,
}

fn default_probe_interval_ms() -> u64 {
    100
}

fn default_probe_leverages() -> Vec<u32> {
    DEFAULT_PROBE_LEVERAGES.to_vec()
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            probe_interval_ms: default_probe_interval_ms(),
            probe_leverages: default_probe_leverages(),
            read_retry: RetryPolicy::reads(),
            restore_retry: RetryPolicy::restore(),
        }
    }
}

/// Validation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationSettings {
    /// Pause between symbols in a batch (ms). Default: 500.
    #[serde(default = "default_symbol_delay_ms")]
    pub symbol_delay_ms: u64,
    #[serde(default)]
    pub tolerance: Tolerance,
}

fn default_symbol_delay_ms() -> u64 {
    500
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            symbol_delay_ms: default_symbol_delay_ms(),
            tolerance: Tolerance::default(),
        }
    }
}

/// Reference dataset settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceSettings {
    /// CSV in website format. The bundled snapshot is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub reference: ReferenceSettings,
}

impl AppConfig {
    /// Load from `path`, or from the default path if it exists, or defaults.
    ///
    /// An explicitly given path must exist. Env overrides are applied and the
    /// result validated.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                tracing::debug!(path = DEFAULT_CONFIG_PATH, "Config file not found, using defaults");
                Self::default()
            }
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.apply_base_url_override(&base_url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    fn apply_base_url_override(&mut self, base_url: &str) {
        let base_url = base_url.trim();
        if !base_url.is_empty() {
            tracing::info!(base_url, "Base URL overridden from {BASE_URL_ENV}");
            self.exchange.base_url = base_url.to_string();
        }
    }

    /// Reject values that would make a run unsafe or meaningless.
    pub fn validate(&self) -> AppResult<()> {
        if !self.exchange.base_url.starts_with("http://")
            && !self.exchange.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "exchange.base_url must be an http(s) URL, got {:?}",
                self.exchange.base_url
            )));
        }
        if self.exchange.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "exchange.request_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.discovery.probe_interval_ms == 0 {
            return Err(AppError::Config(
                "discovery.probe_interval_ms must be > 0".to_string(),
            ));
        }
        if self.discovery.probe_leverages.contains(&0) {
            return Err(AppError::Config(
                "discovery.probe_leverages must not contain 0".to_string(),
            ));
        }
        if self.discovery.restore_retry.max_attempts == 0 {
            return Err(AppError::Config(
                "discovery.restore_retry.max_attempts must be >= 1".to_string(),
            ));
        }
        self.validation
            .tolerance
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.exchange.base_url.clone(),
            timeout: Duration::from_millis(self.exchange.request_timeout_ms),
        }
    }

    pub fn probe_plan(&self) -> AppResult<ProbePlan> {
        let leverages = self
            .discovery
            .probe_leverages
            .iter()
            .map(|v| Leverage::new(*v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProbePlan::custom(leverages))
    }

    pub fn discovery_config(&self) -> AppResult<DiscoveryConfig> {
        Ok(DiscoveryConfig {
            probe_interval: Duration::from_millis(self.discovery.probe_interval_ms),
            read_retry: self.discovery.read_retry,
            restore_retry: self.discovery.restore_retry,
            plan: self.probe_plan()?,
        })
    }

    pub fn symbol_delay(&self) -> Duration {
        Duration::from_millis(self.validation.symbol_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.exchange.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.discovery.probe_interval_ms, 100);
        assert_eq!(config.discovery.probe_leverages, DEFAULT_PROBE_LEVERAGES.to_vec());
        assert_eq!(config.discovery.restore_retry, RetryPolicy::restore());
        assert_eq!(config.validation.symbol_delay_ms, 500);
        assert_eq!(config.validation.tolerance.relative, dec!(0.05));
        assert!(config.reference.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::from_toml(
            r#"
[exchange]
base_url = "http://127.0.0.1:8080"

[discovery]
probe_interval_ms = 250
probe_leverages = [20, 100, 50]

[discovery.restore_retry]
max_attempts = 12

[validation.tolerance]
relative = 0.1
min_absolute = 500
"#,
        )
        .unwrap();

        assert_eq!(config.exchange.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.exchange.request_timeout_ms, 10_000);
        assert_eq!(config.discovery.restore_retry.max_attempts, 12);
        assert_eq!(config.discovery.restore_retry.base_delay_ms, 200);
        assert_eq!(config.validation.tolerance.relative, dec!(0.1));

        let discovery = config.discovery_config().unwrap();
        assert_eq!(discovery.probe_interval, Duration::from_millis(250));
        let plan: Vec<u32> = discovery.plan.iter().map(|l| l.get()).collect();
        assert_eq!(plan, vec![100, 50, 20, 1]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.discovery.probe_leverages = vec![100, 0];
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = AppConfig::default();
        config.exchange.base_url = "open-api.bingx.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.discovery.probe_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_toml_rejected_on_type_error() {
        assert!(AppConfig::from_toml("[discovery]\nprobe_interval_ms = \"fast\"").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[validation]\nsymbol_delay_ms = 0").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.symbol_delay(), Duration::ZERO);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/tierprobe.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
