//! Command orchestration.
//!
//! Coordinates the pieces behind each subcommand:
//! - Reference store (bundled snapshot or `--reference` CSV)
//! - BingX client and listing check
//! - Discovery engine and validation service
//! - Ctrl-C cancellation (probing stops, leverage is still restored)

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::output;
use std::path::PathBuf;
use std::sync::Arc;
use tierprobe_core::{Leverage, Symbol};
use tierprobe_discovery::{DiscoveryResult, ProbePlan, TierDiscovery};
use tierprobe_exchange::{BingxClient, Credentials, DynLeverageApi, ExchangeError};
use tierprobe_reference::{check_dataset, parse_csv, ReferenceStore};
use tierprobe_validation::{SymbolOutcome, ValidationBatch, ValidationService};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Rendered command result plus the failure that decides the exit code.
///
/// Validation and integrity failures still produce a body worth printing.
#[derive(Debug)]
pub struct CommandOutput {
    pub body: String,
    pub failure: Option<AppError>,
}

impl CommandOutput {
    fn ok(body: String) -> Self {
        Self {
            body,
            failure: None,
        }
    }

    fn failed(body: String, failure: AppError) -> Self {
        Self {
            body,
            failure: Some(failure),
        }
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    /// CSV overriding `reference.path` from config.
    reference_override: Option<PathBuf>,
    json: bool,
    cancel: CancellationToken,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            reference_override: None,
            json: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_reference(mut self, path: Option<PathBuf>) -> Self {
        self.reference_override = path;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the run on Ctrl-C. Must be called inside a tokio runtime.
    pub fn spawn_shutdown_listener(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after leverage restore");
                cancel.cancel();
            }
        });
    }

    fn reference_path(&self) -> Option<&PathBuf> {
        self.reference_override
            .as_ref()
            .or(self.config.reference.path.as_ref())
    }

    /// Load the reference store; fails on integrity violations.
    pub fn reference_store(&self) -> AppResult<Arc<ReferenceStore>> {
        let store = match self.reference_path() {
            Some(path) => {
                info!(path = %path.display(), "Loading reference tiers");
                ReferenceStore::from_csv_path(path)?
            }
            None => ReferenceStore::embedded()?,
        };
        Ok(Arc::new(store))
    }

    /// Authenticated client from `BINGX_API_KEY` / `BINGX_API_SECRET`.
    ///
    /// Fails before any request when credentials are missing.
    fn exchange_client(&self) -> AppResult<Arc<BingxClient>> {
        let credentials = Credentials::from_env()?;
        let client = BingxClient::new(self.config.client_config(), Some(credentials))?;
        Ok(Arc::new(client))
    }

    /// Refuse unlisted symbols before touching the account.
    ///
    /// Only a definite "not listed" or an auth failure stops the run; if the
    /// contract list is unavailable discovery goes ahead.
    async fn check_listed(&self, client: &BingxClient, symbol: &Symbol) -> AppResult<()> {
        match client.contract(symbol).await {
            Ok(Some(contract)) => {
                info!(
                    %symbol,
                    max_long = ?contract.max_long_leverage,
                    max_short = ?contract.max_short_leverage,
                    "Contract listed"
                );
                Ok(())
            }
            Ok(None) => Err(AppError::NotListed(symbol.to_string())),
            Err(e @ ExchangeError::Authentication(_)) => Err(e.into()),
            Err(e) => {
                warn!(%symbol, error = %e, "Contract lookup failed, continuing");
                Ok(())
            }
        }
    }

    fn discovery(&self, api: DynLeverageApi) -> AppResult<TierDiscovery> {
        Ok(TierDiscovery::new(api, self.config.discovery_config()?))
    }

    /// Plan for one symbol: explicit `probes` when given, otherwise the
    /// configured plan plus the symbol's reference leverages, if any.
    fn plan_for(
        &self,
        discovery: &TierDiscovery,
        symbol: &Symbol,
        probes: Option<&[u32]>,
    ) -> AppResult<ProbePlan> {
        if let Some(probes) = probes {
            let leverages = probes
                .iter()
                .map(|v| Leverage::new(*v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::InvalidArgument(e.to_string()))?;
            return Ok(ProbePlan::custom(leverages));
        }

        let plan = discovery.config().plan.clone();
        let store = match self.reference_store() {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Reference data unavailable, using configured plan only");
                return Ok(plan);
            }
        };
        match store.leverage_values(symbol) {
            Ok(extra) => Ok(plan.with_additional(extra)),
            Err(_) => Ok(plan),
        }
    }

    /// Discover tiers for `symbol` through `api`.
    pub async fn discover_via(
        &self,
        api: DynLeverageApi,
        symbol: &Symbol,
        probes: Option<&[u32]>,
    ) -> AppResult<DiscoveryResult> {
        let discovery = self.discovery(api)?;
        let plan = self.plan_for(&discovery, symbol, probes)?;
        info!(%symbol, probes = plan.len(), "Starting discovery");
        Ok(discovery
            .discover_with_plan(symbol, &plan, &self.cancel)
            .await?)
    }

    /// Reference tiers for `symbol`, printed when discovery cannot run.
    ///
    /// The command still fails with `cause`; without reference data only
    /// `cause` is returned.
    fn reference_fallback(&self, symbol: &Symbol, cause: AppError) -> AppResult<CommandOutput> {
        let store = match self.reference_store() {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Reference data unavailable");
                return Err(cause);
            }
        };
        let Ok(tiers) = store.lookup(symbol) else {
            return Err(cause);
        };

        info!(%symbol, "Showing reference tiers instead of discovering");
        let body = if self.json {
            output::reference_json(symbol, tiers)?
        } else {
            output::reference_text(symbol, tiers)
        };
        Ok(CommandOutput::failed(body, cause))
    }

    /// `discover <SYMBOL>` against the live exchange.
    ///
    /// Without API keys the symbol's reference tiers are shown instead.
    pub async fn run_discover(&self, symbol: &str, probes: Option<&[u32]>) -> AppResult<CommandOutput> {
        let symbol = Symbol::parse(symbol)?;
        let client = match self.exchange_client() {
            Ok(client) => client,
            Err(e @ AppError::Exchange(ExchangeError::Authentication(_))) => {
                warn!(%symbol, "API keys not configured, cannot discover");
                return self.reference_fallback(&symbol, e);
            }
            Err(e) => return Err(e),
        };
        self.check_listed(&client, &symbol).await?;

        let result = self.discover_via(client, &symbol, probes).await?;
        let body = if self.json {
            output::discovery_json(&result)?
        } else {
            output::discovery_text(&result)
        };
        Ok(CommandOutput::ok(body))
    }

    /// `list`: symbols with reference data.
    pub fn run_list(&self) -> AppResult<CommandOutput> {
        let store = self.reference_store()?;
        let rows = output::symbol_rows(&store);
        let body = if self.json {
            output::symbol_list_json(&rows)?
        } else {
            output::symbol_list_text(&rows)
        };
        Ok(CommandOutput::ok(body))
    }

    /// Symbols to validate: the given ones, or every reference symbol.
    fn validation_targets(&self, store: &ReferenceStore, symbols: &[String]) -> AppResult<Vec<Symbol>> {
        if symbols.is_empty() {
            return Ok(store.list_supported_symbols());
        }
        symbols
            .iter()
            .map(|s| Symbol::parse(s).map_err(AppError::from))
            .collect()
    }

    /// Validate `symbols` (all reference symbols when empty) through `api`.
    pub async fn validate_via(&self, api: DynLeverageApi, symbols: &[String]) -> AppResult<ValidationBatch> {
        let store = self.reference_store()?;
        let targets = self.validation_targets(&store, symbols)?;
        info!(symbols = targets.len(), "Starting validation");

        let service = ValidationService::new(
            self.discovery(api)?,
            store,
            self.config.validation.tolerance,
        )?
        .with_symbol_delay(self.config.symbol_delay())
        .with_cancel_token(self.cancel.clone());

        Ok(service.validate_many(&targets).await)
    }

    /// `validate [SYMBOLS...]` against the live exchange.
    pub async fn run_validate(
        &self,
        symbols: &[String],
        min_accuracy: Option<f64>,
    ) -> AppResult<CommandOutput> {
        if let Some(pct) = min_accuracy {
            if !(0.0..=100.0).contains(&pct) {
                return Err(AppError::InvalidArgument(format!(
                    "--min-accuracy must be within 0..=100, got {pct}"
                )));
            }
        }

        let client = self.exchange_client()?;
        let batch = self.validate_via(client, symbols).await?;
        let body = if self.json {
            output::batch_json(&batch)?
        } else {
            output::batch_text(&batch)
        };

        Ok(match batch_verdict(&batch, min_accuracy) {
            Some(failure) => CommandOutput::failed(body, failure),
            None => CommandOutput::ok(body),
        })
    }

    /// `check`: offline integrity check of the raw reference CSV.
    pub fn run_check(&self) -> AppResult<CommandOutput> {
        let dataset = match self.reference_path() {
            Some(path) => parse_csv(std::fs::File::open(path)?)?,
            None => parse_csv(ReferenceStore::embedded_csv().as_bytes())?,
        };
        let report = check_dataset(&dataset);
        let body = if self.json {
            output::integrity_json(&report)?
        } else {
            output::integrity_text(&report)
        };

        Ok(if report.is_clean() {
            CommandOutput::ok(body)
        } else {
            CommandOutput::failed(body, AppError::Integrity(report.issues.len()))
        })
    }
}

/// Failure that should set a non-zero exit code for a finished batch.
///
/// Failed symbols take precedence over the accuracy threshold.
pub fn batch_verdict(batch: &ValidationBatch, min_accuracy: Option<f64>) -> Option<AppError> {
    let (failed, critical) = batch
        .outcomes
        .iter()
        .fold((0, 0), |(failed, critical), outcome| match outcome {
            SymbolOutcome::Failed { error, .. } if error.is_critical() => (failed + 1, critical + 1),
            SymbolOutcome::Failed { .. } => (failed + 1, critical),
            _ => (failed, critical),
        });
    if failed > 0 {
        return Some(AppError::BatchFailed { failed, critical });
    }

    let required = min_accuracy?;
    let actual = batch.summary.total_accuracy().unwrap_or(0.0) * 100.0;
    (actual < required).then_some(AppError::BelowThreshold { actual, required })
}
