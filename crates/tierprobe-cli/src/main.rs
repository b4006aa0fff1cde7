//! tierprobe - BingX leverage tier discovery and validation
//!
//! Probes an account's leverage settings to infer the tier schedule of a
//! perpetual contract, then compares it with the schedule published on the
//! exchange website.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tierprobe_cli::error::exit_code;
use tierprobe_cli::{AppConfig, AppError, Application};
use tierprobe_telemetry::logging::DEFAULT_FILTER;
use tierprobe_telemetry::Metrics;
use tracing::info;

/// BingX leverage tier discovery and validation
#[derive(Parser, Debug)]
#[command(name = "tierprobe", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TIERPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Reference CSV (website format) instead of the bundled snapshot
    #[arg(long, global = true)]
    reference: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover the tier schedule of one symbol
    Discover {
        symbol: String,
        /// Leverages to probe instead of the configured plan (e.g. 100,50,20)
        #[arg(long, value_delimiter = ',')]
        probe: Vec<u32>,
    },
    /// List symbols with reference data
    List,
    /// Discover and compare against reference data (all symbols if none given)
    Validate {
        symbols: Vec<String>,
        /// Fail when total accuracy (percent) is below this
        #[arg(long)]
        min_accuracy: Option<f64>,
    },
    /// Check the reference dataset for integrity violations (offline)
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            let code = error
                .downcast_ref::<AppError>()
                .map_or(exit_code::FAILURE, AppError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => DEFAULT_FILTER,
        1 => "debug",
        _ => "trace",
    };
    tierprobe_telemetry::init_logging_with(filter)?;

    info!("Starting tierprobe v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.config.as_deref())?;
    info!(base_url = %config.exchange.base_url, "Configuration loaded");

    let app = Application::new(config)
        .with_reference(cli.reference)
        .with_json(cli.json);
    app.spawn_shutdown_listener();

    let output = match &cli.command {
        Command::Discover { symbol, probe } => {
            let probes = (!probe.is_empty()).then_some(probe.as_slice());
            app.run_discover(symbol, probes).await?
        }
        Command::List => app.run_list()?,
        Command::Validate {
            symbols,
            min_accuracy,
        } => app.run_validate(symbols, *min_accuracy).await?,
        Command::Check => app.run_check()?,
    };

    if output.body.ends_with('\n') {
        print!("{}", output.body);
    } else {
        println!("{}", output.body);
    }

    if cli.metrics {
        eprintln!("{}", Metrics::render()?);
    }

    Ok(match output.failure {
        Some(failure) => {
            eprintln!("error: {failure}");
            ExitCode::from(failure.exit_code())
        }
        None => ExitCode::SUCCESS,
    })
}
