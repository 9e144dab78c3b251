//! Tallyboard snapshot CLI
//!
//! Loads a record file, runs one recompute pass over the configured charts and
//! prints the resulting dashboard as JSON.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tallyboard::time::parse_date;
use tallyboard::{
    load_records, ChartSpec, ControllerConfig, DateRange, InMemoryStore, JsonFileSource,
    Record, RecomputeController, SourceError, TallyError, TallyResult, VersionedStore,
};

/// Render a dashboard snapshot from a JSON record file
#[derive(Parser, Clone, Debug)]
#[command(name = "tallyboard")]
#[command(about = "Aggregate person records into chart series and print them as JSON")]
struct Config {
    /// JSON array of records
    #[arg(long)]
    records: PathBuf,

    /// JSON array of chart definitions (defaults to the built-in charts)
    #[arg(long)]
    charts: Option<PathBuf>,

    /// First birthdate to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, requires = "to")]
    from: Option<NaiveDate>,

    /// Last birthdate to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, requires = "from")]
    to: Option<NaiveDate>,

    /// Debounce window for the recompute worker
    #[arg(long, default_value = "30")]
    debounce_ms: u64,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,
}

fn read_charts(path: Option<&PathBuf>) -> TallyResult<Vec<ChartSpec>> {
    let Some(path) = path else {
        return Ok(ChartSpec::defaults());
    };
    let raw = fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let charts: Vec<ChartSpec> = serde_json::from_str(&raw).map_err(SourceError::from)?;
    Ok(charts)
}

fn run(config: &Config) -> TallyResult<()> {
    let records: Arc<InMemoryStore<Record>> = Arc::new(InMemoryStore::new("records"));
    let charts: Arc<InMemoryStore<ChartSpec>> = Arc::new(InMemoryStore::new("charts"));

    charts.replace_all(read_charts(config.charts.as_ref())?)?;
    load_records(records.as_ref(), &JsonFileSource::new(&config.records))?;

    let controller = RecomputeController::spawn(
        records,
        charts,
        ControllerConfig {
            debounce: Duration::from_millis(config.debounce_ms),
            ..ControllerConfig::default()
        },
    )?;

    if let (Some(from), Some(to)) = (config.from, config.to) {
        controller.set_range(DateRange::new(from, to)?)?;
    }

    let dashboard = controller.flush()?;
    info!(
        pass = dashboard.pass,
        records = dashboard.record_count,
        charts = dashboard.charts.len(),
        "dashboard ready"
    );

    let out = if config.compact {
        serde_json::to_string(&dashboard)
    } else {
        serde_json::to_string_pretty(&dashboard)
    }
    .map_err(|e| TallyError::internal(format!("failed to encode dashboard: {e}")))?;
    println!("{out}");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tallyboard=info".into()),
        )
        .init();

    let config = Config::parse();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
