// src/main.rs
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use utilization_core::input::{load_entries, load_people, load_targets};
use utilization_core::{
    generate_report, person_detail, AppConfig, DateRangeSpec, EngineConfig, PersonDirectory,
    ReportInputs, TargetTable,
};

/// Builds a utilization report from exported time entries and monthly targets.
#[derive(Parser, Debug)]
#[command(name = "utilization-report", version, about)]
struct Args {
    /// Time entries, `.json` or `.csv`
    #[arg(long)]
    entries: PathBuf,

    /// Monthly targets JSON: { person: { "YYYY-MM": { billableTarget, opsTarget, totalTarget } } }
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Person id to display name JSON map
    #[arg(long)]
    people: Option<PathBuf>,

    /// Visibility rules JSON, overrides REPORT_VISIBILITY_RULES
    #[arg(long)]
    visibility: Option<PathBuf>,

    /// all-time, current-week, current-month, last-month, trailing-60 or custom
    #[arg(long, default_value = "current-month")]
    period: String,

    /// Custom range start (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Custom range end, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Evaluate as of this instant (RFC 3339) instead of the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Restrict to these people (display names); repeatable
    #[arg(long = "person")]
    persons: Vec<String>,

    /// Emit the single-person detail view instead of the full report
    #[arg(long)]
    detail: Option<String>,

    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;

    let args = Args::parse();

    let app_config = AppConfig::from_env().context("Reading REPORT_* configuration failed")?;
    let config = EngineConfig::from_app_config(&app_config, args.visibility.as_ref())
        .context("Building engine configuration failed")?;
    info!("Configuration loaded (timezone {}).", config.timezone.name());
    if config.visibility.is_empty() {
        info!("No visibility rules configured; everyone is displayed.");
    }

    let entries = load_entries(&args.entries)
        .with_context(|| format!("Loading entries from {}", args.entries.display()))?;
    let targets = match &args.targets {
        Some(path) => load_targets(path)
            .with_context(|| format!("Loading targets from {}", path.display()))?,
        None => TargetTable::new(),
    };
    let people = match &args.people {
        Some(path) => load_people(path)
            .with_context(|| format!("Loading people from {}", path.display()))?,
        None => PersonDirectory::new(),
    };
    let period = DateRangeSpec::from_preset(&args.period, args.start, args.end)
        .context("Parsing --period failed")?;

    let inputs = ReportInputs {
        entries: &entries,
        targets: &targets,
        people: &people,
        period: &period,
        now: args.now.unwrap_or_else(Utc::now),
    };

    let output = match &args.detail {
        Some(name) => {
            let detail = person_detail(&inputs, &config, name);
            to_json(&detail, args.pretty)?
        }
        None => {
            let report = generate_report(&inputs, &config, &args.persons);
            to_json(&report, args.pretty)?
        }
    };
    println!("{}", output);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Serializing report failed")
}
