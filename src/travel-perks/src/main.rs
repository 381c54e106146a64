//! Travel Perks — per-user booking metrics and perk assignment.
//!
//! Loads session data from CSV, runs the batch computation, and writes one
//! row per eligible user.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use perks_batch::BatchManager;
use perks_core::config::{OutputFormat, PerksConfig};
use perks_core::{Flight, Hotel, Session, SessionRow, User};
use perks_ingest::{join_tables, read_file, AssignmentWriter, LoadReport};
use perks_segmentation::PerkClassifier;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "travel-perks")]
#[command(about = "Assign promotional perks from travel booking behavior")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables still apply on top)
    #[arg(long, global = true, env = "TRAVEL_PERKS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute metrics and perks for every eligible user
    Run(RunArgs),

    /// Print the ordered perk rule table with effective thresholds
    Rules,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Denormalized session-row CSV
    #[arg(long, conflicts_with_all = ["users", "sessions", "flights", "hotels"])]
    rows: Option<PathBuf>,

    /// Users table CSV
    #[arg(long, requires_all = ["sessions", "flights", "hotels"])]
    users: Option<PathBuf>,

    /// Sessions table CSV
    #[arg(long)]
    sessions: Option<PathBuf>,

    /// Flights table CSV
    #[arg(long)]
    flights: Option<PathBuf>,

    /// Hotels table CSV
    #[arg(long)]
    hotels: Option<PathBuf>,

    /// Only sessions after this date count (overrides config)
    #[arg(long, env = "TRAVEL_PERKS__ELIGIBILITY__CUTOFF_DATE")]
    cutoff_date: Option<NaiveDate>,

    /// Users need more than this many sessions (overrides config)
    #[arg(long, env = "TRAVEL_PERKS__ELIGIBILITY__MIN_SESSIONS")]
    min_sessions: Option<usize>,

    /// Worker count (overrides config)
    #[arg(long, env = "TRAVEL_PERKS__BATCH__WORKERS")]
    workers: Option<usize>,

    /// Date ages are computed at (defaults to today)
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    /// Output format: csv or jsonl (overrides config)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the run summary as JSON to stderr
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Write run counters in Prometheus text format to this file
    #[arg(long)]
    metrics: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_perks=info,perks_batch=info,perks_ingest=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Rules => print_rules(&config),
        Commands::Run(args) => {
            let recorder = PrometheusBuilder::new()
                .install_recorder()
                .context("installing metrics recorder")?;
            apply_overrides(&mut config, &args);
            run(config, args, recorder).await
        }
    }
}

/// A config file or environment value that fails to parse aborts the run.
fn load_config(path: Option<&Path>) -> anyhow::Result<PerksConfig> {
    match path {
        Some(path) => PerksConfig::load(Some(path))
            .with_context(|| format!("loading config {}", path.display())),
        None => PerksConfig::load(None).context("loading config from environment"),
    }
}

fn apply_overrides(config: &mut PerksConfig, args: &RunArgs) {
    if let Some(date) = args.cutoff_date {
        config.eligibility.cutoff_date = date;
    }
    if let Some(n) = args.min_sessions {
        config.eligibility.min_sessions = n;
    }
    if let Some(n) = args.workers {
        config.batch.workers = n;
    }
    if let Some(date) = args.reference_date {
        config.batch.reference_date = Some(date);
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
}

fn load_rows(args: &RunArgs) -> anyhow::Result<LoadReport<SessionRow>> {
    if let Some(path) = &args.rows {
        return read_file::<SessionRow>(path)
            .with_context(|| format!("reading {}", path.display()));
    }

    match (&args.users, &args.sessions, &args.flights, &args.hotels) {
        (Some(u), Some(s), Some(f), Some(h)) => {
            let users = read_file::<User>(u).with_context(|| format!("reading {}", u.display()))?;
            let sessions =
                read_file::<Session>(s).with_context(|| format!("reading {}", s.display()))?;
            let flights =
                read_file::<Flight>(f).with_context(|| format!("reading {}", f.display()))?;
            let hotels =
                read_file::<Hotel>(h).with_context(|| format!("reading {}", h.display()))?;

            let mut joined = join_tables(&users, &sessions, &flights, &hotels);
            let mut errors = Vec::new();
            for report_errors in [users.errors, sessions.errors, flights.errors, hotels.errors] {
                errors.extend(report_errors);
            }
            errors.append(&mut joined.errors);
            joined.errors = errors;
            Ok(joined)
        }
        _ => anyhow::bail!("provide --rows, or all of --users --sessions --flights --hotels"),
    }
}

async fn run(
    config: PerksConfig,
    args: RunArgs,
    recorder: PrometheusHandle,
) -> anyhow::Result<()> {
    info!(
        cutoff = %config.eligibility.cutoff_date,
        min_sessions = config.eligibility.min_sessions,
        workers = config.batch.workers,
        format = ?config.output.format,
        "Configuration loaded"
    );

    let report = load_rows(&args)?;
    for row_error in &report.errors {
        warn!(error = %row_error, "Row rejected");
    }
    let rejected = report.errors.len();

    let manager = BatchManager::new(&config);
    let mut output = manager.run(report.into_values()).await?;
    output.summary.rows_rejected = rejected;

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::BufWriter::new(std::io::stdout().lock())),
    };
    let mut writer = AssignmentWriter::new(config.output.format, sink)?;
    let written = writer.write_all(&output.assignments)?;
    writer.finish()?;

    info!(
        written,
        rejected,
        perks = ?output.summary.perks,
        "Run finished"
    );

    if args.summary {
        eprintln!("{}", serde_json::to_string_pretty(&output.summary)?);
    }

    if let Some(path) = &args.metrics {
        std::fs::write(path, recorder.render())
            .with_context(|| format!("writing metrics {}", path.display()))?;
        info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}

fn print_rules(config: &PerksConfig) -> anyhow::Result<()> {
    let classifier = PerkClassifier::from_thresholds(&config.rules);
    let mut out = std::io::stdout().lock();

    writeln!(
        out,
        "Eligibility: more than {} sessions after {}",
        config.eligibility.min_sessions, config.eligibility.cutoff_date
    )?;
    for (i, rule) in classifier.rules().iter().enumerate() {
        writeln!(out, "{}. {} -> {}  [{}]", i + 1, rule.criteria, rule.perk, rule.name)?;
    }
    writeln!(out, "default -> {}", classifier.default_perk())?;
    Ok(())
}
