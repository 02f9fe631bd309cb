use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use narradar_core::config::{load_dotenv, Config};
use narradar_core::signal::SignalBundle;
use narradar_llm::ModelChain;
use narradar_narrative::calibration::evaluate_snapshot_dir;
use narradar_narrative::history::compute_report_diff;
use narradar_narrative::types::SnapshotDocument;
use narradar_pipeline::{run, RunOptions, SnapshotStore};

/// Ecosystem narrative radar — anomaly detection, LLM clustering, and
/// cross-snapshot narrative tracking.
#[derive(Parser, Debug)]
#[command(name = "narradar", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one batch over a collected signal bundle.
    Run {
        /// Path to the collected signal bundle JSON.
        #[arg(long)]
        signals: PathBuf,

        /// Snapshot directory (default from config).
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Override the primary model for this run.
        #[arg(long)]
        model: Option<String>,

        /// Run date (default: today, UTC).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// On model failure, emit an empty narrative set instead of
        /// aborting the run.
        #[arg(long)]
        degrade_empty: bool,

        /// Pretty-print the run report.
        #[arg(long)]
        pretty: bool,
    },

    /// Evaluate confidence calibration over the snapshot history.
    Calibrate {
        /// Snapshot directory (default from config).
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Also write the report to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Diff two snapshot files.
    Diff {
        earlier: PathBuf,
        later: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            signals,
            snapshots,
            model,
            date,
            degrade_empty,
            pretty,
        } => {
            config.log_summary();

            let raw = std::fs::read_to_string(&signals)
                .with_context(|| format!("failed to read signal bundle {}", signals.display()))?;
            let mut bundle: SignalBundle =
                serde_json::from_str(&raw).context("failed to parse signal bundle")?;
            info!(
                "loaded bundle: {} repos, {} protocols, {} tokens, {} topics",
                bundle.repos.len(),
                bundle.protocols.len(),
                bundle.tokens.len(),
                bundle.social.len()
            );

            let chain =
                ModelChain::from_config(&config.llm).context("failed to build model chain")?;
            let store =
                SnapshotStore::new(snapshots.unwrap_or_else(|| config.storage.snapshot_dir.clone()));

            let opts = RunOptions {
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                run_time: Utc::now(),
                z_threshold: config.anomaly.z_threshold,
                matcher: &config.matcher,
                model_override: model.as_deref(),
                degrade_empty,
            };
            let report = run(&mut bundle, &chain, &store, &opts)
                .await
                .context("run failed")?;

            print_json(&report, pretty)?;
        }

        Command::Calibrate { snapshots, out } => {
            let dir = snapshots.unwrap_or_else(|| config.storage.snapshot_dir.clone());
            let report = evaluate_snapshot_dir(&dir, &config.matcher);
            if let Some(path) = out {
                report
                    .write_json(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!("calibration report written to {}", path.display());
            }
            print_json(&report, true)?;
        }

        Command::Diff { earlier, later } => {
            let earlier_doc = load_snapshot(&earlier)?;
            let later_doc = load_snapshot(&later)?;
            let diff =
                compute_report_diff(&later_doc.narratives, &earlier_doc.narratives, &config.matcher);
            print_json(&diff, true)?;
        }
    }

    Ok(())
}

fn load_snapshot(path: &PathBuf) -> Result<SnapshotDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
