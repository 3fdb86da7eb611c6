//! Claim Predictor - Main Entry Point
//!
//! Serves the prediction form over HTTP, or scores a CSV file offline.

use anyhow::{Context, Result};
use claim_predictor::{
    batch,
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    metrics::PredictionMetrics,
    models::PredictionAdapter,
    report::ReportViewer,
    submission::SubmissionTemplate,
    web::{self, AppState},
    InputCollector,
};
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "claim-predictor", version, about = "Car insurance claim predictor")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the prediction form (default)
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Score a CSV file and write the submission file
    Batch {
        /// Input CSV with policy_id and feature columns
        #[arg(short, long)]
        input: PathBuf,

        /// Output submission CSV (defaults to `batch.output_file_name`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load artifacts and report which assets are available
    Check,
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(format!(
            "claim_predictor={level},tower_http={level}",
            level = config.logging.level
        ))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::load_from_path(&cli.config)?;
    init_logging(&config)?;

    info!(config = %cli.config.display(), "Configuration loaded successfully");

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Command::Batch { input, output } => {
            let output = config.batch_output_path(output);
            run_batch(&config, input, output)
        }
        Command::Check => run_check(&config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    info!("Starting Claim Predictor");

    // Artifacts are required; failing here stops the process
    let adapter = PredictionAdapter::from_config(&config)?;

    let view = ReportViewer::new(&config.report.images_dir).view();
    info!(images = view.images.len(), "Report images available");

    let metrics = Arc::new(PredictionMetrics::new());
    let state = AppState::new(config, adapter, metrics.clone());

    web::serve(state).await?;

    info!("Claim Predictor shutting down...");
    metrics.print_summary();
    Ok(())
}

fn run_batch(config: &AppConfig, input: PathBuf, output: PathBuf) -> Result<()> {
    let start = Instant::now();
    let adapter = PredictionAdapter::from_config(config)?;
    let collector = InputCollector::default();

    let file = File::open(&input).with_context(|| format!("Failed to open {}", input.display()))?;
    let result = batch::score_csv(
        &collector,
        &adapter,
        BufReader::new(file),
        &config.batch.submission_template,
    )
    .with_context(|| format!("Batch prediction failed for {}", input.display()))?;

    fs::write(&output, &result.csv).with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        rows = result.rows,
        positives = result.positives,
        elapsed_ms = start.elapsed().as_millis(),
        "Submission written"
    );
    Ok(())
}

fn run_check(config: &AppConfig) -> Result<()> {
    let adapter = PredictionAdapter::from_config(config)?;
    info!(classifier = %adapter.classifier_name(), "Artifacts loaded");

    match SubmissionTemplate::load(&config.batch.submission_template) {
        Ok(template) => info!(columns = ?template.columns(), "Submission template ok"),
        Err(e) => warn!(error = %e, "Batch mode unavailable"),
    }

    let view = ReportViewer::new(&config.report.images_dir).view();
    match view.warning {
        Some(warning) => warn!(found = view.images.len(), "{}", warning),
        None => info!(found = view.images.len(), "All report images present"),
    }
    Ok(())
}
