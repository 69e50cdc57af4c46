//! Fraud Sentinel - Main Entry Point
//!
//! Scores a CSV batch of QR payment transactions, applies the triage
//! policy and writes the decorated table.

use anyhow::{Context, Result};
use clap::Parser;
use fraud_sentinel::{
    config::AppConfig, engine::ScoredBatch, models::ArtifactCell, table::Table,
    types::LABEL_COLUMN, ScoringEngine,
};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Process-wide model artifact, loaded on first use.
static ARTIFACT: ArtifactCell = ArtifactCell::new();

#[derive(Debug, Parser)]
#[command(name = "fraud-sentinel", version, about = "Fraud scoring and triage for QR payment batches")]
struct Cli {
    /// CSV file with QR transactions
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the scored CSV
    #[arg(short, long, default_value = "fraud_scoring_results.csv")]
    output: PathBuf,

    /// Configuration file (defaults to config/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of highest-scoring rows to log
    #[arg(long, default_value_t = 10)]
    show: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    init_logging(&config)?;

    info!("Starting Fraud Sentinel");
    info!(
        review_band_floor = config.triage.review_band_floor,
        review_capacity = config.triage.review_capacity,
        "Triage policy constants loaded"
    );
    info!(
        false_positive_cost = config.costs.false_positive_cost,
        false_negative_cost = config.costs.false_negative_cost,
        cost_ratio = config.costs.cost_ratio(),
        "Cost assumptions (informational, not used by triage)"
    );

    let artifact = ARTIFACT.get_or_load(&config.model).map_err(|e| {
        error!(kind = "ArtifactError", error = %e, "Failed to load model artifact");
        e
    })?;
    info!(
        model = %artifact.name,
        threshold = artifact.threshold,
        "Model artifact ready"
    );

    let table = Table::from_path(&cli.input)?;
    info!(
        path = %cli.input.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "Input table loaded"
    );

    let engine = ScoringEngine::from_artifact(
        artifact,
        config.triage.review_band_floor,
        config.triage.review_capacity,
    )?;

    let batch = engine.score(&table).map_err(|e| {
        error!(kind = e.kind(), error = %e, "Scoring failed");
        e
    })?;

    table
        .decorate(&batch)?
        .write_path(&cli.output)
        .with_context(|| format!("Failed to write results to {:?}", cli.output))?;
    info!(path = %cli.output.display(), "Results written");

    batch.summary.print_summary(batch.processing_time);
    log_top_rows(&table, &batch, cli.show);
    log_evaluation(&table, &batch);

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("fraud_sentinel={}", config.logging.level))
            .context("Invalid logging.level")?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Log the highest-scoring rows with the columns investigators look at first.
fn log_top_rows(table: &Table, batch: &ScoredBatch, limit: usize) {
    if limit == 0 || batch.records.is_empty() {
        return;
    }

    let column = |name: &str| table.column_index(name);
    let (amount, distance, count_1h) = (
        column("amount"),
        column("distance_km"),
        column("payer_tx_count_1h"),
    );
    let cell = |row: usize, idx: Option<usize>| {
        idx.and_then(|i| table.cell(row, i)).unwrap_or("").to_string()
    };

    info!("Top {} transactions by fraud score:", limit.min(batch.records.len()));
    for row in batch.ranked_by_score().into_iter().take(limit) {
        let record = &batch.records[row];
        info!(
            row = row,
            fraud_score = format!("{:.4}", record.fraud_score),
            triage = %record.triage,
            expected_loss = format!("{:.2}", record.expected_loss),
            amount = %cell(row, amount),
            distance_km = %cell(row, distance),
            payer_tx_count_1h = %cell(row, count_1h),
            "Scored transaction"
        );
    }
}

fn log_evaluation(table: &Table, batch: &ScoredBatch) {
    let Some(evaluation) = &batch.evaluation else {
        if table.column_index(LABEL_COLUMN).is_some() && !table.is_empty() {
            warn!("is_fraud has no positive labels; skipping precision/recall evaluation");
        }
        return;
    };

    info!(
        pr_auc = format!("{:.4}", evaluation.average_precision),
        positives = evaluation.positives,
        negatives = evaluation.negatives,
        curve_points = evaluation.curve.precision.len(),
        "Precision/recall evaluation"
    );

    if let Some((precision, recall)) = evaluation.operating_point(batch.policy.threshold()) {
        info!(
            threshold = batch.policy.threshold(),
            precision = format!("{:.4}", precision),
            recall = format!("{:.4}", recall),
            "ALTO_RIESGO operating point"
        );
    }
}
