//! Sample Batch Generator
//!
//! Writes a synthetic CSV batch of QR payment transactions for local runs
//! of the scoring CLI.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// One CSV row; identifier columns pass through the scorer untouched.
#[derive(Debug, Clone, Serialize)]
struct QrTransaction {
    transaction_id: String,
    payer_id: String,
    merchant_id: String,
    timestamp: DateTime<Utc>,
    amount: f64,
    distance_km: f64,
    payer_tx_count_1h: u32,
    payer_tx_count_24h: u32,
    amount_zscore_payer_7d: f64,
    is_fraud: u8,
}

/// QR transaction generator for testing
struct TransactionGenerator {
    rng: StdRng,
    transaction_counter: u64,
    start: DateTime<Utc>,
}

impl TransactionGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            transaction_counter: 0,
            start: Utc::now(),
        }
    }

    fn next_id(&mut self) -> (String, DateTime<Utc>) {
        self.transaction_counter += 1;
        let offset = Duration::seconds(self.transaction_counter as i64 * 7);
        (format!("qr_{:010}", self.transaction_counter), self.start + offset)
    }

    /// Everyday QR payment near the payer's usual pattern
    fn generate_legitimate(&mut self) -> QrTransaction {
        let (transaction_id, timestamp) = self.next_id();
        let count_1h = self.rng.gen_range(0..3);

        QrTransaction {
            transaction_id,
            payer_id: format!("payer_{}", self.rng.gen_range(1..5000)),
            merchant_id: format!("merchant_{}", self.rng.gen_range(1..800)),
            timestamp,
            amount: round2(self.rng.gen_range(5.0..400.0)),
            distance_km: round2(self.rng.gen_range(0.0..15.0)),
            payer_tx_count_1h: count_1h,
            payer_tx_count_24h: count_1h + self.rng.gen_range(0..8),
            amount_zscore_payer_7d: round2(self.rng.gen_range(-1.5..1.5)),
            is_fraud: 0,
        }
    }

    /// Account-takeover style burst: far from home, many payments, unusual amount
    fn generate_suspicious(&mut self) -> QrTransaction {
        let (transaction_id, timestamp) = self.next_id();
        let count_1h = self.rng.gen_range(4..15);

        QrTransaction {
            transaction_id,
            payer_id: format!("payer_{}", self.rng.gen_range(1..5000)),
            merchant_id: format!("merchant_{}", self.rng.gen_range(1..800)),
            timestamp,
            amount: round2(self.rng.gen_range(300.0..5000.0)),
            distance_km: round2(self.rng.gen_range(50.0..2000.0)),
            payer_tx_count_1h: count_1h,
            payer_tx_count_24h: count_1h + self.rng.gen_range(5..40),
            amount_zscore_payer_7d: round2(self.rng.gen_range(2.0..8.0)),
            is_fraud: 1,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Parser)]
#[command(name = "sample-batch", about = "Generate a synthetic QR transaction batch")]
struct Args {
    /// Output CSV path
    #[arg(short, long, default_value = "sample_batch.csv")]
    output: PathBuf,

    /// Number of transactions
    #[arg(short, long, default_value_t = 1000)]
    count: u64,

    /// Fraction of suspicious transactions
    #[arg(long, default_value_t = 0.05)]
    fraud_rate: f64,

    /// RNG seed for a reproducible batch
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_batch=info".parse()?),
        )
        .init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.fraud_rate) {
        anyhow::bail!("--fraud-rate must be in [0, 1], got {}", args.fraud_rate);
    }

    info!(
        output = %args.output.display(),
        count = args.count,
        fraud_rate = args.fraud_rate,
        seed = ?args.seed,
        "Generating sample batch"
    );

    let mut generator = TransactionGenerator::new(args.seed);
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create file: {:?}", args.output))?;

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for _ in 0..args.count {
        let transaction = if generator.rng.gen_bool(args.fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };
        writer.serialize(&transaction)?;
    }
    writer.flush()?;

    info!(
        "Completed! Wrote {} transactions ({} legitimate, {} suspicious)",
        args.count, legitimate_count, suspicious_count
    );

    Ok(())
}
