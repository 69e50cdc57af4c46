//! Configuration management for the scoring engine

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable prefix, e.g. `FRAUD_SENTINEL__TRIAGE__REVIEW_CAPACITY`.
pub const ENV_PREFIX: &str = "FRAUD_SENTINEL";

/// Serialization format of the classifier artifact
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// ONNX export run through ONNX Runtime
    #[default]
    Onnx,
    /// JSON logistic model
    Linear,
}

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub triage: TriageConfig,
    pub costs: CostConfig,
    pub logging: LoggingConfig,
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Classifier file
    pub model_path: String,
    /// JSON file holding `optimal_threshold`
    pub thresholds_path: String,
    /// Classifier file format
    pub format: ModelFormat,
    /// Number of threads for ONNX inference (default: 1)
    pub onnx_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: "models/fraud_model.onnx".to_string(),
            thresholds_path: "models/thresholds.json".to_string(),
            format: ModelFormat::Onnx,
            onnx_threads: 1,
        }
    }
}

/// Triage policy constants; the threshold itself comes with the model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Lowest fraud score that enters the review band
    pub review_band_floor: f64,
    /// Maximum review cases escalated to top impact per batch
    pub review_capacity: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            review_band_floor: 0.3,
            review_capacity: 50,
        }
    }
}

/// Investigation cost assumptions.
///
/// Carried and reported only; triage does not use them yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Cost of investigating a legitimate transaction
    pub false_positive_cost: f64,
    /// Cost of a missed fraud
    pub false_negative_cost: f64,
}

impl CostConfig {
    pub const FALSE_POSITIVE_RANGE: (f64, f64) = (1.0, 100.0);
    pub const FALSE_NEGATIVE_RANGE: (f64, f64) = (100.0, 10_000.0);

    /// Missed-fraud cost per investigation cost.
    pub fn cost_ratio(&self) -> f64 {
        self.false_negative_cost / self.false_positive_cost
    }

    // TODO: derive a cost-sensitive threshold from cost_ratio once models ship calibration curves
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            false_positive_cost: 10.0,
            false_negative_cost: 500.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file, if present, and the environment.
    pub fn load() -> Result<Self> {
        Self::build(File::with_name(DEFAULT_CONFIG_PATH).required(false))
    }

    /// Load configuration from a specific file and the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(File::from(path.as_ref()))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let floor = self.triage.review_band_floor;
        if !(0.0..=1.0).contains(&floor) {
            anyhow::bail!("triage.review_band_floor must be in [0, 1], got {}", floor);
        }

        let (lo, hi) = CostConfig::FALSE_POSITIVE_RANGE;
        let fp = self.costs.false_positive_cost;
        if !(lo..=hi).contains(&fp) {
            anyhow::bail!("costs.false_positive_cost must be in [{}, {}], got {}", lo, hi, fp);
        }

        let (lo, hi) = CostConfig::FALSE_NEGATIVE_RANGE;
        let fn_cost = self.costs.false_negative_cost;
        if !(lo..=hi).contains(&fn_cost) {
            anyhow::bail!(
                "costs.false_negative_cost must be in [{}, {}], got {}",
                lo,
                hi,
                fn_cost
            );
        }

        if self.model.onnx_threads == 0 {
            anyhow::bail!("model.onnx_threads must be at least 1");
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => anyhow::bail!("logging.format must be json or pretty, got {}", other),
        }
    }
}
