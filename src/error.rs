//! Error taxonomy for the scoring engine.
//!
//! Every error is batch-fatal: a batch either scores completely or not at all.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by errors that wrap a backend failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Input table does not satisfy the engine's preconditions.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid value {value:?} in column {column} at row {row}: {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: &'static str,
    },
}

/// Classifier invocation failed or broke its output contract.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("classifier {model} failed")]
    Classifier {
        model: String,
        #[source]
        source: BoxError,
    },

    #[error("classifier {model} returned {actual} rows for {expected} inputs")]
    RowCount {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("classifier {model} returned {classes} probability columns, expected 1 or 2")]
    ClassCount { model: String, classes: usize },

    #[error("classifier {model} returned probability {value} for row {row}, outside [0, 1]")]
    OutOfRange { model: String, row: usize, value: f64 },
}

/// Classifier or threshold artifact could not be loaded.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load model {path}")]
    Model {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("invalid model {path}: {reason}")]
    InvalidModel { path: PathBuf, reason: String },

    #[error("optimal_threshold {value} in {path} is outside [0, 1]")]
    InvalidThreshold { path: PathBuf, value: f64 },
}

/// Umbrella error returned by [`crate::engine::ScoringEngine`].
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("artifact unavailable: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("invalid triage policy: {name} = {value}")]
    InvalidPolicy { name: &'static str, value: f64 },
}

impl SentinelError {
    /// Short name of the error kind, for user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SentinelError::Precondition(_) => "PreconditionError",
            SentinelError::Scoring(_) => "ScoringError",
            SentinelError::Artifact(_) => "ArtifactError",
            SentinelError::InvalidPolicy { .. } => "PolicyError",
        }
    }
}
