//! Fraud Sentinel Library
//!
//! Batch fraud scoring for QR point-of-sale payments: a pre-trained
//! classifier scores every transaction, expected loss weights the score by
//! amount, and a capacity-bounded triage policy decides which cases the
//! investigation team sees first.

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod feature_projector;
pub mod loss;
pub mod models;
pub mod scorer;
pub mod summary;
pub mod table;
pub mod triage;
pub mod types;

pub use config::AppConfig;
pub use engine::{ScoredBatch, ScoringEngine};
pub use error::{ArtifactError, PreconditionError, ScoringError, SentinelError};
pub use feature_projector::FeatureProjector;
pub use models::{ArtifactCell, ArtifactLoader, FraudClassifier, ModelArtifact};
pub use table::Table;
pub use triage::TriagePolicy;
pub use types::{ScoredRecord, TransactionFeatures, TriageLabel};
