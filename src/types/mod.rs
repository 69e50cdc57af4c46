//! Type definitions for the scoring engine

pub mod transaction;
pub mod triage;

pub use transaction::{FeatureMatrix, TransactionFeatures, FEATURE_COUNT, LABEL_COLUMN, REQUIRED_COLUMNS};
pub use triage::{ScoredRecord, TriageLabel};
