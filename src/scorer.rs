//! Risk scoring: one classifier call per batch.

use crate::error::ScoringError;
use crate::models::classifier::FraudClassifier;
use crate::types::transaction::FeatureMatrix;
use tracing::debug;

/// Probability column of the fraud class in a two-class output.
pub const POSITIVE_CLASS_INDEX: usize = 1;

/// Fraud probability per row of `features`, in row order.
///
/// The classifier runs once over the whole matrix. Any failure, wrong row
/// count, unsupported class count or probability outside `[0, 1]` fails the
/// whole batch.
pub fn score(
    classifier: &dyn FraudClassifier,
    features: &FeatureMatrix,
) -> Result<Vec<f64>, ScoringError> {
    let model = classifier.name();
    let expected = features.row_count();

    if features.is_empty() {
        return Ok(Vec::new());
    }

    let proba = classifier
        .predict_proba(features)
        .map_err(|e| ScoringError::Classifier {
            model: model.to_string(),
            source: e.into(),
        })?;

    if proba.row_count() != expected {
        return Err(ScoringError::RowCount {
            model: model.to_string(),
            expected,
            actual: proba.row_count(),
        });
    }

    let column = match proba.classes() {
        1 => proba.column(0),
        2 => proba.column(POSITIVE_CLASS_INDEX),
        _ => None,
    }
    .ok_or_else(|| ScoringError::ClassCount {
        model: model.to_string(),
        classes: proba.classes(),
    })?;

    if let Some((row, &value)) = column
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(ScoringError::OutOfRange {
            model: model.to_string(),
            row,
            value,
        });
    }

    debug!(model = %model, rows = expected, classes = proba.classes(), "Batch scored");
    Ok(column)
}
