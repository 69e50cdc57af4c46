//! Classifier contract shared by every model backend

use crate::types::transaction::FeatureMatrix;
use anyhow::Result;

/// Per-row class probabilities, row-major `[rows, classes]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMatrix {
    classes: usize,
    values: Vec<f64>,
}

impl ProbabilityMatrix {
    /// Build from flat row-major values.
    pub fn new(classes: usize, values: Vec<f64>) -> Result<Self> {
        if classes == 0 {
            anyhow::bail!("probability matrix needs at least one class column");
        }
        if values.len() % classes != 0 {
            anyhow::bail!(
                "{} values do not fill rows of {} classes",
                values.len(),
                classes
            );
        }
        Ok(Self { classes, values })
    }

    /// Build from per-row vectors; every row must have the same width.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let classes = rows.first().map(Vec::len).unwrap_or(2);
        if let Some(row) = rows.iter().find(|r| r.len() != classes) {
            anyhow::bail!("ragged probability rows: {} vs {}", row.len(), classes);
        }
        Self::new(classes, rows.into_iter().flatten().collect())
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn row_count(&self) -> usize {
        self.values.len() / self.classes
    }

    /// Values of one class column, in row order.
    pub fn column(&self, class: usize) -> Option<Vec<f64>> {
        if class >= self.classes {
            return None;
        }
        Some(
            self.values
                .chunks_exact(self.classes)
                .map(|row| row[class])
                .collect(),
        )
    }
}

/// A trained binary fraud classifier.
///
/// Implementations are read-only after loading and may be shared between
/// concurrent scoring requests.
pub trait FraudClassifier: Send + Sync {
    /// Model name for logs and errors.
    fn name(&self) -> &str;

    /// Class probabilities for every row of `features`, in one call.
    ///
    /// Two-column outputs hold `[legit, fraud]`; a single column holds the
    /// fraud probability.
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<ProbabilityMatrix>;
}
