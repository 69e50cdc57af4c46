//! Capacity-bounded triage policy.
//!
//! Two stages: a probability gate splits rows into `ALTO_RIESGO`, the review
//! band and `OK`; then the review rows with the largest expected loss are
//! escalated to `REVISAR (Top Impacto)`, at most `review_capacity` of them.

use crate::config::TriageConfig;
use crate::error::{PreconditionError, SentinelError};
use crate::types::triage::TriageLabel;

/// Triage thresholds for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriagePolicy {
    threshold: f64,
    review_band_floor: f64,
    review_capacity: usize,
}

impl TriagePolicy {
    /// Build a policy; `threshold` and `review_band_floor` must lie in `[0, 1]`.
    ///
    /// A threshold at or below the floor is allowed and leaves the review
    /// band empty.
    pub fn new(
        threshold: f64,
        review_band_floor: f64,
        review_capacity: usize,
    ) -> Result<Self, SentinelError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SentinelError::InvalidPolicy {
                name: "threshold",
                value: threshold,
            });
        }
        if !(0.0..=1.0).contains(&review_band_floor) {
            return Err(SentinelError::InvalidPolicy {
                name: "review_band_floor",
                value: review_band_floor,
            });
        }
        Ok(Self {
            threshold,
            review_band_floor,
            review_capacity,
        })
    }

    /// Policy from the model threshold and configured triage constants.
    pub fn from_config(threshold: f64, config: &TriageConfig) -> Result<Self, SentinelError> {
        Self::new(threshold, config.review_band_floor, config.review_capacity)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn review_band_floor(&self) -> f64 {
        self.review_band_floor
    }

    pub fn review_capacity(&self) -> usize {
        self.review_capacity
    }

    /// Label from the probability gate alone, before capacity escalation.
    pub fn gate(&self, probability: f64) -> TriageLabel {
        if probability >= self.threshold {
            TriageLabel::AltoRiesgo
        } else if probability >= self.review_band_floor {
            TriageLabel::Revisar
        } else {
            TriageLabel::Ok
        }
    }

    /// Label every row.
    ///
    /// Review rows are ranked by expected loss, highest first, with ties
    /// kept in row order; the first `review_capacity` are escalated.
    pub fn assign(
        &self,
        probabilities: &[f64],
        expected_losses: &[f64],
    ) -> Result<Vec<TriageLabel>, PreconditionError> {
        if probabilities.len() != expected_losses.len() {
            return Err(PreconditionError::ShapeMismatch {
                context: "triage",
                expected: probabilities.len(),
                actual: expected_losses.len(),
            });
        }

        let mut labels: Vec<TriageLabel> = probabilities.iter().map(|&p| self.gate(p)).collect();

        let mut review: Vec<usize> = (0..labels.len())
            .filter(|&i| labels[i] == TriageLabel::Revisar)
            .collect();
        // sort_by is stable
        review.sort_by(|&a, &b| expected_losses[b].total_cmp(&expected_losses[a]));

        for &i in review.iter().take(self.review_capacity) {
            labels[i] = TriageLabel::RevisarTopImpacto;
        }

        Ok(labels)
    }
}
