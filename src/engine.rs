//! Scoring-and-triage engine.
//!
//! Runs one batch through projection, scoring, loss estimation and triage.
//! The batch either completes or fails as a whole.

use crate::error::SentinelError;
use crate::evaluation::{evaluate, Evaluation};
use crate::feature_projector::FeatureProjector;
use crate::loss::estimate_loss;
use crate::models::classifier::FraudClassifier;
use crate::models::loader::ModelArtifact;
use crate::scorer::score;
use crate::summary::TriageSummary;
use crate::table::Table;
use crate::triage::TriagePolicy;
use crate::types::triage::ScoredRecord;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Result of scoring one table
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    /// Unique batch identifier
    pub batch_id: Uuid,
    /// Scoring timestamp
    pub scored_at: DateTime<Utc>,
    /// Model that produced the scores
    pub model: String,
    /// Triage policy applied
    pub policy: TriagePolicy,
    /// One record per input row, in row order
    pub records: Vec<ScoredRecord>,
    /// Label counts and exposure
    pub summary: TriageSummary,
    /// Ranking quality, when the table carried usable ground truth
    pub evaluation: Option<Evaluation>,
    /// Wall time spent in the engine
    pub processing_time: Duration,
}

impl ScoredBatch {
    /// Row indices ordered by fraud score, highest first; ties keep row order.
    pub fn ranked_by_score(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by(|&a, &b| {
            self.records[b]
                .fraud_score
                .total_cmp(&self.records[a].fraud_score)
        });
        order
    }
}

/// Scores tables with a borrowed classifier under a fixed triage policy.
pub struct ScoringEngine<'a> {
    classifier: &'a dyn FraudClassifier,
    policy: TriagePolicy,
    projector: FeatureProjector,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(classifier: &'a dyn FraudClassifier, policy: TriagePolicy) -> Self {
        Self {
            classifier,
            policy,
            projector: FeatureProjector::new(),
        }
    }

    /// Engine for a loaded artifact, using its calibrated threshold.
    pub fn from_artifact(
        artifact: &'a ModelArtifact,
        review_band_floor: f64,
        review_capacity: usize,
    ) -> Result<Self, SentinelError> {
        let policy = TriagePolicy::new(artifact.threshold, review_band_floor, review_capacity)?;
        Ok(Self::new(artifact.classifier.as_ref(), policy))
    }

    pub fn policy(&self) -> &TriagePolicy {
        &self.policy
    }

    /// Score and triage every row of `table`.
    pub fn score(&self, table: &Table) -> Result<ScoredBatch, SentinelError> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4();

        let projection = self.projector.project(table)?;
        debug!(batch_id = %batch_id, rows = projection.len(), "Features projected");

        let scores = score(self.classifier, &projection.matrix())?;
        let losses = estimate_loss(&scores, &projection.amounts())?;
        let labels = self.policy.assign(&scores, &losses)?;

        let records: Vec<ScoredRecord> = scores
            .iter()
            .zip(&losses)
            .zip(&labels)
            .enumerate()
            .map(|(row, ((&fraud_score, &expected_loss), &triage))| ScoredRecord {
                row,
                fraud_score,
                expected_loss,
                triage,
            })
            .collect();

        let evaluation = match &projection.labels {
            Some(truth) => evaluate(truth, &scores)?,
            None => None,
        };

        let summary = TriageSummary::from_records(&records);
        let processing_time = start_time.elapsed();

        info!(
            batch_id = %batch_id,
            model = %self.classifier.name(),
            rows = summary.total,
            alto_riesgo = summary.alto_riesgo,
            revisar = summary.revisar,
            revisar_top_impacto = summary.revisar_top_impacto,
            processing_time_us = processing_time.as_micros(),
            "Batch triaged"
        );

        Ok(ScoredBatch {
            batch_id,
            scored_at: Utc::now(),
            model: self.classifier.name().to_string(),
            policy: self.policy,
            records,
            summary,
            evaluation,
            processing_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreconditionError;
    use crate::models::linear::LinearClassifier;
    use crate::types::triage::TriageLabel;
    use crate::types::FEATURE_COUNT;

    fn table(csv: &str) -> Table {
        Table::from_csv_reader(csv.as_bytes()).unwrap()
    }

    // p = sigmoid(z) where z = amount_zscore_payer_7d
    fn zscore_model() -> LinearClassifier {
        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients[4] = 1.0;
        LinearClassifier::new(0.0, coefficients)
    }

    #[test]
    fn test_end_to_end_batch() {
        let t = table(
            "tx_id,amount,distance_km,payer_tx_count_1h,payer_tx_count_24h,amount_zscore_payer_7d,is_fraud\n\
             a,100,1,1,1,3.0,1\n\
             b,200,1,1,1,0.0,0\n\
             c,300,1,1,1,-3.0,0\n",
        );
        let model = zscore_model();
        let engine = ScoringEngine::new(&model, TriagePolicy::new(0.9, 0.3, 50).unwrap());

        let batch = engine.score(&t).unwrap();

        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.records[0].triage, TriageLabel::AltoRiesgo);
        assert_eq!(batch.records[1].triage, TriageLabel::RevisarTopImpacto);
        assert_eq!(batch.records[2].triage, TriageLabel::Ok);
        assert_eq!(batch.records[1].fraud_score, 0.5);
        assert_eq!(batch.records[1].expected_loss, 100.0);
        assert_eq!(batch.summary.total, 3);
        assert_eq!(batch.model, "linear");

        let evaluation = batch.evaluation.unwrap();
        assert!((evaluation.average_precision - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_columns_fail_before_scoring() {
        let t = table("amount,distance_km\n10,1\n");
        let model = zscore_model();
        let engine = ScoringEngine::new(&model, TriagePolicy::new(0.5, 0.3, 50).unwrap());

        match engine.score(&t) {
            Err(SentinelError::Precondition(PreconditionError::MissingColumns { missing })) => {
                assert_eq!(
                    missing,
                    vec![
                        "payer_tx_count_1h",
                        "payer_tx_count_24h",
                        "amount_zscore_payer_7d"
                    ]
                )
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_table() {
        let t = table("amount,distance_km,payer_tx_count_1h,payer_tx_count_24h,amount_zscore_payer_7d\n");
        let model = zscore_model();
        let engine = ScoringEngine::new(&model, TriagePolicy::new(0.5, 0.3, 50).unwrap());

        let batch = engine.score(&t).unwrap();
        assert!(batch.records.is_empty());
        assert!(batch.evaluation.is_none());
    }

    #[test]
    fn test_ranked_by_score() {
        let t = table(
            "amount,distance_km,payer_tx_count_1h,payer_tx_count_24h,amount_zscore_payer_7d\n\
             1,0,0,0,-1\n\
             1,0,0,0,2\n\
             1,0,0,0,-1\n\
             1,0,0,0,0\n",
        );
        let model = zscore_model();
        let engine = ScoringEngine::new(&model, TriagePolicy::new(0.5, 0.3, 50).unwrap());

        let batch = engine.score(&t).unwrap();
        assert_eq!(batch.ranked_by_score(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_from_artifact_uses_model_threshold() {
        let artifact = ModelArtifact::new(Box::new(zscore_model()), 0.61);
        let engine = ScoringEngine::from_artifact(&artifact, 0.3, 10).unwrap();
        assert_eq!(engine.policy().threshold(), 0.61);
        assert_eq!(engine.policy().review_capacity(), 10);
    }
}
