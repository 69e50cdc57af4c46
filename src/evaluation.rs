//! Precision/recall evaluation against ground-truth labels.
//!
//! Diagnostic only: nothing here feeds back into triage.

use crate::error::PreconditionError;
use serde::Serialize;

/// Precision/recall pairs, one per distinct score.
///
/// `thresholds` ascend; `precision` and `recall` have one extra trailing
/// point (precision 1, recall 0) that has no threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Ranking quality of fraud scores on a labelled batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Area under the precision/recall curve, step-wise
    pub average_precision: f64,
    pub curve: PrecisionRecallCurve,
    pub positives: usize,
    pub negatives: usize,
}

impl Evaluation {
    /// Precision and recall when flagging every score `>= threshold`.
    ///
    /// `None` when no score reaches the threshold.
    pub fn operating_point(&self, threshold: f64) -> Option<(f64, f64)> {
        let j = self.curve.thresholds.iter().position(|&t| t >= threshold)?;
        Some((self.curve.precision[j], self.curve.recall[j]))
    }
}

/// Evaluate `scores` against `labels`.
///
/// Returns `None` when the batch has no positive label, since recall is
/// undefined there.
pub fn evaluate(labels: &[bool], scores: &[f64]) -> Result<Option<Evaluation>, PreconditionError> {
    if labels.len() != scores.len() {
        return Err(PreconditionError::ShapeMismatch {
            context: "evaluation",
            expected: scores.len(),
            actual: labels.len(),
        });
    }

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 {
        return Ok(None);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // cumulative counts at the last row of each distinct score, descending
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let mut thresholds = Vec::new();
    let mut tp = 0usize;
    for (k, &i) in order.iter().enumerate() {
        if labels[i] {
            tp += 1;
        }
        let last_of_score = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            tps.push(tp);
            fps.push(k + 1 - tp);
            thresholds.push(scores[i]);
        }
    }

    let mut precision: Vec<f64> = tps
        .iter()
        .zip(&fps)
        .map(|(&tp, &fp)| tp as f64 / (tp + fp) as f64)
        .collect();
    let mut recall: Vec<f64> = tps
        .iter()
        .map(|&tp| tp as f64 / positives as f64)
        .collect();

    let mut average_precision = 0.0;
    let mut previous_recall = 0.0;
    for (p, r) in precision.iter().zip(&recall) {
        average_precision += (r - previous_recall) * p;
        previous_recall = *r;
    }

    precision.reverse();
    recall.reverse();
    thresholds.reverse();
    precision.push(1.0);
    recall.push(0.0);

    Ok(Some(Evaluation {
        average_precision,
        curve: PrecisionRecallCurve {
            precision,
            recall,
            thresholds,
        },
        positives,
        negatives,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_curve_and_average_precision() {
        let labels = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];

        let eval = evaluate(&labels, &scores).unwrap().unwrap();

        assert!(close(&eval.curve.precision, &[0.5, 2.0 / 3.0, 0.5, 1.0, 1.0]));
        assert!(close(&eval.curve.recall, &[1.0, 1.0, 0.5, 0.5, 0.0]));
        assert!(close(&eval.curve.thresholds, &[0.1, 0.35, 0.4, 0.8]));
        assert!((eval.average_precision - 5.0 / 6.0).abs() < 1e-9);
        assert_eq!(eval.positives, 2);
        assert_eq!(eval.negatives, 2);
    }

    #[test]
    fn test_tied_scores_collapse() {
        let labels = [true, false, true, false];
        let scores = [0.7, 0.7, 0.2, 0.2];

        let eval = evaluate(&labels, &scores).unwrap().unwrap();

        assert!(close(&eval.curve.thresholds, &[0.2, 0.7]));
        assert!(close(&eval.curve.precision, &[0.5, 0.5, 1.0]));
        assert!(close(&eval.curve.recall, &[1.0, 0.5, 0.0]));
        assert!((eval.average_precision - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_ranking() {
        let eval = evaluate(&[true, true, false], &[0.9, 0.8, 0.1])
            .unwrap()
            .unwrap();
        assert!((eval.average_precision - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_operating_point() {
        let labels = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let eval = evaluate(&labels, &scores).unwrap().unwrap();

        let (precision, recall) = eval.operating_point(0.3).unwrap();
        assert!((precision - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(recall, 1.0);
        assert_eq!(eval.operating_point(0.9), None);
    }

    #[test]
    fn test_no_positives() {
        assert_eq!(evaluate(&[false, false], &[0.3, 0.9]).unwrap(), None);
        assert_eq!(evaluate(&[], &[]).unwrap(), None);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(evaluate(&[true], &[0.1, 0.2]).is_err());
    }
}
