//! Triage labels and scored records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational disposition of a scored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageLabel {
    /// Below the review band
    #[serde(rename = "OK")]
    Ok,
    /// Inside the review band, outside the escalation capacity
    #[serde(rename = "REVISAR")]
    Revisar,
    /// Inside the review band and among the highest expected losses
    #[serde(rename = "REVISAR (Top Impacto)")]
    RevisarTopImpacto,
    /// At or above the model threshold
    #[serde(rename = "ALTO_RIESGO")]
    AltoRiesgo,
}

impl TriageLabel {
    pub const ALL: [TriageLabel; 4] = [
        TriageLabel::Ok,
        TriageLabel::Revisar,
        TriageLabel::RevisarTopImpacto,
        TriageLabel::AltoRiesgo,
    ];

    /// Label text as written to the output table.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageLabel::Ok => "OK",
            TriageLabel::Revisar => "REVISAR",
            TriageLabel::RevisarTopImpacto => "REVISAR (Top Impacto)",
            TriageLabel::AltoRiesgo => "ALTO_RIESGO",
        }
    }

    /// Both review labels count toward the review queue.
    pub fn is_review(&self) -> bool {
        matches!(self, TriageLabel::Revisar | TriageLabel::RevisarTopImpacto)
    }
}

impl fmt::Display for TriageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine output for one input row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Index of the row in the input table
    pub row: usize,

    /// Fraud probability (0.0 - 1.0)
    pub fraud_score: f64,

    /// fraud_score * amount
    pub expected_loss: f64,

    /// Triage disposition
    pub triage: TriageLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_text() {
        let texts: Vec<&str> = TriageLabel::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            texts,
            vec!["OK", "REVISAR", "REVISAR (Top Impacto)", "ALTO_RIESGO"]
        );
        assert_eq!(TriageLabel::RevisarTopImpacto.to_string(), "REVISAR (Top Impacto)");
    }

    #[test]
    fn test_label_serialization_matches_display() {
        for label in TriageLabel::ALL {
            let json = serde_json::to_string(&label).unwrap();
            assert_eq!(json, format!("\"{}\"", label.as_str()));
            let back: TriageLabel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, label);
        }
    }

    #[test]
    fn test_review_labels() {
        assert!(TriageLabel::Revisar.is_review());
        assert!(TriageLabel::RevisarTopImpacto.is_review());
        assert!(!TriageLabel::Ok.is_review());
        assert!(!TriageLabel::AltoRiesgo.is_review());
    }
}
