//! Batch summary statistics and the end-of-batch report.

use crate::types::triage::{ScoredRecord, TriageLabel};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Counts and exposure of one scored batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriageSummary {
    /// Rows scored
    pub total: usize,
    /// Rows labelled OK
    pub ok: usize,
    /// Rows labelled REVISAR
    pub revisar: usize,
    /// Rows labelled REVISAR (Top Impacto)
    pub revisar_top_impacto: usize,
    /// Rows labelled ALTO_RIESGO
    pub alto_riesgo: usize,
    /// Sum of expected loss over all rows
    pub total_expected_loss: f64,
    /// Sum of expected loss over rows needing action (review or high risk)
    pub flagged_expected_loss: f64,
    /// Fraud score histogram, ten buckets of width 0.1
    pub score_distribution: [u64; 10],
}

impl TriageSummary {
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.triage {
                TriageLabel::Ok => summary.ok += 1,
                TriageLabel::Revisar => summary.revisar += 1,
                TriageLabel::RevisarTopImpacto => summary.revisar_top_impacto += 1,
                TriageLabel::AltoRiesgo => summary.alto_riesgo += 1,
            }

            summary.total_expected_loss += record.expected_loss;
            if record.triage != TriageLabel::Ok {
                summary.flagged_expected_loss += record.expected_loss;
            }

            let bucket = (record.fraud_score * 10.0).min(9.0) as usize;
            summary.score_distribution[bucket] += 1;
        }

        summary
    }

    /// Rows in either review label.
    pub fn review_total(&self) -> usize {
        self.revisar + self.revisar_top_impacto
    }

    pub fn count(&self, label: TriageLabel) -> usize {
        match label {
            TriageLabel::Ok => self.ok,
            TriageLabel::Revisar => self.revisar,
            TriageLabel::RevisarTopImpacto => self.revisar_top_impacto,
            TriageLabel::AltoRiesgo => self.alto_riesgo,
        }
    }

    /// Log the boxed summary report.
    pub fn print_summary(&self, processing_time: Duration) {
        let flagged_pct = if self.total > 0 {
            ((self.alto_riesgo + self.review_total()) as f64 / self.total as f64) * 100.0
        } else {
            0.0
        };

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD SENTINEL - BATCH TRIAGE SUMMARY             ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Scored:  {:>8}  │  Flagged: {:>6.1}%           ║",
            self.total, flagged_pct
        );
        info!(
            "║ ALTO_RIESGO:          {:>8}  │  REVISAR (all): {:>8}    ║",
            self.alto_riesgo,
            self.review_total()
        );
        info!(
            "║ Processing Time: {:>10} μs                                 ║",
            processing_time.as_micros()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Triage Labels:                                               ║");
        for label in TriageLabel::ALL {
            let count = self.count(label);
            let pct = if self.total > 0 {
                (count as f64 / self.total as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:22}: {:>6} ({:>5.1}%)                     ║", label.as_str(), count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Expected Loss: total={:>14.2} flagged={:>14.2}  ║",
            self.total_expected_loss, self.flagged_expected_loss
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Score Distribution:                                    ║");
        for (i, &count) in self.score_distribution.iter().enumerate() {
            let pct = if self.total > 0 {
                (count as f64 / self.total as f64) * 100.0
            } else {
                0.0
            };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize, fraud_score: f64, amount: f64, triage: TriageLabel) -> ScoredRecord {
        ScoredRecord {
            row,
            fraud_score,
            expected_loss: fraud_score * amount,
            triage,
        }
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record(0, 0.9, 100.0, TriageLabel::AltoRiesgo),
            record(1, 0.5, 200.0, TriageLabel::Revisar),
            record(2, 0.4, 300.0, TriageLabel::RevisarTopImpacto),
            record(3, 0.2, 400.0, TriageLabel::Ok),
        ];

        let summary = TriageSummary::from_records(&records);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.alto_riesgo, 1);
        assert_eq!(summary.revisar, 1);
        assert_eq!(summary.revisar_top_impacto, 1);
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.review_total(), 2);
        assert!((summary.total_expected_loss - 390.0).abs() < 1e-9);
        assert!((summary.flagged_expected_loss - 310.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_distribution() {
        let records = vec![
            record(0, 0.0, 1.0, TriageLabel::Ok),
            record(1, 0.05, 1.0, TriageLabel::Ok),
            record(2, 0.95, 1.0, TriageLabel::AltoRiesgo),
            record(3, 1.0, 1.0, TriageLabel::AltoRiesgo),
        ];

        let dist = TriageSummary::from_records(&records).score_distribution;
        assert_eq!(dist[0], 2);
        assert_eq!(dist[9], 2);
        assert_eq!(dist.iter().sum::<u64>(), 4);
    }

    #[test]
    fn test_empty_batch() {
        let summary = TriageSummary::from_records(&[]);
        assert_eq!(summary, TriageSummary::default());
        summary.print_summary(Duration::from_micros(0));
    }
}
