//! Validated QR payment transaction features

use serde::{Deserialize, Serialize};

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 5;

/// Required feature columns, in the order the classifier expects them.
pub const REQUIRED_COLUMNS: [&str; FEATURE_COUNT] = [
    "amount",
    "distance_km",
    "payer_tx_count_1h",
    "payer_tx_count_24h",
    "amount_zscore_payer_7d",
];

/// Optional ground-truth column, used for evaluation only.
pub const LABEL_COLUMN: &str = "is_fraud";

/// Feature values of one QR payment transaction.
///
/// Built only by the feature projector, so every field already satisfies
/// its column constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionFeatures {
    /// Payment amount (>= 0)
    pub amount: f64,

    /// Distance between payer and merchant in km (>= 0)
    pub distance_km: f64,

    /// Payer transactions in the last hour
    pub payer_tx_count_1h: u32,

    /// Payer transactions in the last 24 hours
    pub payer_tx_count_24h: u32,

    /// Amount z-score against the payer's last 7 days
    pub amount_zscore_payer_7d: f64,
}

impl TransactionFeatures {
    /// Feature vector in [`REQUIRED_COLUMNS`] order.
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.amount,
            self.distance_km,
            self.payer_tx_count_1h as f64,
            self.payer_tx_count_24h as f64,
            self.amount_zscore_payer_7d,
        ]
    }
}

/// Row-major feature matrix handed to a classifier in one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<[f64; FEATURE_COUNT]>,
}

impl FeatureMatrix {
    pub fn from_features(features: &[TransactionFeatures]) -> Self {
        Self {
            rows: features.iter().map(TransactionFeatures::to_row).collect(),
        }
    }

    pub fn from_rows(rows: Vec<[f64; FEATURE_COUNT]>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> &'static [&'static str] {
        &REQUIRED_COLUMNS
    }

    /// Flattened `f32` values, shape `[row_count, FEATURE_COUNT]`.
    pub fn to_f32(&self) -> Vec<f32> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(|&v| v as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TransactionFeatures {
        TransactionFeatures {
            amount: 120.5,
            distance_km: 3.2,
            payer_tx_count_1h: 2,
            payer_tx_count_24h: 7,
            amount_zscore_payer_7d: -0.4,
        }
    }

    #[test]
    fn test_row_order_matches_required_columns() {
        let row = sample().to_row();
        assert_eq!(row, [120.5, 3.2, 2.0, 7.0, -0.4]);
        assert_eq!(REQUIRED_COLUMNS[0], "amount");
        assert_eq!(REQUIRED_COLUMNS[4], "amount_zscore_payer_7d");
    }

    #[test]
    fn test_matrix_flattening() {
        let matrix = FeatureMatrix::from_features(&[sample(), sample()]);
        assert_eq!(matrix.row_count(), 2);
        let flat = matrix.to_f32();
        assert_eq!(flat.len(), 2 * FEATURE_COUNT);
        assert_eq!(flat[5], 120.5);
    }
}
