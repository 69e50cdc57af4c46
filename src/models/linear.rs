//! Logistic fraud model stored as JSON.
//!
//! ```json
//! {
//!   "name": "qr_logistic_v1",
//!   "intercept": -3.1,
//!   "coefficients": [0.002, 0.04, 0.35, 0.05, 0.6],
//!   "means": [250.0, 12.0, 1.0, 6.0, 0.0],
//!   "scales": [300.0, 20.0, 1.5, 5.0, 1.0]
//! }
//! ```
//!
//! Coefficients follow the required feature order. `means` and `scales`
//! are optional standardization applied before the linear term.

use super::classifier::{FraudClassifier, ProbabilityMatrix};
use crate::types::transaction::{FeatureMatrix, FEATURE_COUNT};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Logistic regression over the five QR payment features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    #[serde(default = "default_name")]
    pub name: String,
    pub intercept: f64,
    pub coefficients: [f64; FEATURE_COUNT],
    #[serde(default)]
    pub means: Option<[f64; FEATURE_COUNT]>,
    #[serde(default)]
    pub scales: Option<[f64; FEATURE_COUNT]>,
}

fn default_name() -> String {
    "linear".to_string()
}

impl LinearClassifier {
    pub fn new(intercept: f64, coefficients: [f64; FEATURE_COUNT]) -> Self {
        Self {
            name: default_name(),
            intercept,
            coefficients,
            means: None,
            scales: None,
        }
    }

    /// Reject parameters that could yield a non-finite probability.
    pub fn validate(&self) -> Result<()> {
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            anyhow::bail!("model {} has non-finite parameters", self.name);
        }
        if let Some(means) = &self.means {
            if means.iter().any(|m| !m.is_finite()) {
                anyhow::bail!("model {} has non-finite means", self.name);
            }
        }
        if let Some(scales) = &self.scales {
            if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                anyhow::bail!("model {} scales must be finite and > 0", self.name);
            }
        }
        Ok(())
    }

    /// Fraud probability for one feature row.
    pub fn probability(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let mut z = self.intercept;
        for (i, &x) in row.iter().enumerate() {
            let mean = self.means.map_or(0.0, |m| m[i]);
            let scale = self.scales.map_or(1.0, |s| s[i]);
            z += self.coefficients[i] * (x - mean) / scale;
        }
        sigmoid(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl FraudClassifier for LinearClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<ProbabilityMatrix> {
        let values = features
            .rows()
            .iter()
            .flat_map(|row| {
                let p = self.probability(row);
                [1.0 - p, p]
            })
            .collect();
        ProbabilityMatrix::new(2, values)
    }
}
