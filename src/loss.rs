//! Expected loss estimation

use crate::error::PreconditionError;

/// Risk-weighted exposure per row: `probability * amount`.
pub fn estimate_loss(probabilities: &[f64], amounts: &[f64]) -> Result<Vec<f64>, PreconditionError> {
    if probabilities.len() != amounts.len() {
        return Err(PreconditionError::ShapeMismatch {
            context: "loss estimation",
            expected: probabilities.len(),
            actual: amounts.len(),
        });
    }

    Ok(probabilities
        .iter()
        .zip(amounts)
        .map(|(p, amount)| p * amount)
        .collect())
}
