//! Feature projection from raw tables to validated transaction features.
//!
//! The projector is the only place that reads table cells. It checks that
//! every required column exists before touching any row, then parses each
//! required cell into a [`TransactionFeatures`] in classifier order.

use crate::error::PreconditionError;
use crate::table::Table;
use crate::types::transaction::{
    FeatureMatrix, TransactionFeatures, FEATURE_COUNT, LABEL_COLUMN, REQUIRED_COLUMNS,
};

/// Validated features of a whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// One entry per table row, in table order
    pub features: Vec<TransactionFeatures>,
    /// Ground truth, when the table carries an `is_fraud` column
    pub labels: Option<Vec<bool>>,
}

impl Projection {
    pub fn matrix(&self) -> FeatureMatrix {
        FeatureMatrix::from_features(&self.features)
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.features.iter().map(|f| f.amount).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Projects arbitrary tables onto the fixed classifier feature set.
pub struct FeatureProjector {
    required: [&'static str; FEATURE_COUNT],
}

impl FeatureProjector {
    pub fn new() -> Self {
        Self {
            required: REQUIRED_COLUMNS,
        }
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Feature names in classifier order.
    pub fn feature_names(&self) -> &[&'static str] {
        &self.required
    }

    /// Required columns absent from `table`, in classifier order.
    pub fn missing_columns(&self, table: &Table) -> Vec<String> {
        self.required
            .iter()
            .filter(|name| table.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Validate and parse every required cell of `table`.
    pub fn project(&self, table: &Table) -> Result<Projection, PreconditionError> {
        let missing = self.missing_columns(table);
        if !missing.is_empty() {
            return Err(PreconditionError::MissingColumns { missing });
        }

        let mut idx = [0usize; FEATURE_COUNT];
        for (slot, name) in idx.iter_mut().zip(self.required.iter()) {
            // presence checked above
            *slot = table.column_index(name).unwrap_or_default();
        }
        let label_idx = table.column_index(LABEL_COLUMN);

        let mut features = Vec::with_capacity(table.len());
        let mut labels = label_idx.map(|_| Vec::with_capacity(table.len()));

        for (row, cells) in table.rows().iter().enumerate() {
            let cell = move |i: usize| Cell {
                row,
                column: self.required[i],
                raw: cells[idx[i]].as_str(),
            };

            features.push(TransactionFeatures {
                amount: cell(0).non_negative()?,
                distance_km: cell(1).non_negative()?,
                payer_tx_count_1h: cell(2).count()?,
                payer_tx_count_24h: cell(3).count()?,
                amount_zscore_payer_7d: cell(4).real()?,
            });

            if let (Some(i), Some(labels)) = (label_idx, labels.as_mut()) {
                let flag = Cell {
                    row,
                    column: LABEL_COLUMN,
                    raw: cells[i].as_str(),
                }
                .flag()?;
                labels.push(flag);
            }
        }

        Ok(Projection { features, labels })
    }
}

impl Default for FeatureProjector {
    fn default() -> Self {
        Self::new()
    }
}

struct Cell<'a> {
    row: usize,
    column: &'a str,
    raw: &'a str,
}

impl Cell<'_> {
    fn invalid(&self, reason: &'static str) -> PreconditionError {
        PreconditionError::InvalidValue {
            row: self.row,
            column: self.column.to_string(),
            value: self.raw.to_string(),
            reason,
        }
    }

    fn real(&self) -> Result<f64, PreconditionError> {
        let value: f64 = self
            .raw
            .trim()
            .parse()
            .map_err(|_| self.invalid("not a number"))?;
        if !value.is_finite() {
            return Err(self.invalid("not finite"));
        }
        Ok(value)
    }

    fn non_negative(&self) -> Result<f64, PreconditionError> {
        let value = self.real()?;
        if value < 0.0 {
            return Err(self.invalid("must be >= 0"));
        }
        // normalize -0.0
        Ok(value.abs())
    }

    fn count(&self) -> Result<u32, PreconditionError> {
        if let Ok(value) = self.raw.trim().parse::<u32>() {
            return Ok(value);
        }
        let value = self.non_negative()?;
        if value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(self.invalid("must be a non-negative integer"));
        }
        Ok(value as u32)
    }

    fn flag(&self) -> Result<bool, PreconditionError> {
        match self.raw.trim().to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" => Ok(true),
            "0" | "0.0" | "false" => Ok(false),
            _ => Err(self.invalid("expected 0/1 or true/false")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::from_csv_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_projection_reorders_columns() {
        let t = table(
            "amount_zscore_payer_7d,merchant,payer_tx_count_24h,distance_km,payer_tx_count_1h,amount\n\
             -1.5,m1,9,2.5,3,150.0\n",
        );
        let projection = FeatureProjector::new().project(&t).unwrap();

        assert_eq!(projection.len(), 1);
        assert_eq!(projection.matrix().rows()[0], [150.0, 2.5, 3.0, 9.0, -1.5]);
        assert!(projection.labels.is_none());
    }

    #[test]
    fn test_missing_columns_listed_in_required_order() {
        let t = table("payer_tx_count_1h,amount,merchant\n1,10,m\n");
        let err = FeatureProjector::new().project(&t).unwrap_err();

        match err {
            PreconditionError::MissingColumns { missing } => assert_eq!(
                missing,
                vec![
                    "distance_km",
                    "payer_tx_count_24h",
                    "amount_zscore_payer_7d"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_columns_checked_before_values() {
        // the bad amount is never reached
        let t = table("amount\nnot-a-number\n");
        let err = FeatureProjector::new().project(&t).unwrap_err();
        assert!(matches!(err, PreconditionError::MissingColumns { .. }));
    }

    #[test]
    fn test_invalid_values() {
        let header = "amount,distance_km,payer_tx_count_1h,payer_tx_count_24h,amount_zscore_payer_7d\n";
        let cases = [
            ("abc,1,1,1,0\n", "amount"),
            ("-5,1,1,1,0\n", "amount"),
            ("5,-1,1,1,0\n", "distance_km"),
            ("5,1,1.5,1,0\n", "payer_tx_count_1h"),
            ("5,1,1,-2,0\n", "payer_tx_count_24h"),
            ("5,1,1,1,NaN\n", "amount_zscore_payer_7d"),
        ];

        for (row, expected_column) in cases {
            let t = table(&format!("{header}{row}"));
            match FeatureProjector::new().project(&t).unwrap_err() {
                PreconditionError::InvalidValue { column, row, .. } => {
                    assert_eq!(column, expected_column);
                    assert_eq!(row, 0);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_integral_float_counts_accepted() {
        let t = table(
            "amount,distance_km,payer_tx_count_1h,payer_tx_count_24h,amount_zscore_payer_7d\n\
             5,1,2.0,10.0,0.3\n",
        );
        let projection = FeatureProjector::new().project(&t).unwrap();
        assert_eq!(projection.features[0].payer_tx_count_1h, 2);
        assert_eq!(projection.features[0].payer_tx_count_24h, 10);
    }

    #[test]
    fn test_labels_parsed() {
        let t = table(
            "amount,distance_km,payer_tx_count_1h,payer_tx_count_24h,amount_zscore_payer_7d,is_fraud\n\
             5,1,1,1,0,1\n\
             5,1,1,1,0,False\n\
             5,1,1,1,0,0.0\n",
        );
        let projection = FeatureProjector::new().project(&t).unwrap();
        assert_eq!(projection.labels, Some(vec![true, false, false]));

        let bad = table(
            "amount,distance_km,payer_tx_count_1h,payer_tx_count_24h,amount_zscore_payer_7d,is_fraud\n\
             5,1,1,1,0,maybe\n",
        );
        assert!(FeatureProjector::new().project(&bad).is_err());
    }

    #[test]
    fn test_feature_names() {
        let projector = FeatureProjector::new();
        assert_eq!(projector.feature_count(), 5);
        assert_eq!(projector.feature_names(), &REQUIRED_COLUMNS);
    }
}
