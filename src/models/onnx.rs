//! ONNX Runtime classifier backend

use super::classifier::{FraudClassifier, ProbabilityMatrix};
use crate::types::transaction::{FeatureMatrix, FEATURE_COUNT};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Exported fraud model run through ONNX Runtime.
///
/// A session run needs exclusive access, so the session sits behind a
/// mutex; the classifier itself stays shareable.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load a model file with the given intra-op thread count.
    pub fn load<P: AsRef<Path>>(path: P, name: &str, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx classifiers expose "label" and "probabilities"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Probabilities from the named output, falling back to any non-label output.
    fn extract_probabilities(
        &self,
        outputs: &ort::session::SessionOutputs,
        rows: usize,
    ) -> Result<ProbabilityMatrix> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(matrix) = self.extract_value(output, rows)? {
                return Ok(matrix);
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(matrix) = self.extract_value(&output, rows)? {
                debug!(model = %self.name, output = %name, "Extracted from fallback output");
                return Ok(matrix);
            }
        }

        anyhow::bail!("model {} produced no probability output", self.name)
    }

    fn extract_value(
        &self,
        output: &ort::value::DynValue,
        rows: usize,
    ) -> Result<Option<ProbabilityMatrix>> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            return Ok(Some(tensor_probabilities(shape, data, rows)?));
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return Ok(Some(self.extract_from_sequence_map(output)?));
        }

        Ok(None)
    }

    /// Probabilities from `seq(map(int64, float))`, one map per row.
    ///
    /// CatBoost and LightGBM exports use this layout.
    fn extract_from_sequence_map(&self, output: &ort::value::DynValue) -> Result<ProbabilityMatrix> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        let mut rows = Vec::with_capacity(maps.len());
        for map_value in &maps {
            let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

            let class = |id: i64| {
                kv_pairs
                    .iter()
                    .find(|(class_id, _)| *class_id == id)
                    .map(|(_, p)| *p as f64)
            };

            let fraud = match (class(1), class(0)) {
                (Some(p), _) => p,
                (None, Some(p)) => 1.0 - p,
                (None, None) => anyhow::bail!("No class probability found in map"),
            };
            rows.push(vec![1.0 - fraud, fraud]);
        }

        ProbabilityMatrix::from_rows(rows)
    }
}

/// Interpret a `[rows, classes]`, `[rows]` or `[rows, 1]` tensor.
fn tensor_probabilities(shape: &[i64], data: &[f32], rows: usize) -> Result<ProbabilityMatrix> {
    let values: Vec<f64> = data.iter().map(|&v| v as f64).collect();

    match shape {
        [n, classes] if *n as usize == rows && *classes > 0 => {
            ProbabilityMatrix::new(*classes as usize, values)
        }
        [n] if *n as usize == rows => ProbabilityMatrix::new(1, values),
        _ => anyhow::bail!("unexpected probability tensor shape {:?} for {} rows", shape, rows),
    }
}

impl FraudClassifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<ProbabilityMatrix> {
        let rows = features.row_count();
        let shape = vec![rows as i64, FEATURE_COUNT as i64];
        let input_tensor = Tensor::from_array((shape, features.to_f32()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let matrix = self.extract_probabilities(&outputs, rows)?;
        debug!(model = %self.name, rows = rows, classes = matrix.classes(), "ONNX inference complete");
        Ok(matrix)
    }
}
