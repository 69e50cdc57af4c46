//! Model artifact loading.
//!
//! An artifact is a classifier file plus a JSON threshold file. Artifacts
//! are loaded once at process start and never reloaded; [`ArtifactCell`]
//! enforces that for callers that share one artifact.

use super::classifier::FraudClassifier;
use super::linear::LinearClassifier;
use super::onnx::OnnxClassifier;
use crate::config::{ModelConfig, ModelFormat};
use crate::error::ArtifactError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

/// Threshold used when the threshold file has no `optimal_threshold` key.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Loaded classifier and its calibrated decision threshold.
pub struct ModelArtifact {
    pub name: String,
    pub classifier: Box<dyn FraudClassifier>,
    pub threshold: f64,
}

impl ModelArtifact {
    pub fn new(classifier: Box<dyn FraudClassifier>, threshold: f64) -> Self {
        Self {
            name: classifier.name().to_string(),
            classifier,
            threshold,
        }
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Threshold file contents; other keys are ignored.
#[derive(Debug, Deserialize)]
struct ThresholdFile {
    #[serde(default = "default_threshold")]
    optimal_threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Loader for classifier artifacts
pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Load classifier and threshold described by `config`.
    pub fn load(config: &ModelConfig) -> Result<ModelArtifact, ArtifactError> {
        let threshold = Self::load_threshold(&config.thresholds_path)?;
        let classifier = Self::load_classifier(config)?;

        info!(
            model = %classifier.name(),
            threshold = threshold,
            "Model artifact loaded"
        );

        Ok(ModelArtifact::new(classifier, threshold))
    }

    /// Read `optimal_threshold` from a JSON threshold file.
    pub fn load_threshold<P: AsRef<Path>>(path: P) -> Result<f64, ArtifactError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ThresholdFile =
            serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let value = file.optimal_threshold;
        if !(0.0..=1.0).contains(&value) {
            return Err(ArtifactError::InvalidThreshold {
                path: path.to_path_buf(),
                value,
            });
        }
        Ok(value)
    }

    /// Load the classifier in the configured format.
    pub fn load_classifier(config: &ModelConfig) -> Result<Box<dyn FraudClassifier>, ArtifactError> {
        let path = Path::new(&config.model_path);
        if !path.exists() {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "model file not found"),
            });
        }

        match config.format {
            ModelFormat::Onnx => {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("onnx");
                let model = OnnxClassifier::load(path, name, config.onnx_threads).map_err(
                    |e| ArtifactError::Model {
                        path: path.to_path_buf(),
                        source: e.into(),
                    },
                )?;
                Ok(Box::new(model))
            }
            ModelFormat::Linear => Ok(Box::new(Self::load_linear(path)?)),
        }
    }

    /// Load a JSON logistic model.
    pub fn load_linear<P: AsRef<Path>>(path: P) -> Result<LinearClassifier, ArtifactError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: LinearClassifier =
            serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate().map_err(|e| ArtifactError::InvalidModel {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(model)
    }
}

/// Load-once holder for the process-wide model artifact.
///
/// The first successful [`ArtifactCell::get_or_load`] stores the artifact;
/// later calls return it without touching the filesystem. A failed load
/// stores nothing.
#[derive(Debug, Default)]
pub struct ArtifactCell {
    cell: OnceLock<ModelArtifact>,
}

impl ArtifactCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Option<&ModelArtifact> {
        self.cell.get()
    }

    pub fn get_or_load(&self, config: &ModelConfig) -> Result<&ModelArtifact, ArtifactError> {
        self.get_or_load_with(|| ArtifactLoader::load(config))
    }

    /// Like [`ArtifactCell::get_or_load`] with a custom loader.
    pub fn get_or_load_with<F>(&self, load: F) -> Result<&ModelArtifact, ArtifactError>
    where
        F: FnOnce() -> Result<ModelArtifact, ArtifactError>,
    {
        if let Some(artifact) = self.cell.get() {
            return Ok(artifact);
        }
        let artifact = load()?;
        // a concurrent loader may have won; keep its artifact
        Ok(self.cell.get_or_init(|| artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn linear_config(model: &NamedTempFile, thresholds: &NamedTempFile) -> ModelConfig {
        ModelConfig {
            model_path: model.path().to_string_lossy().into_owned(),
            thresholds_path: thresholds.path().to_string_lossy().into_owned(),
            format: ModelFormat::Linear,
            onnx_threads: 1,
        }
    }

    #[test]
    fn test_threshold_read() {
        let file = write_temp(r#"{"optimal_threshold": 0.42, "pr_auc": 0.8}"#);
        assert_eq!(ArtifactLoader::load_threshold(file.path()).unwrap(), 0.42);
    }

    #[test]
    fn test_threshold_defaults_when_key_absent() {
        let file = write_temp(r#"{"model": "RandomForest"}"#);
        assert_eq!(
            ArtifactLoader::load_threshold(file.path()).unwrap(),
            DEFAULT_THRESHOLD
        );
    }

    #[test]
    fn test_threshold_out_of_range() {
        let file = write_temp(r#"{"optimal_threshold": 1.5}"#);
        assert!(matches!(
            ArtifactLoader::load_threshold(file.path()),
            Err(ArtifactError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_threshold_file_errors() {
        assert!(matches!(
            ArtifactLoader::load_threshold("/nonexistent/thresholds.json"),
            Err(ArtifactError::Io { .. })
        ));

        let file = write_temp("not json");
        assert!(matches!(
            ArtifactLoader::load_threshold(file.path()),
            Err(ArtifactError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_linear_artifact() {
        let model = write_temp(
            r#"{"name": "qr_test", "intercept": 0.0, "coefficients": [0, 0, 0, 0, 0]}"#,
        );
        let thresholds = write_temp(r#"{"optimal_threshold": 0.61}"#);

        let artifact = ArtifactLoader::load(&linear_config(&model, &thresholds)).unwrap();
        assert_eq!(artifact.name, "qr_test");
        assert_eq!(artifact.threshold, 0.61);
    }

    #[test]
    fn test_missing_model_file() {
        let thresholds = write_temp(r#"{"optimal_threshold": 0.61}"#);
        let config = ModelConfig {
            model_path: "/nonexistent/model.onnx".to_string(),
            thresholds_path: thresholds.path().to_string_lossy().into_owned(),
            format: ModelFormat::Onnx,
            onnx_threads: 1,
        };
        assert!(matches!(
            ArtifactLoader::load(&config),
            Err(ArtifactError::Io { .. })
        ));
    }

    #[test]
    fn test_cell_loads_once() {
        let model = write_temp(r#"{"intercept": 0.0, "coefficients": [0, 0, 0, 0, 0]}"#);
        let thresholds = write_temp(r#"{"optimal_threshold": 0.3}"#);
        let config = linear_config(&model, &thresholds);

        let cell = ArtifactCell::new();
        assert!(cell.get().is_none());

        let first = cell.get_or_load(&config).unwrap() as *const ModelArtifact;
        let mut calls = 0;
        let second = cell
            .get_or_load_with(|| {
                calls += 1;
                ArtifactLoader::load(&config)
            })
            .unwrap() as *const ModelArtifact;

        assert_eq!(calls, 0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cell_failed_load_stores_nothing() {
        let cell = ArtifactCell::new();
        let result = cell.get_or_load_with(|| {
            Err(ArtifactError::InvalidModel {
                path: "m".into(),
                reason: "broken".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(cell.get().is_none());
    }
}
