//! Classifier backends and artifact loading

pub mod classifier;
pub mod linear;
pub mod loader;
pub mod onnx;

pub use classifier::{FraudClassifier, ProbabilityMatrix};
pub use linear::LinearClassifier;
pub use loader::{ArtifactCell, ArtifactLoader, ModelArtifact};
pub use onnx::OnnxClassifier;
