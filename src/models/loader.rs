//! Artifact loader for the preprocessor and the ONNX classifier

use crate::models::classifier::OnnxClassifier;
use crate::models::preprocessor::{ColumnTransformer, Preprocessor};
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for predicted labels, if the export has one
    pub label_output: Option<String>,
    /// Output name for probabilities
    pub probability_output: String,
}

/// Loader for the stored preprocessing and classification artifacts
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a new loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        // Initialize ONNX Runtime
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the preprocessor artifact
    pub fn load_preprocessor<P: AsRef<Path>>(&self, path: P) -> Result<ColumnTransformer> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading preprocessor");

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preprocessor from {}", path.display()))?;
        let preprocessor = ColumnTransformer::from_json(&json)
            .with_context(|| format!("Failed to parse preprocessor from {}", path.display()))?;

        info!(
            inputs = preprocessor.input_columns().len(),
            outputs = preprocessor.output_width(),
            "Preprocessor loaded successfully"
        );
        Ok(preprocessor)
    }

    /// Load the classifier ONNX model
    pub fn load_classifier<P: AsRef<Path>>(&self, path: P) -> Result<OnnxClassifier> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classifier".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        if !path.exists() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().find(|o| !o.name.contains("label")))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            label = ?label_output,
            probabilities = %probability_output,
            "Model loaded successfully"
        );

        Ok(OnnxClassifier::new(LoadedModel {
            name,
            session,
            input_name,
            label_output,
            probability_output,
        }))
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_preprocessor_is_fatal() {
        let loader = ArtifactLoader::default();
        let err = loader
            .load_preprocessor("does/not/exist/preprocessor.json")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read preprocessor"));
    }

    #[test]
    fn test_load_preprocessor_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "transformers": [ {{ "kind": "passthrough", "columns": ["age_of_car"] }} ] }}"#
        )
        .unwrap();

        let preprocessor = ArtifactLoader::default().load_preprocessor(file.path()).unwrap();
        assert_eq!(preprocessor.input_columns(), vec!["age_of_car"]);
    }

    #[test]
    fn test_missing_classifier_is_fatal() {
        let loader = ArtifactLoader::default();
        let err = loader.load_classifier("does/not/exist/model.onnx").err().unwrap();
        assert!(err.to_string().contains("Model file not found"));
    }
}
