//! Binary claim classifier backed by an ONNX export of the trained model

use crate::error::PredictError;
use crate::models::loader::LoadedModel;
use crate::models::preprocessor::FeatureMatrix;
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::sync::Mutex;
use tracing::debug;

/// Classifier output for one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Label reported by the model, when it exposes one
    pub label: Option<i64>,
    /// Probability of the positive class
    pub probability: f64,
}

/// Scoring step of the stored classifier
pub trait Classifier: Send + Sync {
    /// Score every row of the feature matrix
    fn score(&self, features: &FeatureMatrix) -> Result<Vec<Score>, PredictError>;

    /// Model name for logging
    fn name(&self) -> &str;
}

/// Classifier running an ONNX session
pub struct OnnxClassifier {
    /// ONNX sessions need exclusive access to run
    model: Mutex<LoadedModel>,
    name: String,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        let name = model.name.clone();
        Self {
            model: Mutex::new(model),
            name,
        }
    }
}

impl Classifier for OnnxClassifier {
    fn score(&self, features: &FeatureMatrix) -> Result<Vec<Score>, PredictError> {
        let inference = |e: ort::Error| PredictError::Inference(e.to_string());

        // Prepare input tensor - shape [rows, cols]
        let shape = vec![features.rows as i64, features.cols as i64];
        let input_tensor = Tensor::from_array((shape, features.data.clone())).map_err(inference)?;

        let mut guard = self
            .model
            .lock()
            .map_err(|e| PredictError::Inference(format!("Lock error: {}", e)))?;
        let model = &mut *guard;

        let outputs = model
            .session
            .run(ort::inputs![model.input_name.as_str() => input_tensor])
            .map_err(inference)?;

        let labels = match &model.label_output {
            Some(name) => {
                let value = outputs.get(name.as_str()).ok_or_else(|| {
                    PredictError::InvalidOutput(format!("missing output '{}'", name))
                })?;
                let (_, data) = value
                    .try_extract_tensor::<i64>()
                    .map_err(|e| PredictError::InvalidOutput(format!("label output '{}': {}", name, e)))?;
                Some(labels_for_rows(data, features.rows)?)
            }
            None => None,
        };

        let probability_value = outputs.get(model.probability_output.as_str()).ok_or_else(|| {
            PredictError::InvalidOutput(format!("missing output '{}'", model.probability_output))
        })?;
        let probabilities = extract_probabilities(probability_value, features.rows)?;

        debug!(
            model = %self.name,
            rows = features.rows,
            has_labels = labels.is_some(),
            "Classifier run complete"
        );

        Ok(probabilities
            .into_iter()
            .enumerate()
            .map(|(i, probability)| Score {
                label: labels.as_ref().and_then(|l| l.get(i).copied()),
                probability,
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Labels from the model's label output, one per input row
fn labels_for_rows(data: &[i64], rows: usize) -> Result<Vec<i64>, PredictError> {
    if data.len() != rows {
        return Err(PredictError::RowCountMismatch {
            expected: rows,
            got: data.len(),
        });
    }
    Ok(data.to_vec())
}

/// Positive-class probabilities from either a `[N, C]` tensor (XGBoost,
/// sklearn) or a `seq(map(int64, float))` output (LightGBM, CatBoost).
fn extract_probabilities(output: &ort::value::DynValue, rows: usize) -> Result<Vec<f64>, PredictError> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        return probabilities_from_tensor(&shape.iter().copied().collect::<Vec<i64>>(), data, rows);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return probabilities_from_sequence_map(output);
    }

    Err(PredictError::InvalidOutput(format!(
        "unsupported probability output type {:?}",
        dtype
    )))
}

fn probabilities_from_tensor(dims: &[i64], data: &[f32], rows: usize) -> Result<Vec<f64>, PredictError> {
    let classes = match dims {
        [_, classes] => *classes as usize,
        [_] if rows == 1 => data.len(),
        [_] => 1,
        _ => {
            return Err(PredictError::InvalidOutput(format!(
                "unexpected probability shape {:?}",
                dims
            )))
        }
    };

    if classes == 0 || data.len() != rows * classes {
        return Err(PredictError::InvalidOutput(format!(
            "probability shape {:?} does not match {} rows",
            dims, rows
        )));
    }

    Ok(data
        .chunks(classes)
        .map(|row| {
            if classes >= 2 {
                // [rows, classes] - positive class at index 1
                row[1] as f64
            } else {
                row[0] as f64
            }
        })
        .collect())
}

fn probabilities_from_sequence_map(output: &ort::value::DynValue) -> Result<Vec<f64>, PredictError> {
    let invalid = |e: ort::Error| PredictError::InvalidOutput(e.to_string());
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(invalid)?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(invalid)?;

    maps.iter()
        .map(|map| {
            let pairs = map.try_extract_key_values::<i64, f32>().map_err(invalid)?;
            if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
                return Ok(*p as f64);
            }
            pairs
                .iter()
                .find(|(class, _)| *class == 0)
                .map(|(_, p)| 1.0 - *p as f64)
                .ok_or_else(|| PredictError::InvalidOutput("no class probability in map".to_string()))
        })
        .collect()
}
