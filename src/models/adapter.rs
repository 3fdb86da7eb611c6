//! Prediction adapter: preprocessor transform followed by classifier scoring

use crate::config::AppConfig;
use crate::error::PredictError;
use crate::models::classifier::{Classifier, Score};
use crate::models::loader::ArtifactLoader;
use crate::models::preprocessor::Preprocessor;
use crate::types::prediction::{BatchPrediction, Prediction};
use crate::types::record::FeatureRecord;
use anyhow::Result;
use tracing::{debug, info};

/// Runs records through the stored preprocessor and classifier
pub struct PredictionAdapter {
    preprocessor: Box<dyn Preprocessor>,
    classifier: Box<dyn Classifier>,
    /// Probability cut-off used when the model reports no label
    threshold: f64,
}

impl PredictionAdapter {
    /// Load both artifacts named in the configuration.
    ///
    /// Either artifact missing is an error; the caller treats it as fatal.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let loader = ArtifactLoader::with_threads(config.artifacts.onnx_threads)?;

        let mut preprocessor = loader.load_preprocessor(&config.artifacts.preprocessor)?;
        if config.prediction.reject_unknown_categories {
            preprocessor = preprocessor.reject_unknown_categories();
        }
        let classifier = loader.load_classifier(&config.artifacts.classifier)?;

        info!(
            classifier = %classifier.name(),
            threshold = config.prediction.threshold,
            reject_unknown_categories = config.prediction.reject_unknown_categories,
            "Prediction adapter initialized"
        );

        Ok(Self::new(
            Box::new(preprocessor),
            Box::new(classifier),
            config.prediction.threshold,
        ))
    }

    pub fn new(
        preprocessor: Box<dyn Preprocessor>,
        classifier: Box<dyn Classifier>,
        threshold: f64,
    ) -> Self {
        Self {
            preprocessor,
            classifier,
            threshold,
        }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Score a single record, reporting label and positive-class probability
    pub fn predict_one(&self, record: &FeatureRecord) -> Result<Prediction, PredictError> {
        let scores = self.score(std::slice::from_ref(record))?;
        let (label, score) = scores
            .into_iter()
            .next()
            .ok_or(PredictError::EmptyBatch)?;

        debug!(
            policy_id = %record.policy_id,
            label = label,
            probability = score.probability,
            "Single prediction complete"
        );

        Ok(Prediction {
            label,
            probability: Some(score.probability),
        })
    }

    /// Score a batch of records, one label per record in input order
    pub fn predict_batch(&self, records: &[FeatureRecord]) -> Result<Vec<BatchPrediction>, PredictError> {
        let scores = self.score(records)?;

        let predictions: Vec<BatchPrediction> = records
            .iter()
            .zip(scores)
            .map(|(record, (label, _))| BatchPrediction {
                policy_id: record.policy_id.clone(),
                is_claim: label,
            })
            .collect();

        debug!(
            rows = predictions.len(),
            positives = predictions.iter().filter(|p| p.is_claim == 1).count(),
            "Batch prediction complete"
        );

        Ok(predictions)
    }

    fn score(&self, records: &[FeatureRecord]) -> Result<Vec<(u8, Score)>, PredictError> {
        if records.is_empty() {
            return Err(PredictError::EmptyBatch);
        }

        let features = self.preprocessor.transform(records)?;
        let expected = self.preprocessor.output_width();
        if features.cols != expected || features.data.len() != features.rows * features.cols {
            return Err(PredictError::ShapeMismatch {
                expected,
                got: features.cols,
            });
        }

        let scores = self.classifier.score(&features)?;
        if scores.len() != records.len() {
            return Err(PredictError::RowCountMismatch {
                expected: records.len(),
                got: scores.len(),
            });
        }

        scores
            .into_iter()
            .map(|score| Ok((self.label_for(&score)?, score)))
            .collect()
    }

    fn label_for(&self, score: &Score) -> Result<u8, PredictError> {
        let p = score.probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(PredictError::InvalidOutput(format!("probability {} outside [0, 1]", p)));
        }

        match score.label {
            Some(0) => Ok(0),
            Some(1) => Ok(1),
            Some(other) => Err(PredictError::InvalidOutput(format!("label {} is not binary", other))),
            None => Ok(u8::from(p >= self.threshold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::preprocessor::{ColumnTransformer, FeatureMatrix, Transformer};

    /// Logistic score over the sum of features
    struct SumClassifier;

    impl Classifier for SumClassifier {
        fn score(&self, features: &FeatureMatrix) -> Result<Vec<Score>, PredictError> {
            Ok((0..features.rows)
                .map(|i| {
                    let z: f32 = features.row(i).iter().sum();
                    Score {
                        label: None,
                        probability: 1.0 / (1.0 + (-z as f64).exp()),
                    }
                })
                .collect())
        }

        fn name(&self) -> &str {
            "sum"
        }
    }

    /// Returns a fixed score regardless of input
    struct FixedClassifier(Score);

    impl Classifier for FixedClassifier {
        fn score(&self, features: &FeatureMatrix) -> Result<Vec<Score>, PredictError> {
            Ok(vec![self.0; features.rows])
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn preprocessor() -> Box<dyn Preprocessor> {
        Box::new(
            ColumnTransformer::new(vec![
                Transformer::Passthrough {
                    columns: vec!["age_of_car".to_string()],
                },
                Transformer::OneHot {
                    columns: vec!["fuel_type".to_string()],
                    categories: vec![vec!["CNG".to_string(), "Petrol".to_string()]],
                    handle_unknown: Default::default(),
                },
            ])
            .unwrap(),
        )
    }

    fn record(id: &str, age: f64, fuel: &str) -> FeatureRecord {
        FeatureRecord::new(id).with("age_of_car", age).with("fuel_type", fuel)
    }

    #[test]
    fn test_single_prediction_is_binary_with_probability() {
        let adapter = PredictionAdapter::new(preprocessor(), Box::new(SumClassifier), 0.5);

        let prediction = adapter.predict_one(&record("ID_dummy", 2.0, "Petrol")).unwrap();

        assert!(prediction.label <= 1);
        let p = prediction.probability.unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(prediction.label, 1);
    }

    #[test]
    fn test_batch_preserves_order() {
        let adapter = PredictionAdapter::new(preprocessor(), Box::new(SumClassifier), 0.5);
        let records = vec![
            record("ID_a", -5.0, "CNG"),
            record("ID_b", 3.0, "CNG"),
            record("ID_c", -0.5, "Petrol"),
        ];

        let predictions = adapter.predict_batch(&records).unwrap();

        let ids: Vec<_> = predictions.iter().map(|p| p.policy_id.as_str()).collect();
        assert_eq!(ids, vec!["ID_a", "ID_b", "ID_c"]);
        let labels: Vec<_> = predictions.iter().map(|p| p.is_claim).collect();
        assert_eq!(labels, vec![0, 1, 1]);
    }

    #[test]
    fn test_model_label_takes_precedence() {
        let score = Score {
            label: Some(0),
            probability: 0.9,
        };
        let adapter = PredictionAdapter::new(preprocessor(), Box::new(FixedClassifier(score)), 0.5);

        let prediction = adapter.predict_one(&record("ID_dummy", 1.0, "CNG")).unwrap();
        assert_eq!(prediction.label, 0);
    }

    #[test]
    fn test_unknown_category_surfaces_error() {
        let adapter = PredictionAdapter::new(preprocessor(), Box::new(SumClassifier), 0.5);

        let err = adapter
            .predict_one(&record("ID_dummy", 1.0, "Hydrogen"))
            .unwrap_err();
        assert!(matches!(err, PredictError::UnknownCategory { .. }));
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let score = Score {
            label: None,
            probability: f64::NAN,
        };
        let adapter = PredictionAdapter::new(preprocessor(), Box::new(FixedClassifier(score)), 0.5);

        let err = adapter.predict_one(&record("ID_dummy", 1.0, "CNG")).unwrap_err();
        assert!(matches!(err, PredictError::InvalidOutput(_)));
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let score = Score {
            label: Some(2),
            probability: 0.4,
        };
        let adapter = PredictionAdapter::new(preprocessor(), Box::new(FixedClassifier(score)), 0.5);

        let err = adapter.predict_batch(&[record("ID_x", 1.0, "CNG")]).unwrap_err();
        assert!(matches!(err, PredictError::InvalidOutput(_)));
    }

    #[test]
    fn test_empty_batch() {
        let adapter = PredictionAdapter::new(preprocessor(), Box::new(SumClassifier), 0.5);
        assert!(matches!(adapter.predict_batch(&[]), Err(PredictError::EmptyBatch)));
    }
}
