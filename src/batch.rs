//! Batch scoring: uploaded CSV in, submission CSV out.

use crate::collector::InputCollector;
use crate::error::{CollectError, PredictError, SubmissionError};
use crate::models::PredictionAdapter;
use crate::submission::SubmissionTemplate;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Any failure that aborts a batch
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// A rendered submission file
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub csv: Vec<u8>,
    pub rows: usize,
    pub positives: usize,
}

/// Score every row of `input` and render the submission.
///
/// Nothing is produced unless every step succeeds.
pub fn score_csv<R: Read, P: AsRef<Path>>(
    collector: &InputCollector,
    adapter: &PredictionAdapter,
    input: R,
    template_path: P,
) -> Result<BatchOutput, BatchError> {
    let template = SubmissionTemplate::load(template_path)?;
    let records = collector.from_csv(input)?;
    let predictions = adapter.predict_batch(&records)?;
    let csv = template.render(&predictions)?;

    let positives = predictions.iter().filter(|p| p.is_claim == 1).count();
    info!(rows = predictions.len(), positives = positives, "Batch scored");

    Ok(BatchOutput {
        csv,
        rows: predictions.len(),
        positives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::preprocessor::{ColumnTransformer, FeatureMatrix, Transformer};
    use crate::models::{Classifier, Score};

    struct ThresholdClassifier;

    impl Classifier for ThresholdClassifier {
        fn score(&self, features: &FeatureMatrix) -> Result<Vec<Score>, PredictError> {
            Ok((0..features.rows)
                .map(|i| Score {
                    label: None,
                    probability: if features.row(i)[0] > 100.0 { 0.8 } else { 0.2 },
                })
                .collect())
        }

        fn name(&self) -> &str {
            "threshold"
        }
    }

    fn adapter() -> PredictionAdapter {
        let preprocessor = ColumnTransformer::new(vec![Transformer::Passthrough {
            columns: vec!["max_power".to_string()],
        }])
        .unwrap();
        PredictionAdapter::new(Box::new(preprocessor), Box::new(ThresholdClassifier), 0.5)
    }

    fn template_dir(header: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample_submission.csv"), format!("{}\nID0,0\n", header)).unwrap();
        dir
    }

    #[test]
    fn test_output_follows_template_regardless_of_input_order() {
        let dir = template_dir("is_claim,policy_id");
        let input = "max_power,policy_id\n88.50bhp@6000rpm,ID1\n118.36bhp@5500rpm,ID2\n";

        let output = score_csv(
            &InputCollector::default(),
            &adapter(),
            input.as_bytes(),
            dir.path().join("sample_submission.csv"),
        )
        .unwrap();

        assert_eq!(output.rows, 2);
        assert_eq!(output.positives, 1);
        assert_eq!(
            String::from_utf8(output.csv).unwrap(),
            "is_claim,policy_id\n0,ID1\n1,ID2\n"
        );
    }

    #[test]
    fn test_missing_template_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = "policy_id,max_power\nID1,88.5\n";

        let err = score_csv(
            &InputCollector::default(),
            &adapter(),
            input.as_bytes(),
            dir.path().join("sample_submission.csv"),
        )
        .unwrap_err();

        assert!(matches!(err, BatchError::Submission(SubmissionError::TemplateNotFound(_))));
    }

    #[test]
    fn test_malformed_value_aborts_batch() {
        let dir = template_dir("policy_id,is_claim");
        let input = "policy_id,max_power\nID1,88.5\nID2,bhp\n";

        let err = score_csv(
            &InputCollector::default(),
            &adapter(),
            input.as_bytes(),
            dir.path().join("sample_submission.csv"),
        )
        .unwrap_err();

        assert!(matches!(err, BatchError::Collect(CollectError::Normalize { line: 2, .. })));
    }

    #[test]
    fn test_missing_feature_column() {
        let dir = template_dir("policy_id,is_claim");
        let input = "policy_id,max_torque\nID1,60\n";

        let err = score_csv(
            &InputCollector::default(),
            &adapter(),
            input.as_bytes(),
            dir.path().join("sample_submission.csv"),
        )
        .unwrap_err();

        assert!(matches!(err, BatchError::Predict(PredictError::MissingColumn(_))));
    }
}
