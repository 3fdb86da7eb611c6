//! Submission file rendering for batch predictions.
//!
//! The output follows the column order of a reference template
//! (`sample_submission.csv`). Only the template's header is read.

use crate::error::SubmissionError;
use crate::schema::{ID_COLUMN, TARGET_COLUMN};
use crate::types::prediction::BatchPrediction;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

/// Column layout of the reference submission file
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTemplate {
    columns: Vec<String>,
}

impl SubmissionTemplate {
    /// Read the template header from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubmissionError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SubmissionError::TemplateNotFound(path.display().to_string()),
            _ => SubmissionError::Io(e),
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let columns = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        Self::from_columns(columns)
    }

    /// Build from header names; both `policy_id` and `is_claim` must be present
    pub fn from_columns(columns: Vec<String>) -> Result<Self, SubmissionError> {
        for required in [ID_COLUMN, TARGET_COLUMN] {
            if !columns.iter().any(|c| c == required) {
                return Err(SubmissionError::MissingColumn(required.to_string()));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Write predictions as CSV in template column order.
    ///
    /// Template columns other than `policy_id` and `is_claim` are left empty.
    pub fn render(&self, predictions: &[BatchPrediction]) -> Result<Vec<u8>, SubmissionError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;

        for prediction in predictions {
            let label = prediction.is_claim.to_string();
            let row = self.columns.iter().map(|column| match column.as_str() {
                ID_COLUMN => prediction.policy_id.as_str(),
                TARGET_COLUMN => label.as_str(),
                _ => "",
            });
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| SubmissionError::Io(e.into_error()))?;

        info!(
            rows = predictions.len(),
            columns = self.columns.len(),
            "Submission rendered"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn predictions() -> Vec<BatchPrediction> {
        vec![
            BatchPrediction {
                policy_id: "ID00001".to_string(),
                is_claim: 0,
            },
            BatchPrediction {
                policy_id: "ID00002".to_string(),
                is_claim: 1,
            },
        ]
    }

    #[test]
    fn test_render_follows_template_order() {
        let template =
            SubmissionTemplate::from_columns(vec!["is_claim".to_string(), "policy_id".to_string()]).unwrap();

        let csv = String::from_utf8(template.render(&predictions()).unwrap()).unwrap();

        assert_eq!(csv, "is_claim,policy_id\n0,ID00001\n1,ID00002\n");
    }

    #[test]
    fn test_extra_template_columns_left_empty() {
        let template = SubmissionTemplate::from_columns(vec![
            "policy_id".to_string(),
            "region".to_string(),
            "is_claim".to_string(),
        ])
        .unwrap();

        let csv = String::from_utf8(template.render(&predictions()).unwrap()).unwrap();
        assert_eq!(csv, "policy_id,region,is_claim\nID00001,,0\nID00002,,1\n");
    }

    #[test]
    fn test_template_without_target_column() {
        let err = SubmissionTemplate::from_columns(vec!["policy_id".to_string()]).unwrap_err();
        assert!(matches!(err, SubmissionError::MissingColumn(ref c) if c == "is_claim"));
    }

    #[test]
    fn test_missing_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SubmissionTemplate::load(dir.path().join("sample_submission.csv")).unwrap_err();
        assert!(matches!(err, SubmissionError::TemplateNotFound(_)));
    }

    #[test]
    fn test_load_template_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "policy_id,is_claim").unwrap();
        writeln!(file, "ID58593,0").unwrap();

        let template = SubmissionTemplate::load(file.path()).unwrap();
        assert_eq!(template.columns(), &["policy_id".to_string(), "is_claim".to_string()]);
    }
}
