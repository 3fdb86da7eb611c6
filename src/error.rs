//! Error types for the claim predictor.
//!
//! Each stage of the request path has its own error so the front end can
//! decide how to surface it. Startup and CLI code wraps these in `anyhow`.

use thiserror::Error;

/// A torque/power value that does not start with a number
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Invalid format for {field}: '{value}' has no leading number")]
    Format { field: String, value: String },
}

/// Errors while turning form fields or CSV rows into feature records
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Missing form field: {0}")]
    MissingField(String),

    #[error("Invalid number for {field}: '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid option for {field}: '{value}'")]
    InvalidOption { field: String, value: String },

    #[error("Line {line}: {source}")]
    Normalize {
        line: usize,
        #[source]
        source: NormalizeError,
    },

    #[error("Line {line}: invalid number in column {column}: '{value}'")]
    InvalidCell {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Uploaded file is missing the '{0}' column")]
    MissingColumn(String),

    #[error("Uploaded file contains no rows")]
    Empty,

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures of the preprocessing or classification step
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("columns are missing: {0}")]
    MissingColumn(String),

    #[error("Found unknown categories ['{value}'] in column '{column}' during transform")]
    UnknownCategory { column: String, value: String },

    #[error("non-numeric value '{value}' in column '{column}'")]
    NonNumeric { column: String, value: String },

    #[error("Input contains NaN in column '{0}'")]
    MissingValue(String),

    #[error("Invalid preprocessor artifact: {0}")]
    InvalidArtifact(String),

    #[error("Feature shape mismatch, expected: {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Classifier returned {got} rows for {expected} records")]
    RowCountMismatch { expected: usize, got: usize },

    #[error("Classifier returned invalid output: {0}")]
    InvalidOutput(String),

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("No records to predict")]
    EmptyBatch,
}

/// Errors while building the downloadable submission file
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Submission template not found: {0}")]
    TemplateNotFound(String),

    #[error("Submission template lacks the '{0}' column")]
    MissingColumn(String),

    #[error("Failed to read submission template: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write submission CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_display() {
        let error = PredictError::UnknownCategory {
            column: "fuel_type".to_string(),
            value: "Hydrogen".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Found unknown categories ['Hydrogen'] in column 'fuel_type' during transform"
        );
    }

    #[test]
    fn test_normalize_error_carries_line() {
        let error = CollectError::Normalize {
            line: 3,
            source: NormalizeError::Format {
                field: "max_power".to_string(),
                value: "n/a".to_string(),
            },
        };
        assert_eq!(
            error.to_string(),
            "Line 3: Invalid format for max_power: 'n/a' has no leading number"
        );
    }
}
