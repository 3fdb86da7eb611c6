//! Fitted column transformer applied before model scoring.
//!
//! The artifact is a JSON document written by the training pipeline. It
//! lists transformers in output order; each one reads named columns and
//! emits a block of dense features:
//!
//! ```json
//! {
//!   "transformers": [
//!     { "kind": "standard_scaler", "columns": ["age_of_car"], "mean": [0.07], "scale": [0.06] },
//!     { "kind": "one_hot", "columns": ["fuel_type"],
//!       "categories": [["CNG", "Diesel", "Petrol"]], "handle_unknown": "error" },
//!     { "kind": "passthrough", "columns": ["ncap_rating"] }
//!   ]
//! }
//! ```
//!
//! Columns not named by any transformer are dropped.

use crate::error::PredictError;
use crate::types::record::{FeatureRecord, FeatureValue};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Dense row-major feature matrix fed to the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }
}

/// Transform step of a stored preprocessing pipeline
pub trait Preprocessor: Send + Sync {
    /// Turn records into the dense matrix the classifier was trained on
    fn transform(&self, records: &[FeatureRecord]) -> Result<FeatureMatrix, PredictError>;

    /// Number of output features per record
    fn output_width(&self) -> usize;
}

/// What a one-hot encoder does with a category it was not fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

/// A fitted transformer over a group of columns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transformer {
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
        /// Imputed value per column for missing cells
        #[serde(default)]
        fill: Option<Vec<f64>>,
    },
    OneHot {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

impl Transformer {
    fn columns(&self) -> &[String] {
        match self {
            Transformer::StandardScaler { columns, .. }
            | Transformer::OneHot { columns, .. }
            | Transformer::Passthrough { columns } => columns,
        }
    }

    fn width(&self) -> usize {
        match self {
            Transformer::OneHot { categories, .. } => categories.iter().map(Vec::len).sum(),
            other => other.columns().len(),
        }
    }

    fn validate(&self) -> Result<(), PredictError> {
        let n = self.columns().len();
        let check = |what: &str, len: usize| {
            if len == n {
                Ok(())
            } else {
                Err(PredictError::InvalidArtifact(format!(
                    "{} has {} entries for {} columns",
                    what, len, n
                )))
            }
        };

        match self {
            Transformer::StandardScaler {
                mean, scale, fill, ..
            } => {
                check("mean", mean.len())?;
                check("scale", scale.len())?;
                if let Some(fill) = fill {
                    check("fill", fill.len())?;
                }
                Ok(())
            }
            Transformer::OneHot { categories, .. } => check("categories", categories.len()),
            Transformer::Passthrough { .. } => Ok(()),
        }
    }
}

/// Column transformer loaded from the preprocessor artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    transformers: Vec<Transformer>,
}

impl ColumnTransformer {
    /// Build from transformers, checking that parameter lengths line up
    pub fn new(transformers: Vec<Transformer>) -> Result<Self, PredictError> {
        for transformer in &transformers {
            transformer.validate()?;
        }
        Ok(Self { transformers })
    }

    /// Parse a preprocessor artifact
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let parsed: ColumnTransformer =
            serde_json::from_str(json).map_err(|e| PredictError::InvalidArtifact(e.to_string()))?;
        Self::new(parsed.transformers)
    }

    /// Treat every unknown category as an error, whatever the artifact says
    pub fn reject_unknown_categories(mut self) -> Self {
        for transformer in &mut self.transformers {
            if let Transformer::OneHot { handle_unknown, .. } = transformer {
                *handle_unknown = HandleUnknown::Error;
            }
        }
        self
    }

    /// Names of every input column the transformer reads
    pub fn input_columns(&self) -> Vec<&str> {
        self.transformers
            .iter()
            .flat_map(|t| t.columns().iter().map(String::as_str))
            .collect()
    }

    fn check_columns(&self, record: &FeatureRecord) -> Result<(), PredictError> {
        let missing: Vec<&str> = self
            .input_columns()
            .into_iter()
            .filter(|c| record.get(c).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PredictError::MissingColumn(format!("{{'{}'}}", missing.join("', '"))))
        }
    }

    fn transform_record(&self, record: &FeatureRecord, out: &mut Vec<f32>) -> Result<(), PredictError> {
        for transformer in &self.transformers {
            match transformer {
                Transformer::StandardScaler {
                    columns,
                    mean,
                    scale,
                    fill,
                } => {
                    for (i, column) in columns.iter().enumerate() {
                        let x = match numeric(record, column)? {
                            Some(x) => x,
                            None => fill
                                .as_ref()
                                .map(|f| f[i])
                                .ok_or_else(|| PredictError::MissingValue(column.clone()))?,
                        };
                        let s = if scale[i] == 0.0 { 1.0 } else { scale[i] };
                        out.push(((x - mean[i]) / s) as f32);
                    }
                }
                Transformer::OneHot {
                    columns,
                    categories,
                    handle_unknown,
                } => {
                    for (column, vocabulary) in columns.iter().zip(categories) {
                        let value = record
                            .get(column)
                            .and_then(FeatureValue::as_category)
                            .ok_or_else(|| PredictError::MissingValue(column.clone()))?;
                        let hit = vocabulary.iter().position(|c| *c == value);

                        if hit.is_none() {
                            match handle_unknown {
                                HandleUnknown::Error => {
                                    return Err(PredictError::UnknownCategory {
                                        column: column.clone(),
                                        value,
                                    })
                                }
                                HandleUnknown::Ignore => {
                                    warn!(
                                        policy_id = %record.policy_id,
                                        column = %column,
                                        value = %value,
                                        "Unknown category encoded as all zeros"
                                    );
                                }
                            }
                        }

                        out.extend((0..vocabulary.len()).map(|j| if Some(j) == hit { 1.0 } else { 0.0 }));
                    }
                }
                Transformer::Passthrough { columns } => {
                    for column in columns {
                        let x = numeric(record, column)?
                            .ok_or_else(|| PredictError::MissingValue(column.clone()))?;
                        out.push(x as f32);
                    }
                }
            }
        }
        Ok(())
    }
}

fn numeric(record: &FeatureRecord, column: &str) -> Result<Option<f64>, PredictError> {
    match record.get(column) {
        None => Err(PredictError::MissingColumn(format!("{{'{}'}}", column))),
        Some(FeatureValue::Missing) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| PredictError::NonNumeric {
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Preprocessor for ColumnTransformer {
    fn transform(&self, records: &[FeatureRecord]) -> Result<FeatureMatrix, PredictError> {
        let cols = self.output_width();
        let mut data = Vec::with_capacity(records.len() * cols);

        for record in records {
            self.check_columns(record)?;
            self.transform_record(record, &mut data)?;
        }

        Ok(FeatureMatrix {
            rows: records.len(),
            cols,
            data,
        })
    }

    fn output_width(&self) -> usize {
        self.transformers.iter().map(Transformer::width).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ColumnTransformer {
        ColumnTransformer::from_json(
            r#"{
                "transformers": [
                    { "kind": "standard_scaler", "columns": ["age_of_car", "max_power"],
                      "mean": [5.0, 100.0], "scale": [2.0, 0.0], "fill": [5.0, 100.0] },
                    { "kind": "one_hot", "columns": ["fuel_type", "make"],
                      "categories": [["CNG", "Diesel", "Petrol"], ["1", "2"]],
                      "handle_unknown": "ignore" },
                    { "kind": "passthrough", "columns": ["ncap_rating"] }
                ]
            }"#,
        )
        .unwrap()
    }

    fn record() -> FeatureRecord {
        FeatureRecord::new("ID_1")
            .with("age_of_car", 7.0)
            .with("max_power", 120.0)
            .with("fuel_type", "Diesel")
            .with("make", 2.0)
            .with("ncap_rating", "3")
    }

    #[test]
    fn test_transform_layout() {
        let transformer = artifact();
        assert_eq!(transformer.output_width(), 8);

        let matrix = transformer.transform(&[record()]).unwrap();

        assert_eq!(matrix.rows, 1);
        assert_eq!(matrix.cols, 8);
        // zero scale is treated as 1
        assert_eq!(matrix.row(0), &[1.0, 20.0, 0.0, 1.0, 0.0, 0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_missing_column() {
        let mut incomplete = record();
        incomplete.values.remove("fuel_type");

        let err = artifact().transform(&[incomplete]).unwrap_err();
        assert!(matches!(err, PredictError::MissingColumn(ref c) if c.contains("fuel_type")));
    }

    #[test]
    fn test_missing_value_uses_fill() {
        let rec = record().with("age_of_car", FeatureValue::Missing);

        let matrix = artifact().transform(&[rec]).unwrap();
        assert_eq!(matrix.row(0)[0], 0.0);
    }

    #[test]
    fn test_ignored_unknown_category_is_zero_vector() {
        let rec = record().with("fuel_type", "Hydrogen");

        let matrix = artifact().transform(&[rec]).unwrap();
        assert_eq!(&matrix.row(0)[2..5], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_strict_mode_rejects_unknown_category() {
        let rec = record().with("fuel_type", "Hydrogen");

        let err = artifact()
            .reject_unknown_categories()
            .transform(&[rec])
            .unwrap_err();
        assert!(matches!(
            err,
            PredictError::UnknownCategory { ref column, ref value }
                if column == "fuel_type" && value == "Hydrogen"
        ));
    }

    #[test]
    fn test_non_numeric_value() {
        let rec = record().with("ncap_rating", "five");

        let err = artifact().transform(&[rec]).unwrap_err();
        assert!(matches!(err, PredictError::NonNumeric { .. }));
    }

    #[test]
    fn test_rejects_inconsistent_artifact() {
        let err = ColumnTransformer::from_json(
            r#"{ "transformers": [
                { "kind": "standard_scaler", "columns": ["a", "b"], "mean": [0.0], "scale": [1.0, 1.0] }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::InvalidArtifact(_)));
    }

    #[test]
    fn test_extra_columns_are_dropped() {
        let rec = record().with("segment", "B2");

        let matrix = artifact().transform(&[rec]).unwrap();
        assert_eq!(matrix.cols, 8);
    }
}
