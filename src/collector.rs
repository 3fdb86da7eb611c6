//! Input collection: form fields and uploaded CSV files to feature records.

use crate::error::CollectError;
use crate::normalizer;
use crate::schema::{FeatureSchema, FieldKind, ID_COLUMN};
use crate::types::record::{FeatureRecord, FeatureValue, FORM_POLICY_ID};
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Builds feature records from operator input
pub struct InputCollector {
    schema: FeatureSchema,
}

impl InputCollector {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Build a record from submitted form fields.
    ///
    /// Every schema field must be present. Numbers are checked against the
    /// form bounds (whole numbers for integer inputs) and selections against
    /// the offered options.
    pub fn from_form(&self, fields: &HashMap<String, String>) -> Result<FeatureRecord, CollectError> {
        let mut record = FeatureRecord::new(FORM_POLICY_ID);

        for spec in self.schema.fields() {
            let raw = fields
                .get(spec.name)
                .map(|v| v.trim())
                .ok_or_else(|| CollectError::MissingField(spec.name.to_string()))?;

            match &spec.kind {
                FieldKind::Numeric { min, max, integer, .. } => {
                    let invalid = || CollectError::InvalidNumber {
                        field: spec.name.to_string(),
                        value: raw.to_string(),
                    };
                    let value: f64 = raw.parse().map_err(|_| invalid())?;
                    if *integer && value.fract() != 0.0 {
                        return Err(invalid());
                    }
                    let upper = max.unwrap_or(f64::INFINITY);
                    if !value.is_finite() || value < *min || value > upper {
                        return Err(CollectError::OutOfRange {
                            field: spec.name.to_string(),
                            value,
                            min: *min,
                            max: upper,
                        });
                    }
                    record.set(spec.name, value);
                }
                FieldKind::Categorical { options } => {
                    if !options.iter().any(|option| *option == raw) {
                        return Err(CollectError::InvalidOption {
                            field: spec.name.to_string(),
                            value: raw.to_string(),
                        });
                    }
                    record.set(spec.name, raw);
                }
            }
        }

        Ok(record)
    }

    /// Build one record per row of an uploaded CSV.
    ///
    /// All columns are kept so the preprocessor sees exactly what was
    /// uploaded. Numeric schema columns are parsed, `max_torque` and
    /// `max_power` are normalized, anything else stays text. The first bad
    /// value aborts the batch.
    pub fn from_csv<R: Read>(&self, reader: R) -> Result<Vec<FeatureRecord>, CollectError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();

        let id_index = headers
            .iter()
            .position(|h| h == ID_COLUMN)
            .ok_or_else(|| CollectError::MissingColumn(ID_COLUMN.to_string()))?;

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let line = row + 1;
            let row = result?;
            let mut record = FeatureRecord::new(row.get(id_index).unwrap_or_default());

            for (column, cell) in headers.iter().zip(row.iter()) {
                if column == ID_COLUMN {
                    continue;
                }
                let value = self.parse_cell(line, column, cell)?;
                record.set(column, value);
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(CollectError::Empty);
        }

        debug!(
            rows = records.len(),
            columns = headers.len(),
            "Collected batch records"
        );
        Ok(records)
    }

    fn parse_cell(&self, line: usize, column: &str, cell: &str) -> Result<FeatureValue, CollectError> {
        if cell.is_empty() {
            return Ok(FeatureValue::Missing);
        }

        if normalizer::is_compound_field(column) {
            return normalizer::extract_leading_number(column, cell)
                .map(FeatureValue::Number)
                .map_err(|source| CollectError::Normalize { line, source });
        }

        match self.schema.field(column) {
            Some(spec) if spec.is_numeric() => {
                cell.parse::<f64>()
                    .map(FeatureValue::Number)
                    .map_err(|_| CollectError::InvalidCell {
                        line,
                        column: column.to_string(),
                        value: cell.to_string(),
                    })
            }
            _ => Ok(FeatureValue::Text(cell.to_string())),
        }
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new(FeatureSchema::new())
    }
}

/// Form values pre-filled with the schema defaults and first options
pub fn default_form_values(schema: &FeatureSchema) -> HashMap<String, String> {
    schema
        .fields()
        .iter()
        .map(|spec| {
            let value = match &spec.kind {
                FieldKind::Numeric { default, integer, .. } => {
                    if *integer {
                        format!("{}", *default as i64)
                    } else {
                        format!("{:.1}", default)
                    }
                }
                FieldKind::Categorical { options } => options.first().copied().unwrap_or_default().to_string(),
            };
            (spec.name.to_string(), value)
        })
        .collect()
}
