//! Feature record data structures for claim prediction

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier used for records collected from the interactive form
pub const FORM_POLICY_ID: &str = "ID_dummy";

/// A single input value as it arrives from the form or a CSV cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    /// Numeric view of the value, if it has one.
    ///
    /// Text is accepted when it parses cleanly as a float, so a CSV cell
    /// holding `"4"` can feed a numeric column.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Text(s) => s.trim().parse().ok(),
            FeatureValue::Missing => None,
        }
    }

    /// Canonical category string used for vocabulary lookups.
    ///
    /// Integral numbers render without a fraction so `1.0` and `"1"` match.
    pub fn as_category(&self) -> Option<String> {
        match self {
            FeatureValue::Text(s) => Some(s.trim().to_string()),
            FeatureValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(format!("{}", *n as i64))
            }
            FeatureValue::Number(n) => Some(n.to_string()),
            FeatureValue::Missing => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Text(s) => write!(f, "{}", s),
            FeatureValue::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

/// One policy to score: an identifier plus named feature values.
///
/// Built per form submission or per CSV row and dropped once scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Policy identifier (`policy_id` column)
    pub policy_id: String,

    /// Feature values keyed by column name
    pub values: BTreeMap<String, FeatureValue>,
}

impl FeatureRecord {
    /// Create an empty record for the given policy
    pub fn new(policy_id: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a feature value, replacing any previous one
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`FeatureRecord::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
