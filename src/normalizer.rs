//! Leading-number extraction for compound torque/power values.
//!
//! The raw dataset stores `max_torque` and `max_power` as strings such as
//! `"250Nm@2750rpm"` or `"88.50bhp@6000rpm"`. The model was trained on the
//! leading number only.

use crate::error::NormalizeError;
use crate::types::record::FeatureValue;
use regex::Regex;
use std::sync::OnceLock;

/// Columns that may arrive as compound strings
pub const COMPOUND_FIELDS: [&str; 2] = ["max_torque", "max_power"];

fn leading_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(\d+(?:\.\d*)?)").expect("valid leading-number regex"))
}

/// Returns true when `field` needs normalization before scoring
pub fn is_compound_field(field: &str) -> bool {
    COMPOUND_FIELDS.contains(&field)
}

/// Extract the leading number of a string as `f64`.
pub fn extract_leading_number(field: &str, raw: &str) -> Result<f64, NormalizeError> {
    let format_error = || NormalizeError::Format {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let captures = leading_number().captures(raw).ok_or_else(format_error)?;
    captures
        .get(1)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(format_error)
}

/// Normalize a torque/power value: numbers pass through, strings are
/// reduced to their leading number.
pub fn normalize(field: &str, value: &FeatureValue) -> Result<f64, NormalizeError> {
    match value {
        FeatureValue::Number(n) => Ok(*n),
        FeatureValue::Text(s) => extract_leading_number(field, s),
        FeatureValue::Missing => Err(NormalizeError::Format {
            field: field.to_string(),
            value: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_strings() {
        assert_eq!(extract_leading_number("max_torque", "250Nm@2750rpm"), Ok(250.0));
        assert_eq!(
            extract_leading_number("max_power", "88.50bhp@6000rpm"),
            Ok(88.5)
        );
        assert_eq!(extract_leading_number("max_torque", "150 Nm@4500rpm"), Ok(150.0));
        assert_eq!(extract_leading_number("max_power", "  40.36bhp"), Ok(40.36));
    }

    #[test]
    fn test_trailing_decimal_point() {
        assert_eq!(extract_leading_number("max_power", "113.bhp"), Ok(113.0));
    }

    #[test]
    fn test_plain_numeric_string() {
        assert_eq!(extract_leading_number("max_torque", "60"), Ok(60.0));
    }

    #[test]
    fn test_no_leading_digits() {
        let err = extract_leading_number("max_torque", "Nm 250").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Format {
                field: "max_torque".to_string(),
                value: "Nm 250".to_string(),
            }
        );
        assert!(extract_leading_number("max_power", "").is_err());
        assert!(extract_leading_number("max_power", ".5bhp").is_err());
    }

    #[test]
    fn test_numeric_passthrough() {
        assert_eq!(normalize("max_power", &FeatureValue::Number(100.0)), Ok(100.0));
        assert_eq!(
            normalize("max_power", &FeatureValue::from("67.06bhp@5500rpm")),
            Ok(67.06)
        );
        assert!(normalize("max_power", &FeatureValue::Missing).is_err());
    }

    #[test]
    fn test_compound_field_names() {
        assert!(is_compound_field("max_torque"));
        assert!(is_compound_field("max_power"));
        assert!(!is_compound_field("displacement"));
    }
}
