//! Prediction result structures

use serde::{Deserialize, Serialize};

/// Outcome of scoring one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted `is_claim` label (0 or 1)
    pub label: u8,

    /// Positive-class probability; only reported for single-record scoring
    pub probability: Option<f64>,
}

impl Prediction {
    pub fn is_claim(&self) -> bool {
        self.label == 1
    }

    /// Human-readable summary shown under the form
    pub fn summary(&self) -> String {
        let answer = if self.is_claim() { "Yes" } else { "No" };
        match self.probability {
            Some(p) => format!("Claim Prediction: {} (Probability: {:.2})", answer, p),
            None => format!("Claim Prediction: {}", answer),
        }
    }
}

/// Predicted label for a policy in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub policy_id: String,
    pub is_claim: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_formatting() {
        let positive = Prediction {
            label: 1,
            probability: Some(0.734),
        };
        assert_eq!(positive.summary(), "Claim Prediction: Yes (Probability: 0.73)");

        let negative = Prediction {
            label: 0,
            probability: None,
        };
        assert_eq!(negative.summary(), "Claim Prediction: No");
    }
}
