//! Type definitions for the claim predictor

pub mod prediction;
pub mod record;

pub use prediction::{BatchPrediction, Prediction};
pub use record::{FeatureRecord, FeatureValue, FORM_POLICY_ID};
