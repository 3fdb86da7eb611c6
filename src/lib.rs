//! Car Insurance Claim Predictor Library
//!
//! Serves a previously trained claim model: collects policy features from a
//! form or a CSV upload, applies the stored preprocessor and ONNX classifier,
//! and renders the prediction or a submission file.

pub mod batch;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod report;
pub mod schema;
pub mod submission;
pub mod types;
pub mod web;

pub use collector::InputCollector;
pub use config::AppConfig;
pub use models::adapter::PredictionAdapter;
pub use schema::FeatureSchema;
pub use types::{prediction::Prediction, record::FeatureRecord};
