//! Stored model artifacts and the prediction path over them

pub mod adapter;
pub mod classifier;
pub mod loader;
pub mod preprocessor;

pub use adapter::PredictionAdapter;
pub use classifier::{Classifier, OnnxClassifier, Score};
pub use loader::ArtifactLoader;
pub use preprocessor::{ColumnTransformer, FeatureMatrix, Preprocessor};
