//! Configuration management for the claim predictor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub server: ServerConfig,
    pub prediction: PredictionConfig,
    pub batch: BatchConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Stored model artifacts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactsConfig {
    /// Fitted preprocessor (JSON column transformer)
    pub preprocessor: String,
    /// Trained classifier (ONNX)
    pub classifier: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// HTTP front end
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted batch upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// Prediction behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionConfig {
    /// Probability cut-off when the model exposes no label output
    pub threshold: f64,
    /// Fail on categories outside the training vocabulary instead of
    /// encoding them as all zeros
    #[serde(default = "default_reject_unknown")]
    pub reject_unknown_categories: bool,
}

fn default_reject_unknown() -> bool {
    true
}

/// Batch scoring
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Reference submission whose column order the output follows
    pub submission_template: String,
    /// File name offered for download
    pub output_file_name: String,
}

/// Static report images
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    pub images_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a specific path.
    ///
    /// Built-in defaults are overlaid by the file (optional) and then by
    /// `CLAIM__SECTION__KEY` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("CLAIM").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Where batch mode writes the submission file
    pub fn batch_output_path(&self, requested: Option<PathBuf>) -> PathBuf {
        requested.unwrap_or_else(|| PathBuf::from(&self.batch.output_file_name))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                preprocessor: "artifacts/preprocessor.json".to_string(),
                classifier: "artifacts/final_xgb_model.onnx".to_string(),
                onnx_threads: 1,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8501,
                max_upload_bytes: default_max_upload_bytes(),
            },
            prediction: PredictionConfig {
                threshold: 0.5,
                reject_unknown_categories: true,
            },
            batch: BatchConfig {
                submission_template: "data/sample_submission.csv".to_string(),
                output_file_name: "submission.csv".to_string(),
            },
            report: ReportConfig {
                images_dir: "reports".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.prediction.threshold, 0.5);
        assert!(config.prediction.reject_unknown_categories);
        assert_eq!(config.batch.output_file_name, "submission.csv");
    }

    #[test]
    fn test_batch_output_path() {
        let mut config = AppConfig::default();
        config.batch.output_file_name = "claims.csv".to_string();

        assert_eq!(config.batch_output_path(None), PathBuf::from("claims.csv"));
        assert_eq!(
            config.batch_output_path(Some(PathBuf::from("out/run.csv"))),
            PathBuf::from("out/run.csv")
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(config.artifacts.classifier, "artifacts/final_xgb_model.onnx");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nhost = \"127.0.0.1\"\nport = 9000\n").unwrap();
        writeln!(file, "[prediction]\nthreshold = 0.3\n").unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.prediction.threshold, 0.3);
        // untouched keys keep their defaults
        assert!(config.prediction.reject_unknown_categories);
        assert_eq!(config.report.images_dir, "reports");
    }
}
