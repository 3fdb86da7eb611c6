//! Static EDA report images shown below the prediction form

use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Report images and their captions, in display order
pub const REPORT_IMAGES: [(&str, &str); 4] = [
    ("claim_distribution.png", "Claim Distribution"),
    ("correlation_heatmap.png", "Correlation Heatmap"),
    ("claim_by_fuel.png", "Claim Rate by Fuel Type"),
    ("confusion_matrix.png", "Confusion Matrix"),
];

/// Warning shown when any report image is absent
pub const MISSING_IMAGES_WARNING: &str =
    "EDA images not found. Please run the training pipeline first to generate visualizations.";

/// One report image available for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportImage {
    pub file_name: &'static str,
    pub caption: &'static str,
}

/// What the report section can show right now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub images: Vec<ReportImage>,
    pub warning: Option<&'static str>,
}

/// Best-effort viewer over the report image directory
#[derive(Debug, Clone)]
pub struct ReportViewer {
    images_dir: PathBuf,
}

impl ReportViewer {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    /// Check which images exist. Absent files only produce a warning.
    pub fn view(&self) -> ReportView {
        let mut images = Vec::new();
        let mut missing = Vec::new();

        for (file_name, caption) in REPORT_IMAGES {
            if self.images_dir.join(file_name).is_file() {
                images.push(ReportImage { file_name, caption });
            } else {
                missing.push(file_name);
            }
        }

        if !missing.is_empty() {
            warn!(
                dir = %self.images_dir.display(),
                missing = ?missing,
                "Report images not found"
            );
        }

        ReportView {
            images,
            warning: (!missing.is_empty()).then_some(MISSING_IMAGES_WARNING),
        }
    }

    /// Read one of the known report images.
    ///
    /// Names outside the fixed list are refused so the route cannot be used
    /// to read arbitrary files.
    pub fn read_image(&self, file_name: &str) -> Option<Vec<u8>> {
        if !REPORT_IMAGES.iter().any(|(name, _)| *name == file_name) {
            return None;
        }
        std::fs::read(self.images_dir.join(file_name)).ok()
    }
}
