//! Sub-configuration structs with defaults matching the original banner tool.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which axis (or axes) the scale pass targets.
///
/// `Both` runs the x-axis pass, resets the item to its original bytes,
/// then runs an independent y-axis pass on the same source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Scale to a target width, crop horizontal bands
    #[default]
    X,
    /// Scale to a target height, crop vertical bands
    Y,
    /// Both passes on the same source image
    Both,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Both => write!(f, "both"),
        }
    }
}

/// Worker and input-format settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers (0 = match available CPU parallelism)
    pub parallel_workers: usize,

    /// Supported input formats
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 0,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
                "gif".to_string(),
                "tiff".to_string(),
            ],
        }
    }
}

/// Banner geometry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    /// Which scale pass(es) to run
    pub axis: Axis,

    /// Target width for the x-axis scale pass, in pixels
    pub scale_width: u32,

    /// Target height for the y-axis scale pass, in pixels
    pub scale_height: u32,

    /// Gaussian blur sigma
    pub blur_sigma: f32,

    /// Crop band size in pixels (height of horizontal bands,
    /// width of vertical bands)
    pub crop_size: u32,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            scale_width: 1500,
            scale_height: 1000,
            blur_sigma: 6.0,
            crop_size: 300,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
        }
    }
}

/// Output directory and manifest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory crops are written to
    pub dir: PathBuf,

    /// Manifest format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON manifest output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("processed_images"),
            format: "jsonl".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
