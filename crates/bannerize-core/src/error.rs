//! Error types for the bannerize pipeline.
//!
//! Errors are organized by layer: configuration problems are fatal and
//! reported before any work starts, pipeline errors are scoped to the
//! image that owned the failing work item.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for bannerize operations.
#[derive(Error, Debug)]
pub enum BannerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors (manifest output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, scoped to the owning image where possible.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source bytes unreadable as an image; caught before the item is queued
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// A transform or terminal stage failed; the owning item is dropped
    #[error("Stage '{stage}' failed for image '{image}': {message}")]
    Stage {
        image: String,
        stage: String,
        message: String,
    },

    /// Writing a crop to disk failed
    #[error("Save error for {path}: {message}")]
    Save { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// The precomputed unit count did not exhaust the queue exactly.
    /// Indicates a structural bug, not bad input.
    #[error(
        "Scheduling miscount: expected {expected} stage executions, \
         performed {executed}, {queued} item(s) left in queue"
    )]
    Miscount {
        expected: usize,
        executed: usize,
        queued: usize,
    },
}

/// Convenience type alias for bannerize results.
pub type Result<T> = std::result::Result<T, BannerError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
