//! Image decode/encode with format detection and dimension limits.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Decodes source bytes and persists crops. The only collaborator that
/// touches pixel data encoding.
#[derive(Debug, Clone)]
pub struct Codec {
    limits: LimitsConfig,
}

impl Codec {
    /// Create a new codec with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check a source file's size against the configured limit.
    ///
    /// Compared in bytes, so a file fractionally over the limit is still
    /// rejected.
    pub fn check_file_size(&self, path: &Path, size_bytes: u64) -> Result<(), PipelineError> {
        let max_bytes = self.limits.max_file_size_mb * 1_000_000;
        if size_bytes > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size_bytes.div_ceil(1_000_000),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Decode an image from an in-memory byte buffer.
    ///
    /// The format is detected from the content, not the file name, so a
    /// misnamed PNG still decodes. Dimensions are checked against the
    /// configured limit.
    pub fn decode(&self, bytes: &[u8], path: &Path) -> Result<DynamicImage, PipelineError> {
        let cursor = Cursor::new(bytes);
        let reader = image::ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        if reader.format().is_none() && ImageFormat::from_path(path).is_err() {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format".to_string(),
            });
        }

        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        Ok(image)
    }

    /// Save an image to a path; the encoder is chosen from the extension.
    pub fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), PipelineError> {
        image.save(path).map_err(|e| PipelineError::Save {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
