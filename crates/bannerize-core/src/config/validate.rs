//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.banner.scale_width == 0 {
            return Err(ConfigError::ValidationError(
                "banner.scale_width must be > 0".into(),
            ));
        }
        if self.banner.scale_height == 0 {
            return Err(ConfigError::ValidationError(
                "banner.scale_height must be > 0".into(),
            ));
        }
        if self.banner.crop_size == 0 {
            return Err(ConfigError::ValidationError(
                "banner.crop_size must be > 0".into(),
            ));
        }
        if self.banner.blur_sigma < 0.0 {
            return Err(ConfigError::ValidationError(
                "banner.blur_sigma must be >= 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        match self.output.format.as_str() {
            "json" | "jsonl" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "output.format must be \"json\" or \"jsonl\", got \"{other}\""
                )));
            }
        }
        Ok(())
    }
}
