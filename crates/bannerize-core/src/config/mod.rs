//! Configuration management for bannerize.
//!
//! Configuration is loaded from the platform config directory with
//! sensible defaults. All config structs implement `Default`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for bannerize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker and input-format settings
    pub processing: ProcessingConfig,

    /// Banner geometry: axis, scale targets, blur, crop band size
    pub banner: BannerConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output directory and manifest settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.bannerize.bannerize/config.toml
    /// - Linux: ~/.config/bannerize/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\bannerize\config\config.toml
    ///
    /// Falls back to ~/.bannerize/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "bannerize", "bannerize")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".bannerize").join("config.toml")
            })
    }

    /// Get the resolved output directory path (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        let path_str = self.output.dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Resolve the worker count, using available CPU parallelism when
    /// `parallel_workers` is 0.
    pub fn worker_count(&self) -> usize {
        if self.processing.parallel_workers > 0 {
            self.processing.parallel_workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.banner.scale_width, 1500);
        assert_eq!(config.banner.crop_size, 300);
        assert_eq!(config.processing.parallel_workers, 0);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[banner]"));
        assert!(toml.contains("[processing]"));
    }

    #[test]
    fn test_worker_count_auto_is_nonzero() {
        let config = Config::default();
        assert!(config.worker_count() > 0);
    }

    #[test]
    fn test_worker_count_explicit() {
        let mut config = Config::default();
        config.processing.parallel_workers = 3;
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn test_load_from_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.banner.crop_size = 120;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.banner.crop_size, 120);
    }
}
