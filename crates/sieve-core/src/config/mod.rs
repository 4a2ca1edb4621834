//! Configuration management for sieve.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults, and written back when a review session ends or the central
//! folder changes.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for sieve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where accepted images are written
    pub output: OutputConfig,

    /// JPEG quality and realism toggle
    pub effects: EffectsConfig,

    /// Synthesized capture metadata policy
    pub metadata: MetadataConfig,

    /// Worker pool and candidate filtering
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default(&Self::default_path())
    }

    /// Load from `path`, or defaults if nothing is there yet.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from(path)
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
    /// - macOS: ~/Library/Application Support/com.sieve.sieve/config.toml
    /// - Linux: ~/.config/sieve/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\sieve\config\config.toml
    ///
    /// Falls back to ~/.sieve/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "sieve", "sieve")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sieve").join("config.toml")
            })
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        tracing::debug!("Config written to {:?}", path);
        Ok(())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.output.use_central_folder);
        assert!(config.output.central_folder_path.is_empty());
        assert_eq!(config.effects.jpeg_quality, 85);
        assert!(config.effects.apply_realism_effects);
        assert_eq!(config.metadata.capture_time, CaptureTimePolicy::Today);
        assert!(config.processing.parallel_workers > 0);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[output]"));
        assert!(toml.contains("[effects]"));
        assert!(toml.contains("jpeg_quality = 85"));
        assert!(toml.contains("capture_time = \"today\""));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.output.use_central_folder = true;
        config.output.central_folder_path = "/srv/curated".into();
        config.effects.jpeg_quality = 92;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.output.use_central_folder);
        assert_eq!(loaded.output.central_folder_path, "/srv/curated");
        assert_eq!(loaded.effects.jpeg_quality, 92);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[effects]\napply_realism_effects = false\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.effects.apply_realism_effects);
        assert_eq!(loaded.effects.jpeg_quality, 85);
        assert!(!loaded.output.use_central_folder);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[effects\njpeg_quality = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.effects.jpeg_quality, 85);
    }
}
