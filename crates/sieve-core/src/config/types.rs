//! Sub-configuration structs with their documented defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::EffectConfig;

/// Output location settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Send every decision to the central folder instead of the reviewed folder
    pub use_central_folder: bool,

    /// Central output folder (`~` is expanded). Empty means unset.
    pub central_folder_path: String,
}

impl OutputConfig {
    /// The central folder, if one is enabled and set.
    pub fn central_folder(&self) -> Option<PathBuf> {
        if !self.use_central_folder || self.central_folder_path.trim().is_empty() {
            return None;
        }
        let expanded = shellexpand::tilde(self.central_folder_path.trim());
        Some(PathBuf::from(expanded.into_owned()))
    }

    /// Resolve the base output directory for one decision.
    ///
    /// The central folder wins whenever it is enabled and set; otherwise the
    /// folder currently under review is used.
    pub fn resolve_base_dir(&self, session_folder: Option<&std::path::Path>) -> Option<PathBuf> {
        self.central_folder()
            .or_else(|| session_folder.map(|p| p.to_path_buf()))
    }
}

/// JPEG output and realism settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// JPEG quality, 50-100
    pub jpeg_quality: u8,

    /// Apply sensor noise and chromatic aberration
    pub apply_realism_effects: bool,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 85,
            apply_realism_effects: true,
        }
    }
}

impl EffectsConfig {
    /// Capture the current settings by value for one dispatched job.
    pub fn snapshot(&self) -> EffectConfig {
        EffectConfig {
            quality: self.jpeg_quality,
            apply_realism: self.apply_realism_effects,
        }
    }
}

/// How the synthesized capture time is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureTimePolicy {
    /// Today's date with a random time of day
    #[default]
    Today,
    /// A random day inside the configured year window
    Window,
}

/// Synthesized metadata settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Capture time policy
    pub capture_time: CaptureTimePolicy,

    /// Write a GPS block
    pub gps: bool,

    /// First year of the `window` policy (inclusive)
    pub window_start_year: i32,

    /// Last year of the `window` policy (inclusive, up to Dec 28)
    pub window_end_year: i32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            capture_time: CaptureTimePolicy::Today,
            gps: true,
            window_start_year: 2021,
            window_end_year: 2024,
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers
    pub parallel_workers: usize,

    /// Supported input formats
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            supported_formats: ["jpg", "jpeg", "png", "bmp", "gif", "tiff", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
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

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Output format: "pretty" or "json"
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_central_folder_wins_when_enabled() {
        let output = OutputConfig {
            use_central_folder: true,
            central_folder_path: "/srv/central".into(),
        };
        let resolved = output.resolve_base_dir(Some(Path::new("/photos/trip")));
        assert_eq!(resolved, Some(PathBuf::from("/srv/central")));
    }

    #[test]
    fn test_session_folder_used_when_central_unset() {
        let output = OutputConfig {
            use_central_folder: true,
            central_folder_path: "  ".into(),
        };
        let resolved = output.resolve_base_dir(Some(Path::new("/photos/trip")));
        assert_eq!(resolved, Some(PathBuf::from("/photos/trip")));
    }

    #[test]
    fn test_session_folder_used_when_central_disabled() {
        let output = OutputConfig {
            use_central_folder: false,
            central_folder_path: "/srv/central".into(),
        };
        assert_eq!(
            output.resolve_base_dir(Some(Path::new("/photos"))),
            Some(PathBuf::from("/photos"))
        );
        assert_eq!(output.resolve_base_dir(None), None);
    }

    #[test]
    fn test_supported_formats_default() {
        let config = ProcessingConfig::default();
        assert_eq!(config.supported_formats.len(), 7);
        assert!(config.supported_formats.contains(&"webp".to_string()));
    }
}
