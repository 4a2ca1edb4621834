//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::types::{MAX_QUALITY, MIN_QUALITY};

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.effects.jpeg_quality) {
            return Err(ConfigError::ValidationError(format!(
                "effects.jpeg_quality must be between {MIN_QUALITY} and {MAX_QUALITY}"
            )));
        }
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.metadata.window_start_year > self.metadata.window_end_year {
            return Err(ConfigError::ValidationError(
                "metadata.window_start_year must not be after window_end_year".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0
            || self.limits.max_image_dimension > u32::from(u16::MAX)
        {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be between 1 and 65535".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_quality_out_of_range() {
        let mut config = Config::default();
        config.effects.jpeg_quality = 49;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jpeg_quality"));

        config.effects.jpeg_quality = 101;
        assert!(config.validate().is_err());

        config.effects.jpeg_quality = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_parallel_workers() {
        let mut config = Config::default();
        config.processing.parallel_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut config = Config::default();
        config.metadata.window_start_year = 2025;
        config.metadata.window_end_year = 2021;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window_start_year"));
    }

    #[test]
    fn test_validate_rejects_dimension_beyond_jpeg_limit() {
        let mut config = Config::default();
        config.limits.max_image_dimension = 70_000;
        assert!(config.validate().is_err());
    }
}
