//! Configuration validation with range checks.

use crate::classify::LABELS;
use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.batch_size must be > 0".into(),
            ));
        }
        if self.pipeline.buffer_factor == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_factor must be > 0".into(),
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
        if self.model.image_size == 0 || self.model.resize < self.model.image_size {
            return Err(ConfigError::ValidationError(
                "model.resize must be >= model.image_size > 0".into(),
            ));
        }
        if self.model.num_classes != LABELS.len() {
            return Err(ConfigError::ValidationError(format!(
                "model.num_classes must be {}",
                LABELS.len()
            )));
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
    fn test_validate_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.pipeline.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_validate_rejects_zero_buffer_factor() {
        let mut config = Config::default();
        config.pipeline.buffer_factor = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("buffer_factor"));
    }

    #[test]
    fn test_validate_rejects_crop_larger_than_resize() {
        let mut config = Config::default();
        config.model.resize = 200;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("model.resize"));
    }

    #[test]
    fn test_validate_rejects_wrong_class_count() {
        let mut config = Config::default();
        config.model.num_classes = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("num_classes"));
    }
}
