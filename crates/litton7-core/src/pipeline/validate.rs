//! Structural image validation used during discovery.
//!
//! Validation reads the file header only; pixel data is decoded later by the
//! loader. Every file handle is scoped to the call that opened it.

use std::path::Path;

use image::ImageReader;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Validates candidate files before they enter the pipeline.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Returns true if `path` looks like a decodable image.
    ///
    /// Failures are reported as per-file warnings and never propagate.
    pub fn is_image(&self, path: &Path) -> bool {
        match self.validate(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("skip entry {:?}: {}", path, e);
                false
            }
        }
    }

    /// Verify the file without decoding pixel data.
    ///
    /// Checks:
    /// - File exists and is readable
    /// - File size is within limits
    /// - The format is recognised from content or extension
    /// - The format decoder accepts the header and reports dimensions
    pub fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Validate {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        self.check_header(path)
    }

    /// Let the format decoder parse the header and dimensions.
    ///
    /// The format is guessed from content, falling back to the extension for
    /// formats without a signature (TGA).
    fn check_header(&self, path: &Path) -> Result<(), PipelineError> {
        let reader = ImageReader::open(path)
            .map_err(|e| PipelineError::Validate {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?
            .with_guessed_format()
            .map_err(|e| PipelineError::Validate {
                path: path.to_path_buf(),
                message: format!("Cannot read header: {}", e),
            })?;

        if reader.format().is_none() {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| PipelineError::Validate {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if width == 0 || height == 0 {
            return Err(PipelineError::Validate {
                path: path.to_path_buf(),
                message: "Image has zero width or height".to_string(),
            });
        }

        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }

        Ok(())
    }
}
