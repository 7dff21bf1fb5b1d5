//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where the default model is stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.litton7/models"),
        }
    }
}

/// What the consumer does when inference fails for a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchErrorPolicy {
    /// Stop the run; rows already written are kept.
    #[default]
    Abort,
    /// Log every item of the failed batch and continue with the next batch.
    Skip,
}

impl BatchErrorPolicy {
    /// Parse a policy name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Pipeline settings for batching and backpressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of images per inference call
    pub batch_size: usize,

    /// Channel capacity as a multiple of `batch_size`
    pub buffer_factor: usize,

    /// Behavior when a batch fails inference
    pub on_batch_error: BatchErrorPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            buffer_factor: 3,
            on_batch_error: BatchErrorPolicy::Abort,
        }
    }
}

impl PipelineConfig {
    /// Capacity of the loader → consumer channel.
    pub fn buffer_size(&self) -> usize {
        self.buffer_factor.max(1) * self.batch_size.max(1)
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
            max_image_dimension: 20000,
        }
    }
}

/// Classification model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// File name of the default model inside `general.model_dir`
    pub file_name: String,

    /// Where the default model is fetched from when it is missing
    pub download_url: String,

    /// Expected BLAKE3 checksum of the downloaded model, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blake3: Option<String>,

    /// Shorter-side length images are resized to before cropping
    pub resize: u32,

    /// Side length of the square center crop fed to the network
    pub image_size: u32,

    /// Number of leading logits that map onto landscape types
    pub num_classes: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            file_name: "Litton-7type-visual-landscape-model.onnx".to_string(),
            download_url:
                "https://drive.google.com/uc?export=download&id=1177rxfD7Yx5F5ZzEqDGBeAIYHTLU3lj9"
                    .to_string(),
            blake3: None,
            resize: 256,
            image_size: 224,
            num_classes: 7,
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
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}
