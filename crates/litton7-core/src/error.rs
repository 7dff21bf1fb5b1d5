//! Error types for the Litton7 classification pipeline.
//!
//! Errors are organized by stage so that callers can tell a per-file problem
//! (skip it and keep going) from a setup problem (abort the run) without
//! string matching.

use std::path::PathBuf;
use thiserror::Error;

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

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Structural validation during discovery failed
    #[error("Not a valid image {path}: {message}")]
    Validate { path: PathBuf, message: String },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

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

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The classification model could not be loaded
    #[error("Could not load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    /// Device argument could not be resolved to a compute device
    #[error("Invalid device: {0}")]
    Device(String),

    /// Inference failed for a whole batch
    #[error("Inference failed for batch starting at {first}: {message}")]
    Inference { first: PathBuf, message: String },

    /// The loader thread could not be started
    #[error("Could not start loader thread: {0}")]
    LoaderSpawn(#[source] std::io::Error),

    /// The loader hung up before delivering every accepted image
    #[error("Loader stopped after {received} of {expected} images")]
    LoaderStopped { received: usize, expected: usize },

    /// The result sink could not be written
    #[error("Output error: {0}")]
    Output(#[source] std::io::Error),

    /// The run was stopped after a batch failure
    #[error("Run aborted after {done} of {total} images: {source}")]
    Aborted {
        done: usize,
        total: usize,
        #[source]
        source: Box<PipelineError>,
    },
}
