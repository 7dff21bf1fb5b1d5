//! Litton7 Core - batch landscape classification library.
//!
//! Classifies landscape photographs into the seven Litton visual landscape
//! types with an ONNX model, streaming one CSV row per image.
//!
//! # Architecture
//!
//! A background loader thread decodes images into a bounded channel while the
//! calling thread pulls fixed-size batches off it and runs inference:
//!
//! ```text
//! Targets → Discover → Loader ─[bounded channel]→ Batch → Classify → CSV
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use litton7_core::classify::{device, OnnxClassifier};
//! use litton7_core::{BatchPipeline, Config, CsvWriter, NoProgress};
//!
//! let config = Config::load()?;
//! let pipeline = BatchPipeline::new(&config);
//! let paths = pipeline.discover(&["./photos".into()], true);
//!
//! let device = device::resolve(device::DeviceRequest::Auto, device::Capabilities::detect())?;
//! let classifier = OnnxClassifier::load(&config.default_model_path(), &config.model, device)?;
//! let mut csv = CsvWriter::create("results.csv".as_ref())?;
//! let summary = pipeline.run(paths, &classifier, &mut csv, &mut NoProgress)?;
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod math;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod types;

pub use classify::{Classifier, OnnxClassifier, LABELS};
pub use config::{BatchErrorPolicy, Config};
pub use error::{ConfigError, PipelineError};
pub use output::{CsvWriter, ResultSink};
pub use pipeline::{BatchPipeline, NoProgress, ProgressReporter, ProgressSnapshot};
pub use types::{ClassificationResult, RunSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
