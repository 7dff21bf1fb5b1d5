//! Pipeline orchestration - wires discovery, loading and batching together.

use std::path::PathBuf;

use crate::classify::Classifier;
use crate::config::{Config, PipelineConfig};
use crate::error::PipelineError;
use crate::output::ResultSink;
use crate::types::RunSummary;

use super::batcher::BatchConsumer;
use super::channel::bounded_channel;
use super::decode::ImageDecoder;
use super::discovery::FileDiscovery;
use super::loader::Loader;
use super::progress::ProgressReporter;
use super::validate::Validator;

/// One configured classification run over a set of targets.
pub struct BatchPipeline {
    discovery: FileDiscovery,
    decoder: ImageDecoder,
    pipeline: PipelineConfig,
}

impl BatchPipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            discovery: FileDiscovery::new(Validator::new(config.limits.clone())),
            decoder: ImageDecoder::new(config.limits.clone()),
            pipeline: config.pipeline.clone(),
        }
    }

    /// Collect the ordered list of images to classify.
    pub fn discover(&self, targets: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
        let paths = self.discovery.discover(targets, recursive);
        tracing::debug!("Discovered {} images in {} targets", paths.len(), targets.len());
        paths
    }

    /// Classify `paths` and stream one row per decoded image into `sink`.
    ///
    /// The loader thread decodes ahead into a channel holding
    /// `buffer_factor × batch_size` entries while the calling thread runs
    /// inference. Must be called from a thread that may block.
    pub fn run(
        &self,
        paths: Vec<PathBuf>,
        classifier: &dyn Classifier,
        sink: &mut dyn ResultSink,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<RunSummary, PipelineError> {
        let total = paths.len();
        let (tx, rx) = bounded_channel(&self.pipeline);
        tracing::debug!(
            "Starting run: {} images, batch size {}, buffer {}",
            total,
            self.pipeline.batch_size,
            self.pipeline.buffer_size()
        );

        let loader = Loader::new(self.decoder.clone())
            .spawn(paths, tx)
            .map_err(PipelineError::LoaderSpawn)?;

        // Dropping the receiver inside `run` unblocks the loader on early exit.
        let outcome =
            BatchConsumer::new(&self.pipeline).run(rx, total, classifier, sink, reporter);

        if loader.join().is_err() {
            tracing::error!("Loader thread panicked");
        }

        if let Ok(summary) = &outcome {
            tracing::info!(
                "Classified {} of {} images in {:.1}s ({} batches)",
                summary.classified,
                total,
                summary.elapsed.as_secs_f64(),
                summary.batches
            );
        }
        outcome
    }
}
