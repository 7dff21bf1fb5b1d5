//! Core data types for classification results and run statistics.

use std::path::PathBuf;
use std::time::Duration;

use crate::classify::LABELS;
use crate::math::argmax;

/// The classification outcome for a single image.
///
/// `label_index` is the arg-max of the per-class probability vector and
/// `probability` is that vector's value at `label_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Source image, as discovered
    pub path: PathBuf,

    /// Index into [`LABELS`], always in `0..LABELS.len()`
    pub label_index: usize,

    /// Human-readable landscape type, e.g. "2.Detail-landscape"
    pub label_name: &'static str,

    /// Probability of the winning class, in [0, 1]
    pub probability: f32,
}

impl ClassificationResult {
    /// Build a result from a probability vector over the landscape types.
    ///
    /// Returns `None` if the vector is empty, longer than the label set, or
    /// contains no comparable value.
    pub fn from_probabilities(path: PathBuf, probabilities: &[f32]) -> Option<Self> {
        if probabilities.len() > LABELS.len() {
            return None;
        }
        let label_index = argmax(probabilities)?;
        Some(Self {
            path,
            label_index,
            label_name: LABELS[label_index],
            probability: probabilities[label_index],
        })
    }
}

/// Counters describing a finished (or aborted) run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Images that produced a result row
    pub classified: usize,
    /// Images the loader could not decode
    pub decode_failed: usize,
    /// Images dropped because their batch failed inference
    pub inference_failed: usize,
    /// Number of consumer iterations executed
    pub batches: usize,
    /// Wall-clock time from the first pop to the last report
    pub elapsed: Duration,
}

impl RunSummary {
    /// Total images accounted for.
    pub fn total(&self) -> usize {
        self.classified + self.decode_failed + self.inference_failed
    }

    /// Classified images per second over the whole run.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.classified as f64 / secs
        } else {
            0.0
        }
    }
}
