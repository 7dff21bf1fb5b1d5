//! Landscape-type classification.
//!
//! The consumer only sees the [`Classifier`] trait: a blocking,
//! order-preserving call from a batch of decoded images to one probability
//! vector per image. [`OnnxClassifier`] is the production implementation,
//! running the Litton 7-type model through ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use litton7_core::classify::{device, Classifier, OnnxClassifier};
//! use litton7_core::Config;
//!
//! let config = Config::default();
//! let device = device::resolve(device::DeviceRequest::Auto, device::Capabilities::detect())?;
//! let classifier = OnnxClassifier::load(&config.default_model_path(), &config.model, device)?;
//! let probabilities = classifier.infer(&batch)?;
//! ```

pub mod device;
pub mod preprocess;
pub(crate) mod session;

use std::path::Path;

use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::math::softmax;
use crate::pipeline::QueueItem;

use self::device::Device;
use self::preprocess::{preprocess, stack};
use self::session::ClassifierSession;

/// The seven Litton landscape types, indexed by model output position.
pub const LABELS: [&str; 7] = [
    "0.Panoramic-landscape",
    "1.Feature-landscape",
    "2.Detail-landscape",
    "3.Enclosed-landscape",
    "4.Focal-landscape",
    "5.Ephemeral-landscape",
    "6.Canopied-landscape",
];

/// Batch inference over decoded images.
pub trait Classifier {
    /// Return one probability vector of length [`LABELS`]`.len()` per item,
    /// in the same order as `batch`.
    fn infer(&self, batch: &[QueueItem]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

/// Litton 7-type classifier backed by ONNX Runtime.
pub struct OnnxClassifier {
    session: ClassifierSession,
    resize: u32,
    image_size: u32,
    num_classes: usize,
}

impl OnnxClassifier {
    /// Load the model at `model_path` onto `device`.
    pub fn load(
        model_path: &Path,
        config: &ModelConfig,
        device: Device,
    ) -> Result<Self, PipelineError> {
        if !model_path.is_file() {
            return Err(PipelineError::ModelLoad {
                path: model_path.to_path_buf(),
                message: "Model file not found".to_string(),
            });
        }

        tracing::info!("Loading classifier from {:?} on {}", model_path, device);
        let session = ClassifierSession::load(model_path, device)?;

        Ok(Self {
            session,
            resize: config.resize,
            image_size: config.image_size,
            num_classes: config.num_classes,
        })
    }
}

/// Softmax the leading `num_classes` logits of every row of a
/// `rows × columns` logits matrix; extra logits are ignored.
fn leading_class_probabilities(
    rows: usize,
    columns: usize,
    logits: &[f32],
    num_classes: usize,
) -> Result<Vec<Vec<f32>>, String> {
    if columns < num_classes {
        return Err(format!(
            "Model produced {columns} logits per image, need at least {num_classes}"
        ));
    }
    if logits.len() < rows * columns {
        return Err(format!(
            "Model produced {} logits for {rows} images",
            logits.len()
        ));
    }
    Ok(logits
        .chunks(columns)
        .take(rows)
        .map(|row| softmax(&row[..num_classes]))
        .collect())
}

impl Classifier for OnnxClassifier {
    fn infer(&self, batch: &[QueueItem]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let Some(first) = batch.first() else {
            return Ok(vec![]);
        };
        let inference_err = |message: String| PipelineError::Inference {
            first: first.path.clone(),
            message,
        };

        let tensors: Vec<_> = batch
            .iter()
            .map(|item| preprocess(&item.image, self.resize, self.image_size))
            .collect();
        let input = stack(&tensors)
            .ok_or_else(|| inference_err("Tensor shape mismatch in batch".to_string()))?;

        let (rows, columns, logits) = self.session.run(&input).map_err(inference_err)?;
        if rows != batch.len() {
            return Err(inference_err(format!(
                "Model returned {rows} rows for {} images",
                batch.len()
            )));
        }
        leading_class_probabilities(rows, columns, &logits, self.num_classes)
            .map_err(inference_err)
    }
}
