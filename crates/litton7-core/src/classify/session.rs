//! ONNX Runtime session management and batch inference.
//!
//! Loads the landscape classifier exported to ONNX and runs it on stacked
//! `[N, 3, H, W]` batches, returning the raw logits of the first output.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::builder::SessionBuilder;
use ort::session::Session;
use ort::value::Value;

use super::device::Device;
use crate::error::PipelineError;

/// Wraps an ONNX Runtime session for the classifier.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct ClassifierSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl ClassifierSession {
    /// Load a classifier from an ONNX file onto `device`.
    pub fn load(model_path: &Path, device: Device) -> Result<Self, PipelineError> {
        let load_err = |message: String| PipelineError::ModelLoad {
            path: model_path.to_path_buf(),
            message,
        };

        let builder = Session::builder()
            .map_err(|e| load_err(format!("Failed to create ONNX session builder: {e}")))?;
        let builder = with_device(builder, device)
            .map_err(|e| load_err(format!("Failed to register {device} execution provider: {e}")))?;
        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| load_err(format!("Failed to load ONNX model: {e}")))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::debug!(
            "Loaded classifier from {:?} on {} (input: {:?}, outputs: {:?})",
            model_path,
            device,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run one batch and return its logits as `(rows, columns, flat data)`.
    pub fn run(&self, batch: &Array4<f32>) -> Result<(usize, usize, Vec<f32>), String> {
        let shape: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = batch.iter().copied().collect();
        let rows = batch.shape()[0];

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| format!("Failed to create input tensor: {e}"))?;
        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Session lock poisoned: {e}"))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| format!("ONNX inference failed: {e}"))?;

        let (_, logits) = outputs
            .iter()
            .next()
            .ok_or_else(|| "Model produced no outputs".to_string())?;
        let (out_shape, data) = logits
            .try_extract_tensor::<f32>()
            .map_err(|e| format!("Failed to extract logits tensor: {e}"))?;

        let columns = match out_shape.len() {
            2 if out_shape[0] as usize == rows => out_shape[1] as usize,
            1 if rows == 1 => out_shape[0] as usize,
            _ => return Err(format!("Unexpected logits shape: {:?}", out_shape)),
        };

        Ok((rows, columns, data.to_vec()))
    }
}

fn with_device(builder: SessionBuilder, device: Device) -> Result<SessionBuilder, String> {
    match device {
        Device::Cpu => Ok(builder),
        #[cfg(feature = "cuda")]
        Device::Cuda(index) => builder
            .with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default()
                    .with_device_id(index as i32)
                    .build(),
            ])
            .map_err(|e| e.to_string()),
        #[cfg(not(feature = "cuda"))]
        Device::Cuda(index) => {
            tracing::warn!("built without CUDA support; cuda:{index} falls back to CPU");
            Ok(builder)
        }
        #[cfg(feature = "coreml")]
        Device::CoreMl => builder
            .with_execution_providers([
                ort::execution_providers::CoreMLExecutionProvider::default().build(),
            ])
            .map_err(|e| e.to_string()),
        #[cfg(not(feature = "coreml"))]
        Device::CoreMl => Ok(builder),
    }
}
