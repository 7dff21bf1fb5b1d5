//! Compute-device selection.
//!
//! Resolution is a pure function of the user's request and a capabilities
//! record, so every branch is testable without GPUs.

use std::fmt;

use crate::error::PipelineError;

/// What the user asked for with `--device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    Auto,
    Cpu,
    Gpu(u32),
}

impl DeviceRequest {
    /// Parse `auto`, `cpu` (case-insensitive) or a GPU index.
    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse()
                .map(Self::Gpu)
                .map_err(|_| PipelineError::Device(format!("GPU index out of range: {s}"))),
            _ => Err(PipelineError::Device(
                "--device must be one of 'cpu', 'auto', or an integer number.".to_string(),
            )),
        }
    }
}

/// Platform family, as far as device selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Other,
}

/// Which accelerators this build can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub platform: Platform,
    pub cuda: bool,
    pub coreml: bool,
}

impl Capabilities {
    /// Capabilities of the running binary, from target OS and enabled features.
    pub fn detect() -> Self {
        Self {
            platform: if cfg!(target_os = "macos") {
                Platform::MacOs
            } else {
                Platform::Other
            },
            cuda: cfg!(feature = "cuda"),
            coreml: cfg!(feature = "coreml"),
        }
    }
}

/// A concrete device the classifier session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(u32),
    CoreMl,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(i) => write!(f, "cuda:{i}"),
            Device::CoreMl => write!(f, "coreml"),
        }
    }
}

/// Map a request onto a device this build can use.
pub fn resolve(request: DeviceRequest, caps: Capabilities) -> Result<Device, PipelineError> {
    match (request, caps.platform) {
        (DeviceRequest::Cpu, _) => Ok(Device::Cpu),
        (DeviceRequest::Auto, Platform::MacOs) => Ok(if caps.coreml {
            Device::CoreMl
        } else {
            Device::Cpu
        }),
        (DeviceRequest::Auto, Platform::Other) => Ok(if caps.cuda {
            Device::Cuda(0)
        } else {
            Device::Cpu
        }),
        (DeviceRequest::Gpu(_), Platform::MacOs) => Err(PipelineError::Device(
            "macOS (CoreML backend) does not support selecting a GPU by index".to_string(),
        )),
        (DeviceRequest::Gpu(index), Platform::Other) => Ok(Device::Cuda(index)),
    }
}
