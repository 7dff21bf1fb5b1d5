//! Argument checks done before any image is touched.

use std::path::{Path, PathBuf};

use litton7_core::classify::device::{self, Capabilities, Device, DeviceRequest};
use litton7_core::PipelineError;

use super::fatal::Fatal;

/// A user-supplied model path must name an existing regular file.
pub fn check_model_path(path: &Path) -> Result<PathBuf, Fatal> {
    if !path.exists() {
        return Err(Fatal::InvalidArgument(format!(
            "the model you have specified, {}, does not exist",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(Fatal::InvalidArgument(format!(
            "the model you have specified, {}, is not a file.",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Turn `--device` into a concrete device for this build and platform.
pub fn resolve_device(arg: &str) -> Result<Device, Fatal> {
    resolve_device_with(arg, Capabilities::detect())
}

fn resolve_device_with(arg: &str, caps: Capabilities) -> Result<Device, Fatal> {
    DeviceRequest::parse(arg)
        .and_then(|request| device::resolve(request, caps))
        .map_err(|e| match e {
            PipelineError::Device(message) => Fatal::InvalidArgument(message),
            other => Fatal::InvalidArgument(other.to_string()),
        })
}

/// `litton7_YYYYmmdd-HHMMSS.csv` in the working directory.
pub fn default_output_path() -> PathBuf {
    PathBuf::from(
        chrono::Local::now()
            .format("litton7_%Y%m%d-%H%M%S.csv")
            .to_string(),
    )
}
