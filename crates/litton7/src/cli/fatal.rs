//! Run-terminating failures and their exit codes.

use std::io;
use std::path::{Path, PathBuf};

use litton7_core::PipelineError;
use thiserror::Error;

/// Fixed location of the model-load trace, relative to the working directory.
pub const TRACEBACK_FILE: &str = "litton7-traceback.log";

/// A failure that ends the process with a specific exit code.
#[derive(Debug, Error)]
pub enum Fatal {
    /// Bad `--model` or `--device` value
    #[error("{0}")]
    InvalidArgument(String),

    /// The classifier could not be obtained or loaded
    #[error(
        "Could not load model, `{}`, due to: {reason}. For details, please check `./{TRACEBACK_FILE}`.",
        path.display()
    )]
    ModelLoad { path: PathBuf, reason: String },

    /// The CSV destination could not be created
    #[error("Could not create output file, `{}`, due to: {source}. Abort.", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rows could not be written to the CSV partway through a run
    #[error("Could not write output file, `{}`, due to: {source}. Abort.", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A batch failed inference under the abort policy
    #[error("{0}")]
    RunAborted(#[source] PipelineError),

    /// Anything else that stopped the run
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Fatal {
    pub fn exit_code(&self) -> u8 {
        match self {
            Fatal::InvalidArgument(_) | Fatal::Internal(_) => 1,
            Fatal::ModelLoad { .. } => 2,
            Fatal::Output { .. } | Fatal::OutputWrite { .. } => 3,
            Fatal::RunAborted(_) => 4,
        }
    }

    /// Whether the message also reached the log, once logging is up.
    ///
    /// Argument errors are raised before logging is configured.
    pub fn is_logged(&self) -> bool {
        !matches!(self, Fatal::InvalidArgument(_))
    }

    /// Record a model-load failure, writing its full cause chain to
    /// [`TRACEBACK_FILE`].
    pub fn model_load(path: &Path, error: anyhow::Error) -> Self {
        if let Err(e) = write_traceback(Path::new(TRACEBACK_FILE), &error) {
            tracing::warn!("Could not write {}: {}", TRACEBACK_FILE, e);
        }
        Fatal::ModelLoad {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    }
}

fn write_traceback(dest: &Path, error: &anyhow::Error) -> io::Result<()> {
    std::fs::write(dest, format!("{error:?}\n"))
}
