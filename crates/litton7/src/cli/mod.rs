//! Command-line surface: arguments, setup order and exit codes.

mod fatal;
mod models;
mod progress;
mod run;
mod setup;

use fatal::Fatal;

use std::path::PathBuf;

use clap::Args;
use litton7_core::{BatchErrorPolicy, BatchPipeline, Config, OnnxClassifier};

use crate::logging::{self, LogOptions, LogTarget};
use run::{run_batches, RunContext};

/// Arguments for a classification run.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image files or directories to classify
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<PathBuf>,

    /// Model file (defaults to the pretrained model, downloaded on first use)
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Output CSV file (defaults to litton7_<timestamp>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Images per inference batch; values below 1 are treated as 1
    #[arg(short, long, allow_negative_numbers = true)]
    pub batch_size: Option<i64>,

    /// Only look at the top level of directory targets
    #[arg(long)]
    pub no_recursive: bool,

    /// Compute device: auto, cpu, or a GPU index
    #[arg(short, long, default_value = "auto")]
    pub device: String,

    /// Log destination: a file path or "stderr" (disabled when omitted)
    #[arg(long, value_name = "PATH|stderr")]
    pub log: Option<LogTarget>,

    /// What to do when a batch fails inference
    #[arg(long, value_name = "abort|skip", value_parser = parse_policy)]
    pub on_batch_error: Option<BatchErrorPolicy>,
}

fn parse_policy(s: &str) -> Result<BatchErrorPolicy, String> {
    BatchErrorPolicy::parse(s).ok_or_else(|| format!("expected 'abort' or 'skip', got '{s}'"))
}

/// Execute a classification run.
///
/// Setup runs in a fixed order so that argument problems are reported
/// before any image is read, and model or output problems before any image
/// is decoded.
pub async fn execute(
    args: ClassifyArgs,
    mut config: Config,
    log_options: LogOptions,
) -> Result<(), Fatal> {
    if let Some(batch_size) = args.batch_size {
        config.set_batch_size(batch_size);
    }
    if let Some(policy) = args.on_batch_error {
        config.pipeline.on_batch_error = policy;
    }

    let explicit_model = args
        .model
        .as_deref()
        .map(setup::check_model_path)
        .transpose()?;
    let device = setup::resolve_device(&args.device)?;

    logging::init(args.log.as_ref(), &config, log_options)?;
    tracing::debug!("Litton7 v{} on {}", litton7_core::VERSION, device);

    println!("Collecting images...");
    let pipeline = BatchPipeline::new(&config);
    let paths = pipeline.discover(&args.targets, !args.no_recursive);
    if paths.is_empty() {
        println!("No image found, abort.");
        return Ok(());
    }
    tracing::info!("Found {} image(s) to classify", paths.len());

    let (model_path, default_model) = match explicit_model {
        Some(path) => (path, None),
        None => {
            let model = models::ensure_default_model(&config)
                .await
                .map_err(|e| Fatal::model_load(&config.default_model_path(), e))?;
            (model.path().to_path_buf(), Some(model))
        }
    };

    println!("Loading model...");
    let classifier = match OnnxClassifier::load(&model_path, &config.model, device) {
        Ok(classifier) => {
            if let Some(model) = default_model {
                model.commit();
            }
            classifier
        }
        Err(e) => {
            // A default model that does not load is never kept.
            let shown = match default_model {
                Some(model) => {
                    model.discard();
                    config.default_model_path()
                }
                None => model_path,
            };
            return Err(Fatal::model_load(&shown, e.into()));
        }
    };

    let output = args.output.unwrap_or_else(setup::default_output_path);
    run_batches(RunContext {
        pipeline,
        paths,
        classifier,
        output,
    })
    .await?;

    Ok(())
}
