//! Drives the blocking pipeline off the async runtime.

use std::path::PathBuf;

use litton7_core::{BatchPipeline, Classifier, CsvWriter, PipelineError, RunSummary};

use super::fatal::Fatal;
use super::progress::{print_summary, ConsoleProgress};

/// Everything a run needs once the model has loaded.
pub struct RunContext<C> {
    pub pipeline: BatchPipeline,
    pub paths: Vec<PathBuf>,
    pub classifier: C,
    pub output: PathBuf,
}

/// Create the output file, then classify every path into it.
///
/// Both channel ends block, so the whole run happens on a blocking worker
/// while the loader owns its own thread.
pub async fn run_batches<C>(ctx: RunContext<C>) -> Result<RunSummary, Fatal>
where
    C: Classifier + Send + 'static,
{
    let RunContext {
        pipeline,
        paths,
        classifier,
        output,
    } = ctx;

    let mut writer = CsvWriter::create(&output).map_err(|source| Fatal::Output {
        path: output.clone(),
        source,
    })?;

    println!("Starting background image loader...");
    let outcome = tokio::task::spawn_blocking(move || {
        let mut reporter = ConsoleProgress::new();
        let outcome = pipeline.run(paths, &classifier, &mut writer, &mut reporter);
        println!();
        tracing::debug!("{} rows written", writer.rows_written());
        outcome
    })
    .await
    .map_err(|e| Fatal::Internal(anyhow::anyhow!("classification worker failed: {e}")))?;

    match outcome {
        Ok(summary) => {
            tracing::info!("Results written to {:?}", output);
            print_summary(&summary);
            Ok(summary)
        }
        Err(e) => Err(into_fatal(e, output)),
    }
}

fn into_fatal(error: PipelineError, output: PathBuf) -> Fatal {
    match error {
        PipelineError::Output(source) => Fatal::OutputWrite {
            path: output,
            source,
        },
        e @ PipelineError::Aborted { .. } => Fatal::RunAborted(e),
        e => Fatal::Internal(e.into()),
    }
}
