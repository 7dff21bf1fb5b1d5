//! Litton7 CLI - classify landscape photographs into the seven Litton
//! visual landscape types.
//!
//! # Usage
//!
//! ```bash
//! # Classify a directory tree with the default model
//! litton7 ./photos
//!
//! # Explicit model, output file and batch size, logging to stderr
//! litton7 ./photos extra.jpg -m model.onnx -o results.csv -b 16 --log stderr
//! ```

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod logging;

/// Litton7 - batch landscape classification with the Litton 7-type model.
#[derive(Parser, Debug)]
#[command(name = "litton7")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,

    #[command(flatten)]
    args: cli::ClassifyArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go straight to stderr.
    let config = match litton7_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config from {}: {e}\n  Using default configuration.",
                litton7_core::Config::default_path().display()
            );
            litton7_core::Config::default()
        }
    };

    let log_to_stderr = matches!(cli.args.log, Some(logging::LogTarget::Stderr));
    let options = logging::LogOptions {
        verbose: cli.verbose,
        json: cli.json_logs,
    };

    match cli::execute(cli.args, config, options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(fatal) => {
            tracing::error!("{fatal}");
            if !log_to_stderr || !fatal.is_logged() {
                eprintln!("{fatal}");
            }
            ExitCode::from(fatal.exit_code())
        }
    }
}
