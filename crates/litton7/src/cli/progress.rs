//! Console progress line and end-of-run summary.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use litton7_core::{ProgressReporter, ProgressSnapshot, RunSummary};

/// Overwrites a single stdout line after every batch.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout());
        bar.set_style(
            ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn start(&mut self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message(ProgressSnapshot::initial_line(total));
    }

    fn report(&mut self, snapshot: &ProgressSnapshot) {
        self.bar.set_position(snapshot.done as u64);
        self.bar.set_message(snapshot.render());
    }

    fn finish(&mut self) {
        self.bar.finish();
    }
}

/// Print a formatted summary table after the run.
pub fn print_summary(summary: &RunSummary) {
    let (rate, unit) = summary_rate(summary);

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Classified:   {:>8}", summary.classified);
    if summary.decode_failed > 0 {
        eprintln!("    Unreadable:   {:>8}", summary.decode_failed);
    }
    if summary.inference_failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.inference_failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total());
    eprintln!("    Batches:      {:>8}", summary.batches);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.2} {}", rate, unit);
    eprintln!("  ====================================");
}

fn summary_rate(summary: &RunSummary) -> (f64, &'static str) {
    let snapshot = ProgressSnapshot::compute(
        summary.total(),
        summary.total(),
        summary.elapsed.as_secs_f64(),
    );
    if summary.total() == 0 {
        (0.0, "img/s")
    } else {
        snapshot.rate()
    }
}
