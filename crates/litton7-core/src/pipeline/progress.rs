//! Run progress, throughput and ETA.
//!
//! [`RunProgress`] is owned by the consumer and only mutated there.
//! Reporters receive immutable [`ProgressSnapshot`]s after every batch; they
//! are purely observational.

use std::time::{Duration, Instant};

/// Counters for the current run, owned by the consumer.
#[derive(Debug, Clone)]
pub struct RunProgress {
    total: usize,
    done: usize,
    started: Instant,
}

impl RunProgress {
    /// Start tracking a run of `total` items; the clock starts now.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            started: Instant::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn remaining(&self) -> usize {
        self.total - self.done
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record a finished batch of `n` items.
    pub fn advance(&mut self, n: usize) {
        self.done = (self.done + n).min(self.total);
    }

    /// Derive throughput and ETA as of now.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::compute(self.done, self.total, self.elapsed().as_secs_f64())
    }
}

/// Derived progress figures for one report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub done: usize,
    pub total: usize,
    pub elapsed_seconds: f64,
    /// `done / total`
    pub ratio: f64,
    /// `elapsed / done`
    pub secs_per_image: f64,
    /// `secs_per_image × (total - done)`
    pub eta_seconds: f64,
}

impl ProgressSnapshot {
    pub fn compute(done: usize, total: usize, elapsed_seconds: f64) -> Self {
        let ratio = if total > 0 {
            done as f64 / total as f64
        } else {
            1.0
        };
        let secs_per_image = if done > 0 {
            elapsed_seconds / done as f64
        } else {
            0.0
        };
        let eta_seconds = secs_per_image * total.saturating_sub(done) as f64;
        Self {
            done,
            total,
            elapsed_seconds,
            ratio,
            secs_per_image,
            eta_seconds,
        }
    }

    /// Rate and its unit: "s/img" when slower than one image per second,
    /// otherwise "img/s".
    pub fn rate(&self) -> (f64, &'static str) {
        if self.secs_per_image > 1.0 {
            (self.secs_per_image, "s/img")
        } else {
            (1.0 / self.secs_per_image, "img/s")
        }
    }

    /// ETA split into whole hours, minutes and seconds.
    pub fn eta_hms(&self) -> (u64, u64, u64) {
        let eta = self.eta_seconds.max(0.0);
        let hours = (eta / 3600.0).floor() as u64;
        let minutes = ((eta % 3600.0) / 60.0).floor() as u64;
        let seconds = (eta % 60.0).floor() as u64;
        (hours, minutes, seconds)
    }

    /// Status line, e.g. ` 04 / 10 ( 40.00%) | 3.21 img/s ETA 0:00:01`.
    pub fn render(&self) -> String {
        let (rate, unit) = self.rate();
        let (h, m, s) = self.eta_hms();
        format!(
            " {} / {} ({:6.2}%) | {:.2} {} ETA {}:{:02}:{:02}",
            pad_count(self.done, self.total),
            self.total,
            self.ratio * 100.0,
            rate,
            unit,
            h,
            m,
            s
        )
    }

    /// Status line shown before the first batch completes.
    pub fn initial_line(total: usize) -> String {
        format!(" {} / {} ({:6.2}%)", pad_count(0, total), total, 0.0)
    }
}

/// Right-align `done` to the digit width of `total`.
fn pad_count(done: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("{:>width$}", done)
}

/// Sink for progress updates.
pub trait ProgressReporter {
    /// Called once before the first batch.
    fn start(&mut self, _total: usize) {}

    /// Called after every batch.
    fn report(&mut self, snapshot: &ProgressSnapshot);

    /// Called once after the last batch (or an abort).
    fn finish(&mut self) {}
}

/// Reporter that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _snapshot: &ProgressSnapshot) {}
}
