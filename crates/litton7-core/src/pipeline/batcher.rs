//! Foreground consumer: drains fixed-size batches and classifies them.

use crate::classify::Classifier;
use crate::config::{BatchErrorPolicy, PipelineConfig};
use crate::error::PipelineError;
use crate::output::ResultSink;
use crate::types::{ClassificationResult, RunSummary};

use super::channel::{LoadReceiver, QueueItem};
use super::progress::{ProgressReporter, RunProgress};

/// Pulls batches off the loader channel until every accepted image is done.
#[derive(Debug, Clone)]
pub struct BatchConsumer {
    batch_size: usize,
    policy: BatchErrorPolicy,
}

impl BatchConsumer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            policy: config.on_batch_error,
        }
    }

    /// Consume exactly `total` entries from `rx`.
    ///
    /// Each iteration pops `min(batch_size, remaining)` entries, classifies
    /// the ones that decoded, streams their rows to `sink`, then advances the
    /// done count by the full iteration size and reports progress. Decode
    /// failures are skipped with a warning. Inference failures follow the
    /// configured [`BatchErrorPolicy`].
    pub fn run(
        &self,
        mut rx: LoadReceiver,
        total: usize,
        classifier: &dyn Classifier,
        sink: &mut dyn ResultSink,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<RunSummary, PipelineError> {
        let mut progress = RunProgress::new(total);
        let mut summary = RunSummary::default();
        reporter.start(total);

        while !progress.is_complete() {
            let size = self.batch_size.min(progress.remaining());
            let batch = match self.pop_batch(&mut rx, size, &progress, &mut summary) {
                Ok(batch) => batch,
                Err(e) => {
                    reporter.finish();
                    return Err(e);
                }
            };

            if let Err(e) = self.classify_batch(&batch, classifier, sink, &mut summary) {
                summary.elapsed = progress.elapsed();
                if let Err(flush_err) = sink.flush() {
                    tracing::error!("could not flush results after failed batch: {}", flush_err);
                    reporter.finish();
                    return Err(PipelineError::Output(flush_err));
                }
                match (e, self.policy) {
                    (e @ PipelineError::Inference { .. }, BatchErrorPolicy::Skip) => {
                        for item in &batch {
                            tracing::error!("no result for {:?}: {}", item.path, e);
                        }
                        summary.inference_failed += batch.len();
                    }
                    (e @ PipelineError::Inference { .. }, BatchErrorPolicy::Abort) => {
                        reporter.finish();
                        return Err(PipelineError::Aborted {
                            done: progress.done(),
                            total,
                            source: Box::new(e),
                        });
                    }
                    (e, _) => {
                        reporter.finish();
                        return Err(e);
                    }
                }
            }
            drop(batch);

            progress.advance(size);
            summary.batches += 1;
            summary.elapsed = progress.elapsed();
            reporter.report(&progress.snapshot());
        }

        reporter.finish();
        Ok(summary)
    }

    /// Blocking-pop `size` entries, keeping decoded images in order.
    fn pop_batch(
        &self,
        rx: &mut LoadReceiver,
        size: usize,
        progress: &RunProgress,
        summary: &mut RunSummary,
    ) -> Result<Vec<QueueItem>, PipelineError> {
        let mut batch = Vec::with_capacity(size);
        for popped in 0..size {
            match rx.blocking_recv() {
                Some(Ok(item)) => batch.push(item),
                Some(Err(e)) => {
                    tracing::warn!("skip image that failed to load: {}", e);
                    summary.decode_failed += 1;
                }
                None => {
                    return Err(PipelineError::LoaderStopped {
                        received: progress.done() + popped,
                        expected: progress.total(),
                    });
                }
            }
        }
        Ok(batch)
    }

    /// Run inference on one batch and stream its rows.
    ///
    /// Rows are only written once the whole batch produced valid vectors.
    fn classify_batch(
        &self,
        batch: &[QueueItem],
        classifier: &dyn Classifier,
        sink: &mut dyn ResultSink,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let Some(first) = batch.first() else {
            return Ok(());
        };

        let probabilities = classifier.infer(batch)?;
        if probabilities.len() != batch.len() {
            return Err(PipelineError::Inference {
                first: first.path.clone(),
                message: format!(
                    "expected {} probability vectors, got {}",
                    batch.len(),
                    probabilities.len()
                ),
            });
        }

        let results = batch
            .iter()
            .zip(&probabilities)
            .map(|(item, probs)| {
                ClassificationResult::from_probabilities(item.path.clone(), probs).ok_or_else(
                    || PipelineError::Inference {
                        first: item.path.clone(),
                        message: format!("invalid probability vector of length {}", probs.len()),
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        for result in &results {
            sink.write_record(result).map_err(PipelineError::Output)?;
            summary.classified += 1;
        }
        sink.flush().map_err(PipelineError::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::LoadResult;
    use crate::pipeline::progress::ProgressSnapshot;
    use image::DynamicImage;
    use std::cell::RefCell;
    use std::io;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    /// Puts all mass on `index_of(path)`, recording batch sizes.
    struct StubClassifier {
        batches: RefCell<Vec<usize>>,
        fail_on_call: Option<usize>,
    }

    impl StubClassifier {
        fn new() -> Self {
            Self {
                batches: RefCell::new(vec![]),
                fail_on_call: None,
            }
        }
    }

    impl Classifier for StubClassifier {
        fn infer(&self, batch: &[QueueItem]) -> Result<Vec<Vec<f32>>, PipelineError> {
            let call = self.batches.borrow().len();
            self.batches.borrow_mut().push(batch.len());
            if self.fail_on_call == Some(call) {
                return Err(PipelineError::Inference {
                    first: batch[0].path.clone(),
                    message: "stub failure".into(),
                });
            }
            Ok(batch
                .iter()
                .map(|item| {
                    let n: usize = item
                        .path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    let mut v = vec![0.0; 7];
                    v[n % 7] = 1.0;
                    v
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        rows: Vec<ClassificationResult>,
        flushes: usize,
    }

    impl ResultSink for MemorySink {
        fn write_record(&mut self, result: &ClassificationResult) -> io::Result<()> {
            self.rows.push(result.clone());
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    /// Accepts rows but cannot persist them.
    struct UnflushableSink;

    impl ResultSink for UnflushableSink {
        fn write_record(&mut self, _result: &ClassificationResult) -> io::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        done: Vec<usize>,
        finished: bool,
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&mut self, snapshot: &ProgressSnapshot) {
            self.done.push(snapshot.done);
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    fn item(i: usize) -> LoadResult {
        Ok(QueueItem {
            path: PathBuf::from(format!("{i}.jpg")),
            image: DynamicImage::new_rgb8(1, 1),
        })
    }

    fn filled_channel(entries: Vec<LoadResult>) -> LoadReceiver {
        let (tx, rx) = mpsc::channel(entries.len().max(1));
        for e in entries {
            tx.try_send(e).ok().unwrap();
        }
        rx
    }

    fn consumer(batch_size: usize, policy: BatchErrorPolicy) -> BatchConsumer {
        BatchConsumer::new(&PipelineConfig {
            batch_size,
            on_batch_error: policy,
            ..PipelineConfig::default()
        })
    }

    #[test]
    fn test_ten_images_batch_four() {
        let rx = filled_channel((0..10).map(item).collect());
        let classifier = StubClassifier::new();
        let mut sink = MemorySink::default();
        let mut reporter = RecordingReporter::default();

        let summary = consumer(4, BatchErrorPolicy::Abort)
            .run(rx, 10, &classifier, &mut sink, &mut reporter)
            .unwrap();

        assert_eq!(*classifier.batches.borrow(), vec![4, 4, 2]);
        assert_eq!(reporter.done, vec![4, 8, 10]);
        assert!(reporter.finished);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.classified, 10);
        assert_eq!(sink.flushes, 3);

        let paths: Vec<_> = sink.rows.iter().map(|r| r.path.clone()).collect();
        let expected: Vec<_> = (0..10).map(|i| PathBuf::from(format!("{i}.jpg"))).collect();
        assert_eq!(paths, expected);
        assert_eq!(sink.rows[8].label_index, 1);
        assert_eq!(sink.rows[8].label_name, "1.Feature-landscape");
    }

    #[test]
    fn test_decode_failures_skipped_but_counted() {
        let mut entries: Vec<LoadResult> = (0..5).map(item).collect();
        entries[2] = Err(PipelineError::FileNotFound(PathBuf::from("2.jpg")));
        let rx = filled_channel(entries);
        let classifier = StubClassifier::new();
        let mut sink = MemorySink::default();
        let mut reporter = RecordingReporter::default();

        let summary = consumer(2, BatchErrorPolicy::Abort)
            .run(rx, 5, &classifier, &mut sink, &mut reporter)
            .unwrap();

        assert_eq!(reporter.done, vec![2, 4, 5]);
        assert_eq!(*classifier.batches.borrow(), vec![2, 1, 1]);
        assert_eq!(summary.classified, 4);
        assert_eq!(summary.decode_failed, 1);
        assert_eq!(sink.rows.len(), 4);
    }

    #[test]
    fn test_inference_failure_aborts_by_default() {
        let rx = filled_channel((0..6).map(item).collect());
        let classifier = StubClassifier {
            fail_on_call: Some(1),
            ..StubClassifier::new()
        };
        let mut sink = MemorySink::default();
        let mut reporter = RecordingReporter::default();

        let err = consumer(2, BatchErrorPolicy::Abort)
            .run(rx, 6, &classifier, &mut sink, &mut reporter)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Aborted { done: 2, total: 6, .. }));
        assert_eq!(sink.rows.len(), 2);
        assert_eq!(reporter.done, vec![2]);
        assert!(reporter.finished);
    }

    #[test]
    fn test_inference_failure_skipped_when_configured() {
        let rx = filled_channel((0..6).map(item).collect());
        let classifier = StubClassifier {
            fail_on_call: Some(1),
            ..StubClassifier::new()
        };
        let mut sink = MemorySink::default();
        let mut reporter = RecordingReporter::default();

        let summary = consumer(2, BatchErrorPolicy::Skip)
            .run(rx, 6, &classifier, &mut sink, &mut reporter)
            .unwrap();

        assert_eq!(reporter.done, vec![2, 4, 6]);
        assert_eq!(summary.inference_failed, 2);
        assert_eq!(summary.classified, 4);
        let names: Vec<_> = sink.rows.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            names,
            ["0.jpg", "1.jpg", "4.jpg", "5.jpg"]
                .iter()
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_flush_failure_after_failed_batch_stops_skip_policy() {
        let rx = filled_channel((0..4).map(item).collect());
        let classifier = StubClassifier {
            fail_on_call: Some(0),
            ..StubClassifier::new()
        };
        let mut reporter = RecordingReporter::default();

        let err = consumer(2, BatchErrorPolicy::Skip)
            .run(rx, 4, &classifier, &mut UnflushableSink, &mut reporter)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Output(_)));
        assert_eq!(*classifier.batches.borrow(), vec![2]);
        assert!(reporter.done.is_empty());
        assert!(reporter.finished);
    }

    #[test]
    fn test_loader_hangup_is_reported() {
        let rx = filled_channel((0..3).map(item).collect());
        let classifier = StubClassifier::new();
        let mut sink = MemorySink::default();
        let mut reporter = RecordingReporter::default();

        let err = consumer(2, BatchErrorPolicy::Abort)
            .run(rx, 5, &classifier, &mut sink, &mut reporter)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::LoaderStopped {
                received: 3,
                expected: 5
            }
        ));
    }

    #[test]
    fn test_zero_total_runs_no_batches() {
        let rx = filled_channel(vec![]);
        let classifier = StubClassifier::new();
        let mut sink = MemorySink::default();
        let mut reporter = RecordingReporter::default();

        let summary = consumer(4, BatchErrorPolicy::Abort)
            .run(rx, 0, &classifier, &mut sink, &mut reporter)
            .unwrap();

        assert_eq!(summary.batches, 0);
        assert!(classifier.batches.borrow().is_empty());
        assert!(reporter.done.is_empty());
        assert!(sink.rows.is_empty());
    }
}
