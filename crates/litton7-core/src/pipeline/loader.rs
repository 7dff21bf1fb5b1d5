//! Background loader: decodes accepted paths into the bounded channel.

use std::path::PathBuf;
use std::thread::JoinHandle;

use super::channel::{LoadResult, LoadSender, QueueItem};
use super::decode::ImageDecoder;

/// Single-pass producer running on a dedicated thread.
pub struct Loader {
    decoder: ImageDecoder,
}

impl Loader {
    pub fn new(decoder: ImageDecoder) -> Self {
        Self { decoder }
    }

    /// Start the loader thread.
    ///
    /// Every path produces exactly one entry, pushed in input order. The push
    /// blocks while the channel is full. The thread exits after the last
    /// push, or early if the consumer hung up.
    pub fn spawn(self, paths: Vec<PathBuf>, tx: LoadSender) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("litton7-loader".to_string())
            .spawn(move || self.run(paths, tx))
    }

    fn run(self, paths: Vec<PathBuf>, tx: LoadSender) {
        let total = paths.len();
        for (i, path) in paths.into_iter().enumerate() {
            let item: LoadResult = self.decoder.decode(&path).map(|decoded| {
                tracing::trace!(
                    "decoded {:?} ({}x{}, {:?})",
                    path,
                    decoded.width,
                    decoded.height,
                    decoded.format
                );
                QueueItem {
                    path,
                    image: decoded.image,
                }
            });

            if tx.blocking_send(item).is_err() {
                tracing::debug!("consumer closed the channel after {} of {} images", i, total);
                return;
            }
        }
        tracing::debug!("loader finished: {} images queued", total);
    }
}
