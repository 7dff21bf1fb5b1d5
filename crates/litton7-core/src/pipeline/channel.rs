//! Bounded FIFO between the loader and the consumer.
//!
//! Both ends block: the loader when the buffer is full, the consumer when it
//! is empty. Neither end polls.

use std::path::PathBuf;

use image::DynamicImage;
use tokio::sync::mpsc;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// A decoded image paired with the path it came from.
pub struct QueueItem {
    pub path: PathBuf,
    pub image: DynamicImage,
}

/// What travels through the channel: one entry per accepted path, in order.
///
/// Decode failures are carried as values so the consumer decides what to do
/// with them instead of the loader thread dying.
pub type LoadResult = Result<QueueItem, PipelineError>;

/// Producer half of the loader channel.
pub type LoadSender = mpsc::Sender<LoadResult>;

/// Consumer half of the loader channel.
pub type LoadReceiver = mpsc::Receiver<LoadResult>;

/// Create the loader channel with capacity `buffer_factor × batch_size`.
pub fn bounded_channel(config: &PipelineConfig) -> (LoadSender, LoadReceiver) {
    mpsc::channel(config.buffer_size())
}

/// Number of items currently buffered, as seen from the producer side.
pub fn occupancy<T>(sender: &mpsc::Sender<T>) -> usize {
    sender.max_capacity() - sender.capacity()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(batch_size: usize) -> PipelineConfig {
        PipelineConfig {
            batch_size,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_capacity_is_three_batches() {
        let (tx, _rx) = bounded_channel(&config(4));
        assert_eq!(tx.max_capacity(), 12);
        assert_eq!(occupancy(&tx), 0);
    }

    #[test]
    fn test_full_channel_rejects_further_pushes() {
        let (tx, mut rx) = mpsc::channel::<u32>(config(2).buffer_size());
        for i in 0..6 {
            tx.try_send(i).unwrap();
        }
        assert_eq!(occupancy(&tx), 6);
        assert!(matches!(
            tx.try_send(6),
            Err(mpsc::error::TrySendError::Full(6))
        ));

        assert_eq!(rx.blocking_recv(), Some(0));
        assert_eq!(occupancy(&tx), 5);
        tx.try_send(6).unwrap();
    }

    #[test]
    fn test_blocking_ends_preserve_fifo_order() {
        let (tx, mut rx) = mpsc::channel::<u32>(config(1).buffer_size());
        let producer = std::thread::spawn(move || {
            for i in 0..50 {
                tx.blocking_send(i).unwrap();
                assert!(occupancy(&tx) <= 3);
            }
        });

        let received: Vec<u32> = (0..50).map(|_| rx.blocking_recv().unwrap()).collect();
        producer.join().unwrap();
        assert_eq!(received, (0..50).collect::<Vec<_>>());
    }
}
