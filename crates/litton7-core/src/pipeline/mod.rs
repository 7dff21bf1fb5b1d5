//! Batch classification pipeline.
//!
//! - **validate**: structural checks used while collecting inputs
//! - **discovery**: expand targets into an ordered list of image paths
//! - **decode**: load images into memory
//! - **channel**: bounded FIFO between loader and consumer
//! - **loader**: background producer thread
//! - **batcher**: foreground consumer that classifies fixed-size batches
//! - **progress**: done counts, throughput and ETA
//! - **processor**: wires the stages together for one run

pub mod batcher;
pub mod channel;
pub mod decode;
pub mod discovery;
pub mod loader;
pub mod processor;
pub mod progress;
pub mod validate;

pub use batcher::BatchConsumer;
pub use channel::{bounded_channel, LoadReceiver, LoadResult, LoadSender, QueueItem};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::FileDiscovery;
pub use loader::Loader;
pub use processor::BatchPipeline;
pub use progress::{NoProgress, ProgressReporter, ProgressSnapshot, RunProgress};
pub use validate::Validator;
