//! Streaming pipeline: configuration, the bucketing processor, and the
//! producer side feeding it through a bounded queue.

pub mod config;
pub mod error;
pub mod processor;
pub mod producer;
pub mod source;
pub mod update;

pub use config::{
    DEFAULT_PROGRESS_LOG_INTERVAL, DEFAULT_QUEUE_CAPACITY, DEFAULT_SNAPSHOT_INTERVAL_MS,
    ProcessingMode, ProcessorConfig,
};
pub use error::PipelineError;
pub use processor::{Processor, ProcessorState, ProcessorStats};
pub use producer::{
    ProducerExit, ProducerReport, Shutdown, ShutdownHandle, channel, run_producer, shutdown_pair,
};
pub use source::{BatchedSource, DepthUpdateMessage, ReplaySource, UpdateSource};
pub use update::{StreamMessage, Update};
