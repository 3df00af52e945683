//! Producer half of the pipeline.
//!
//! One producer moves updates from an [`UpdateSource`] onto a bounded queue
//! drained by a single [`Processor`](super::Processor). The queue bound is
//! the only flow control: a full queue suspends the producer until the
//! consumer catches up.
//!
//! ```no_run
//! use lob_microstructure::pipeline::{
//!     Processor, ProcessorConfig, ReplaySource, channel, run_producer, shutdown_pair,
//! };
//! use lob_microstructure::sink::FeatureStore;
//!
//! # async fn demo(updates: Vec<lob_microstructure::pipeline::Update>) {
//! let config = ProcessorConfig::default();
//! let (tx, rx) = channel(config.queue_capacity);
//! let (_handle, shutdown) = shutdown_pair();
//!
//! let producer = tokio::spawn(run_producer(ReplaySource::unpaced(updates), tx, shutdown));
//! let mut processor = Processor::new(config, FeatureStore::new()).unwrap();
//! let stats = processor.run(rx).await.unwrap();
//! let report = producer.await.unwrap();
//! # }
//! ```

use super::source::UpdateSource;
use super::update::StreamMessage;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Create the bounded queue between producer and processor.
///
/// A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (mpsc::Sender<StreamMessage>, mpsc::Receiver<StreamMessage>) {
    mpsc::channel(capacity.max(1))
}

/// Create a linked cancellation handle and token
pub fn shutdown_pair() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

/// Triggers cancellation of every [`Shutdown`] token it handed out.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Signal shutdown. Tokens created later observe it immediately.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Another token observing this handle
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Cancellation token checked by the producer at its suspension points.
///
/// If the handle is dropped without signalling, the token never fires.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been signalled.
    pub async fn cancelled(&mut self) {
        let closed = self.rx.wait_for(|&stop| stop).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Why a producer stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerExit {
    /// The source ran out of updates
    #[default]
    Exhausted,
    /// Shutdown was signalled
    Cancelled,
    /// The receiving half of the queue was dropped
    ConsumerClosed,
}

/// Outcome of [`run_producer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerReport {
    /// Updates placed on the queue
    pub updates_sent: u64,
    /// Batches pulled from the source
    pub batches: u64,
    /// Exit reason
    pub exit: ProducerExit,
    /// Whether the end-of-stream marker reached the queue
    pub end_of_stream_sent: bool,
}

/// Forward every update from `source` to `tx` in order, then send
/// [`StreamMessage::EndOfStream`].
///
/// Cancellation is observed while waiting on the source and while waiting
/// for queue capacity. The end-of-stream marker is sent on every exit path;
/// it only fails to arrive when the consumer is already gone.
pub async fn run_producer<U: UpdateSource>(
    mut source: U,
    tx: mpsc::Sender<StreamMessage>,
    mut shutdown: Shutdown,
) -> ProducerReport {
    let mut report = ProducerReport::default();

    report.exit = 'feed: loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            batch = source.next_batch() => Some(batch),
        };
        let batch = match next {
            None => break 'feed ProducerExit::Cancelled,
            Some(None) => break 'feed ProducerExit::Exhausted,
            Some(Some(batch)) => batch,
        };
        report.batches += 1;

        for update in batch {
            let sent = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                sent = tx.send(StreamMessage::Update(update)) => Some(sent.is_ok()),
            };
            match sent {
                None => break 'feed ProducerExit::Cancelled,
                Some(false) => break 'feed ProducerExit::ConsumerClosed,
                Some(true) => report.updates_sent += 1,
            }
        }
    };

    report.end_of_stream_sent = tx.send(StreamMessage::EndOfStream).await.is_ok();
    if !report.end_of_stream_sent {
        debug!("consumer gone before end of stream");
    }

    info!(
        updates_sent = report.updates_sent,
        batches = report.batches,
        exit = ?report.exit,
        "producer stopped"
    );
    report
}
