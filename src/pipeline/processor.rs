//! Time-bucketed processing of level updates.
//!
//! Updates are grouped into fixed-width buckets by timestamp. When an update
//! lands in a new bucket the buffered rows of the previous one are applied as
//! a unit:
//!
//! 1. in replay mode the book is reset, in live mode it carries over
//! 2. every buffered update is applied to the [`OrderBook`]
//! 3. the new snapshot is diffed against the previous one
//! 4. features are computed; buckets without a two-sided book stop here
//! 5. the mid-price is observed by the [`LabelGenerator`], ready labels go to
//!    the sink, then the bucket's feature row is added unlabeled
//!
//! The bucket boundary `bucket * snapshot_interval_ms` is the timestamp of
//! the emitted row and of the label observation.

use super::config::{ProcessingMode, ProcessorConfig};
use super::error::PipelineError;
use super::update::{StreamMessage, Update};
use crate::features::{FeatureComputer, FeatureRecord};
use crate::labeling::LabelGenerator;
use crate::orderbook::{
    BookEventListener, BookSnapshot, EventInferenceEngine, OrderBook, OrderBookError,
};
use crate::sink::FeatureSink;
use crate::utils::normalize_timestamp_ms;
use serde::{Deserialize, Serialize};
use std::mem;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Lifecycle of a [`Processor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorState {
    /// Buffering updates for the open bucket
    Accumulating,
    /// End of stream reached; the trailing bucket has been applied
    Finalized,
}

/// Counters maintained by a [`Processor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStats {
    /// Updates accepted into a bucket
    pub updates_processed: u64,
    /// Updates refused by [`Processor::run`] because they failed validation
    pub updates_rejected: u64,
    /// Non-empty buckets applied to the book
    pub buckets_applied: u64,
    /// Buckets that produced a feature row
    pub snapshots_emitted: u64,
    /// Buckets without features (one side of the book empty)
    pub buckets_skipped: u64,
    /// Level events inferred between consecutive snapshots
    pub events_inferred: u64,
    /// Labels produced by the label generator
    pub labels_emitted: u64,
    /// Labels the sink had no row for
    pub labels_unmatched: u64,
}

/// Single consumer that owns the book and all rolling state.
pub struct Processor<S: FeatureSink> {
    config: ProcessorConfig,
    book: OrderBook,
    inference: EventInferenceEngine,
    features: FeatureComputer,
    labels: LabelGenerator,
    sink: S,
    state: ProcessorState,
    current_bucket: Option<u64>,
    pending: Vec<Update>,
    prev_snapshot: Option<BookSnapshot>,
    latest: Option<FeatureRecord>,
    event_listener: Option<BookEventListener>,
    stats: ProcessorStats,
}

impl<S: FeatureSink> Processor<S> {
    /// Create a processor writing to `sink`.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] if the configuration fails
    /// [`ProcessorConfig::validate`].
    pub fn new(config: ProcessorConfig, sink: S) -> Result<Self, PipelineError> {
        config.validate()?;

        info!(
            mode = %config.mode,
            snapshot_interval_ms = config.snapshot_interval_ms,
            max_depth = config.max_depth,
            horizon_ms = config.labels.horizon_ms,
            "processor initialized"
        );

        Ok(Self {
            book: OrderBook::new(config.max_depth),
            inference: EventInferenceEngine::new(),
            features: FeatureComputer::from_config(&config.features),
            labels: LabelGenerator::from_config(&config.labels),
            sink,
            state: ProcessorState::Accumulating,
            current_bucket: None,
            pending: Vec::new(),
            prev_snapshot: None,
            latest: None,
            event_listener: None,
            stats: ProcessorStats::default(),
            config,
        })
    }

    /// Register a callback receiving each non-empty snapshot diff.
    pub fn with_event_listener(mut self, listener: BookEventListener) -> Self {
        self.event_listener = Some(listener);
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// The book as of the last applied bucket
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the processor, returning its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Index of the open bucket, `None` before the first update
    pub fn current_bucket(&self) -> Option<u64> {
        self.current_bucket
    }

    /// Updates buffered for the open bucket
    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    /// Most recent feature row, as it was handed to the sink (unlabeled).
    pub fn latest_features(&self) -> Option<&FeatureRecord> {
        self.latest.as_ref()
    }

    /// Buffer one update, applying the open bucket first if the update
    /// belongs to a later one.
    ///
    /// # Errors
    /// - [`PipelineError::Finalized`] once the processor has finalized
    /// - [`PipelineError::OrderBook`] for a non-finite price or quantity; the
    ///   update is not buffered
    pub fn on_update(&mut self, update: Update) -> Result<(), PipelineError> {
        if self.state == ProcessorState::Finalized {
            return Err(PipelineError::Finalized);
        }
        if !update.price.is_finite() {
            return Err(OrderBookError::InvalidPrice {
                price: update.price,
            }
            .into());
        }
        if !update.quantity.is_finite() {
            return Err(OrderBookError::InvalidQuantity {
                price: update.price,
                quantity: update.quantity,
            }
            .into());
        }

        let timestamp_ms = normalize_timestamp_ms(update.timestamp);
        let bucket = timestamp_ms / self.config.snapshot_interval_ms;

        match self.current_bucket {
            None => self.current_bucket = Some(bucket),
            Some(open) if open != bucket => {
                self.apply_bucket(open)?;
                self.current_bucket = Some(bucket);
            }
            Some(_) => {}
        }

        trace!(
            timestamp_ms,
            bucket,
            side = %update.side,
            price = update.price,
            quantity = update.quantity,
            "update buffered"
        );
        self.pending.push(update);
        self.stats.updates_processed += 1;
        Ok(())
    }

    /// Apply the trailing bucket, if any, and stop accepting updates.
    ///
    /// Calling this more than once has no further effect.
    pub fn finalize(&mut self) -> Result<(), PipelineError> {
        if self.state == ProcessorState::Finalized {
            return Ok(());
        }

        let result = match self.current_bucket {
            Some(bucket) if !self.pending.is_empty() => self.apply_bucket(bucket),
            _ => Ok(()),
        };
        self.state = ProcessorState::Finalized;

        info!(
            updates_processed = self.stats.updates_processed,
            snapshots_emitted = self.stats.snapshots_emitted,
            buckets_skipped = self.stats.buckets_skipped,
            labels_emitted = self.stats.labels_emitted,
            pending_labels = self.labels.pending(),
            "processor finalized"
        );
        result
    }

    /// Drain `rx` until the end-of-stream marker, then finalize.
    ///
    /// A closed channel counts as end of stream. Updates failing validation
    /// are logged, counted in [`ProcessorStats::updates_rejected`] and
    /// skipped.
    pub async fn run(
        &mut self,
        mut rx: mpsc::Receiver<StreamMessage>,
    ) -> Result<ProcessorStats, PipelineError> {
        loop {
            match rx.recv().await {
                Some(StreamMessage::Update(update)) => match self.on_update(update) {
                    Ok(()) => {}
                    Err(PipelineError::OrderBook(err)) => {
                        warn!(error = %err, timestamp = update.timestamp, "update rejected");
                        self.stats.updates_rejected += 1;
                    }
                    Err(err) => return Err(err),
                },
                Some(StreamMessage::EndOfStream) => {
                    debug!("end of stream received");
                    break;
                }
                None => {
                    debug!("update channel closed without end of stream");
                    break;
                }
            }
        }

        self.finalize()?;
        Ok(self.stats)
    }

    fn apply_bucket(&mut self, bucket: u64) -> Result<(), PipelineError> {
        let rows = mem::take(&mut self.pending);
        if rows.is_empty() {
            return Ok(());
        }

        if self.config.mode == ProcessingMode::Replay {
            self.book.reset();
        }
        for update in &rows {
            self.book
                .update_level(update.side, update.price, update.quantity)?;
        }
        self.stats.buckets_applied += 1;

        let snapshot = self.book.snapshot();
        let snapshot_ts = bucket.saturating_mul(self.config.snapshot_interval_ms);

        if let Some(prev) = &self.prev_snapshot {
            let events = self.inference.infer(prev, &snapshot, snapshot_ts);
            self.stats.events_inferred += events.len() as u64;
            if !events.is_empty() {
                if let Some(listener) = &self.event_listener {
                    listener(&events);
                }
            }
        }

        let computed = self.features.compute(&snapshot);
        self.prev_snapshot = Some(snapshot);

        let Some(features) = computed else {
            self.stats.buckets_skipped += 1;
            debug!(snapshot_ts, rows = rows.len(), "bucket skipped, book one-sided");
            return Ok(());
        };

        self.labels
            .add_observation(snapshot_ts, features.mid_price);
        for (timestamp, label) in self
            .labels
            .pop_ready_labels(snapshot_ts, features.mid_price)
        {
            self.stats.labels_emitted += 1;
            if !self.sink.set_label(timestamp, label) {
                self.stats.labels_unmatched += 1;
            }
        }

        self.sink.add_record(snapshot_ts, features, None);
        self.latest = Some(FeatureRecord {
            timestamp: snapshot_ts,
            features,
            label: None,
        });
        self.stats.snapshots_emitted += 1;

        debug!(
            snapshot_ts,
            rows = rows.len(),
            mid_price = features.mid_price,
            "bucket applied"
        );

        let every = self.config.progress_log_interval;
        if every > 0 && self.stats.snapshots_emitted % every == 0 {
            info!(
                snapshots = self.stats.snapshots_emitted,
                updates = self.stats.updates_processed,
                labels = self.stats.labels_emitted,
                "snapshot progress"
            );
        }

        Ok(())
    }
}

impl<S: FeatureSink> std::fmt::Debug for Processor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("mode", &self.config.mode)
            .field("state", &self.state)
            .field("current_bucket", &self.current_bucket)
            .field("pending", &self.pending.len())
            .field("stats", &self.stats)
            .finish()
    }
}
