//! # Limit Order Book Microstructure Pipeline
//!
//! A streaming engine that rebuilds a depth-capped limit order book from
//! level updates, samples it on a fixed time grid and turns each sample into
//! a labeled training row for short-horizon direction models.
//!
//! ## Key Features
//!
//! - **Depth-Capped Order Book**: Skip-list backed bid and ask sides keyed by
//!   price, with worst-price eviction past `max_depth` and a one-pass
//!   crossed-book correction after every update.
//!
//! - **Time-Bucketed Processing**: Updates are grouped into fixed-width
//!   buckets and applied as a unit. Replay mode rebuilds the book for every
//!   bucket; live mode keeps accumulating deltas.
//!
//! - **Event Inference**: Consecutive snapshots are diffed into add, modify
//!   and cancel events, delivered to an optional listener.
//!
//! - **Microstructure Features**: Spread, mid-price, top-N volumes, imbalance,
//!   a capped running volatility and rolling return and imbalance statistics.
//!
//! - **Delayed Labels**: Every emitted mid-price is labeled up, flat or down
//!   once a fixed horizon has elapsed, and the label is attached to the
//!   stored row.
//!
//! - **Backpressured Ingestion**: A single producer feeds the processor
//!   through a bounded queue; cancellation always ends with an end-of-stream
//!   marker so the processor flushes its last bucket.
//!
//! ## Data Flow
//!
//! ```text
//! UpdateSource -> run_producer -> bounded queue -> Processor
//!                                                   |- OrderBook
//!                                                   |- EventInferenceEngine -> listener
//!                                                   |- FeatureComputer
//!                                                   |- LabelGenerator
//!                                                   '- FeatureSink (FeatureStore)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lob_microstructure::prelude::*;
//!
//! let config = ProcessorConfig::with_mode(ProcessingMode::Live);
//! let mut processor = Processor::new(config, FeatureStore::new()).unwrap();
//!
//! processor.on_update(Update::new(1_000, Side::Bid, 99.5, 2.0)).unwrap();
//! processor.on_update(Update::new(1_200, Side::Ask, 100.5, 1.0)).unwrap();
//! processor.finalize().unwrap();
//!
//! let row = processor.sink().get(1_000).unwrap();
//! assert_eq!(row.features.mid_price, 100.0);
//! assert_eq!(row.features.spread, 1.0);
//! ```
//!
//! ## Logging
//!
//! The library logs through [`tracing`] and never installs a subscriber.
//! Binaries choose their own, as the `demos` workspace member does with
//! `tracing-subscriber`.

pub mod features;
pub mod labeling;
pub mod orderbook;
pub mod pipeline;
pub mod prelude;
pub mod sink;
mod utils;

pub use features::{FeatureComputer, FeatureRecord, MicrostructureFeatures};
pub use labeling::{Label, LabelGenerator};
pub use orderbook::{BookSnapshot, EventInferenceEngine, OrderBook, OrderBookError, Side};
pub use pipeline::{PipelineError, ProcessingMode, Processor, ProcessorConfig, Update};
pub use sink::{FeatureSink, FeatureStore};
pub use utils::{MICROSECOND_THRESHOLD, current_time_millis, normalize_timestamp_ms};
