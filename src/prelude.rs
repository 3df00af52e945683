/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Prelude module that re-exports commonly used types and traits.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use lob_microstructure::prelude::*;
//! ```
//!
//! This imports everything needed to build and drive a processing pipeline.

// Core order book types
pub use crate::orderbook::{BookSnapshot, OrderBook, OrderBookError, PriceLevel, Side};

// Inferred events
pub use crate::orderbook::{BookEvent, BookEventListener, BookEventType, EventInferenceEngine};

// Features and labels
pub use crate::features::{FeatureComputer, FeatureConfig, FeatureRecord, MicrostructureFeatures};
pub use crate::labeling::{Label, LabelConfig, LabelGenerator};

// Pipeline
pub use crate::pipeline::{
    PipelineError, ProcessingMode, Processor, ProcessorConfig, ProcessorStats, StreamMessage,
    Update, UpdateSource, channel, run_producer, shutdown_pair,
};

// Sinks
pub use crate::sink::{FeatureSink, FeatureStore, StoreStats};

// Utility functions
pub use crate::utils::{current_time_millis, normalize_timestamp_ms};
