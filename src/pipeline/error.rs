//! Pipeline error types

use crate::orderbook::OrderBookError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or driving the processing pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// A configuration value is out of range
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration
        message: String,
    },

    /// Processing mode name that is neither `live` nor `replay`
    #[error("invalid mode {value:?}, expected \"live\" or \"replay\"")]
    InvalidMode {
        /// The rejected mode name
        value: String,
    },

    /// An update was rejected by the order book
    #[error(transparent)]
    OrderBook(#[from] OrderBookError),

    /// The processor already reached end of stream
    #[error("processor is finalized and accepts no further updates")]
    Finalized,

    /// Reading or writing a file failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The file involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
