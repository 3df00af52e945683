//! Messages flowing from a producer to the processor.

use crate::orderbook::Side;
use serde::{Deserialize, Serialize};

/// One absolute level change reported by a feed.
///
/// `quantity` replaces whatever the level held; zero or negative removes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Event time in milliseconds, or microseconds (normalized on ingest)
    pub timestamp: u64,
    /// Side of the book
    pub side: Side,
    /// Level price
    pub price: f64,
    /// New total quantity at the level
    pub quantity: f64,
    /// Position of the level within its side in the source message
    #[serde(default)]
    pub level: u32,
    /// Sequence number of the source message
    #[serde(default)]
    pub sequence_id: u64,
}

impl Update {
    /// Create an update with `level` and `sequence_id` set to zero
    pub fn new(timestamp: u64, side: Side, price: f64, quantity: f64) -> Self {
        Self {
            timestamp,
            side,
            price,
            quantity,
            level: 0,
            sequence_id: 0,
        }
    }

    /// Set the level index and sequence number
    pub fn with_position(mut self, level: u32, sequence_id: u64) -> Self {
        self.level = level;
        self.sequence_id = sequence_id;
        self
    }
}

/// Item carried by the producer to processor queue.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// A level change
    Update(Update),
    /// No further updates will follow
    EndOfStream,
}

impl From<Update> for StreamMessage {
    fn from(update: Update) -> Self {
        StreamMessage::Update(update)
    }
}
