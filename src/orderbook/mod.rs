//! Level-2 order book reconstruction, snapshots and snapshot diffing.

pub mod book;
pub mod error;
/// Inferred price level events and listener callbacks.
pub mod event;
/// Snapshot diffing into add, modify and cancel events.
pub mod inference;
pub mod side;
pub mod snapshot;

pub use book::{DEFAULT_MAX_DEPTH, OrderBook};
pub use error::OrderBookError;
pub use event::{BookEvent, BookEventListener, BookEventType};
pub use inference::EventInferenceEngine;
pub use side::Side;
pub use snapshot::{BookDepth, BookSnapshot, LevelMap, PriceLevel};
