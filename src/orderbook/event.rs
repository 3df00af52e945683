use super::side::Side;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of change observed at a price level between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookEventType {
    /// Level appeared
    Add,
    /// Level quantity changed
    Modify,
    /// Level disappeared
    Cancel,
}

impl fmt::Display for BookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookEventType::Add => "add",
            BookEventType::Modify => "modify",
            BookEventType::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Event data for an inferred price level change.
/// It is assumed that the listener is aware of the
/// order book context so we are not adding symbol here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookEvent {
    /// Snapshot time the change was observed at (milliseconds)
    pub timestamp: u64,

    /// the order book side of the price level
    pub side: Side,

    /// price level price
    pub price: f64,

    /// quantity before the change, 0 for an add
    pub prev_qty: f64,

    /// quantity after the change, 0 for a cancel
    pub new_qty: f64,

    /// classification of the change
    pub event_type: BookEventType,
}

impl BookEvent {
    /// Signed quantity change (`new_qty - prev_qty`)
    pub fn delta(&self) -> f64 {
        self.new_qty - self.prev_qty
    }
}

/// A thread-safe listener callback for inferred book events.
///
/// Called once per applied bucket with the full diff against the previous
/// snapshot. The slice ordering carries no meaning.
pub type BookEventListener = Arc<dyn Fn(&[BookEvent]) + Send + Sync>;
