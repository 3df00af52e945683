//! Core OrderBook implementation for maintaining aggregated price levels

use super::error::OrderBookError;
use super::side::Side;
use super::snapshot::{BookDepth, BookSnapshot, LevelMap, PriceLevel};
use crossbeam_skiplist::SkipMap;
use ordered_float::OrderedFloat;
use tracing::trace;

/// Default maximum number of levels retained per side
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Level-2 order book holding one aggregated quantity per price.
///
/// Both sides are skip lists ordered by ascending price, so the best bid is
/// the last bid key and the best ask is the first ask key. Each side is
/// bounded by `max_depth`; the level furthest from the best is evicted first.
pub struct OrderBook {
    /// Bid side price levels, keyed by price, ascending
    pub(super) bids: SkipMap<OrderedFloat<f64>, f64>,

    /// Ask side price levels, keyed by price, ascending
    pub(super) asks: SkipMap<OrderedFloat<f64>, f64>,

    /// Maximum number of levels kept on each side
    pub(super) max_depth: usize,
}

impl OrderBook {
    /// Create a new, empty order book bounded to `max_depth` levels per side.
    ///
    /// A `max_depth` of zero is raised to one so the book can hold a quote.
    pub fn new(max_depth: usize) -> Self {
        Self {
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Maximum number of levels retained per side
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn side_map(&self, side: Side) -> &SkipMap<OrderedFloat<f64>, f64> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Add, overwrite or remove a price level.
    ///
    /// A quantity `<= 0` removes the level (no-op when absent); a positive
    /// quantity inserts or overwrites it. After the mutation the side is
    /// trimmed back to `max_depth` and a single cross check runs: if the best
    /// bid is at or above the best ask, the top ask level is dropped once.
    /// The check is not repeated, so a book can remain crossed when more
    /// than one crossing level exists.
    ///
    /// # Errors
    /// Returns [`OrderBookError::InvalidPrice`] or
    /// [`OrderBookError::InvalidQuantity`] for non-finite input. The book is
    /// left untouched in that case.
    pub fn update_level(
        &mut self,
        side: Side,
        price: f64,
        quantity: f64,
    ) -> Result<(), OrderBookError> {
        if !price.is_finite() {
            return Err(OrderBookError::InvalidPrice { price });
        }
        if !quantity.is_finite() {
            return Err(OrderBookError::InvalidQuantity { price, quantity });
        }

        let key = OrderedFloat(price);
        let levels = self.side_map(side);
        if quantity <= 0.0 {
            levels.remove(&key);
        } else {
            levels.insert(key, quantity);
        }
        trace!(%side, price, quantity, "update_level");

        self.enforce_depth(side);
        self.sanitize_crossed_book();
        Ok(())
    }

    /// Evicts the weakest level of `side` until it fits within `max_depth`.
    fn enforce_depth(&self, side: Side) {
        let levels = self.side_map(side);
        while levels.len() > self.max_depth {
            let evicted = match side {
                Side::Bid => levels.pop_front(),
                Side::Ask => levels.pop_back(),
            };
            if let Some(entry) = evicted {
                trace!(%side, price = entry.key().0, "evicted level beyond max depth");
            }
        }
    }

    /// One-pass guard against a crossed book: drops the top ask once.
    fn sanitize_crossed_book(&self) {
        let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) else {
            return;
        };
        if bid >= ask {
            if let Some(entry) = self.asks.pop_front() {
                trace!(
                    bid,
                    ask,
                    dropped = entry.key().0,
                    "crossed book, dropped top ask level"
                );
            }
        }
    }

    /// Get the best bid price, if any
    ///
    /// # Performance
    /// O(1) operation using SkipMap's ordered structure (highest price is last)
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.back().map(|entry| entry.key().0)
    }

    /// Get the best ask price, if any
    ///
    /// # Performance
    /// O(1) operation using SkipMap's ordered structure (lowest price is first)
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.front().map(|entry| entry.key().0)
    }

    /// Best bid price together with its quantity
    pub fn best_bid_level(&self) -> Option<PriceLevel> {
        self.bids
            .back()
            .map(|entry| PriceLevel::new(entry.key().0, *entry.value()))
    }

    /// Best ask price together with its quantity
    pub fn best_ask_level(&self) -> Option<PriceLevel> {
        self.asks
            .front()
            .map(|entry| PriceLevel::new(entry.key().0, *entry.value()))
    }

    /// Get the mid price (average of best bid and best ask)
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }

    /// Get the spread (best ask - best bid)
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Quantity resting at an exact price, if the level exists
    pub fn quantity_at(&self, side: Side, price: f64) -> Option<f64> {
        self.side_map(side)
            .get(&OrderedFloat(price))
            .map(|entry| *entry.value())
    }

    /// Number of levels on a side
    pub fn len(&self, side: Side) -> usize {
        self.side_map(side).len()
    }

    /// True when neither side holds a level
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// The `n` best levels of each side, best first
    pub fn depth(&self, n: usize) -> BookDepth {
        BookDepth {
            bids: self
                .bids
                .iter()
                .rev()
                .take(n)
                .map(|entry| PriceLevel::new(entry.key().0, *entry.value()))
                .collect(),
            asks: self
                .asks
                .iter()
                .take(n)
                .map(|entry| PriceLevel::new(entry.key().0, *entry.value()))
                .collect(),
        }
    }

    /// Create an owned snapshot of both sides
    pub fn snapshot(&self) -> BookSnapshot {
        let copy = |levels: &SkipMap<OrderedFloat<f64>, f64>| -> LevelMap {
            levels
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect()
        };
        BookSnapshot::from_maps(copy(&self.bids), copy(&self.asks))
    }

    /// Remove every level from both sides
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        trace!("order book reset");
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("max_depth", &self.max_depth)
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .finish()
    }
}
