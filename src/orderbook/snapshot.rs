//! Order book snapshot for market data

use super::side::Side;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Ordered price to quantity map used by snapshot sides, ascending by price.
pub type LevelMap = BTreeMap<OrderedFloat<f64>, f64>;

/// A single aggregated price level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price
    pub price: f64,
    /// Aggregated resting quantity at this price, always positive
    pub quantity: f64,
}

impl PriceLevel {
    /// Create a new price level
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }
}

/// Top-of-book view of both sides, best level first on each side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDepth {
    /// Bid levels, highest price first
    pub bids: Vec<PriceLevel>,
    /// Ask levels, lowest price first
    pub asks: Vec<PriceLevel>,
}

/// A snapshot of the order book state at a specific point in time.
///
/// The snapshot owns its level maps: nothing in it aliases the live
/// `OrderBook`, and there is no API to mutate it after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    #[serde(with = "levels_as_vec")]
    bids: LevelMap,
    #[serde(with = "levels_as_vec")]
    asks: LevelMap,
}

impl BookSnapshot {
    /// Build a snapshot from already-ordered level maps.
    pub(crate) fn from_maps(bids: LevelMap, asks: LevelMap) -> Self {
        Self { bids, asks }
    }

    /// Build a snapshot from `(price, quantity)` pairs.
    ///
    /// Levels with a non-positive quantity are dropped, matching the book's
    /// rule that removals are never stored.
    pub fn from_levels<B, A>(bids: B, asks: A) -> Self
    where
        B: IntoIterator<Item = (f64, f64)>,
        A: IntoIterator<Item = (f64, f64)>,
    {
        let collect = |levels: &mut dyn Iterator<Item = (f64, f64)>| -> LevelMap {
            levels
                .filter(|&(_, quantity)| quantity > 0.0)
                .map(|(price, quantity)| (OrderedFloat(price), quantity))
                .collect()
        };
        Self {
            bids: collect(&mut bids.into_iter()),
            asks: collect(&mut asks.into_iter()),
        }
    }

    /// Level map for one side, ascending by price
    pub fn levels(&self, side: Side) -> &LevelMap {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Get the best bid price
    pub fn best_bid(&self) -> Option<f64> {
        let best = self.bids.keys().next_back().map(|price| price.0);
        trace!("best_bid: {:?}", best);
        best
    }

    /// Get the best ask price
    pub fn best_ask(&self) -> Option<f64> {
        let best = self.asks.keys().next().map(|price| price.0);
        trace!("best_ask: {:?}", best);
        best
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

    /// True when both sides hold at least one level
    pub fn has_both_sides(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    /// Number of levels stored on a side
    pub fn level_count(&self, side: Side) -> usize {
        self.levels(side).len()
    }

    /// Bid levels, highest price first
    pub fn bids(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.bids
            .iter()
            .rev()
            .map(|(price, quantity)| PriceLevel::new(price.0, *quantity))
    }

    /// Ask levels, lowest price first
    pub fn asks(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.asks
            .iter()
            .map(|(price, quantity)| PriceLevel::new(price.0, *quantity))
    }

    /// The `n` levels closest to the best price on a side, best first
    pub fn top_levels(&self, side: Side, n: usize) -> Vec<PriceLevel> {
        match side {
            Side::Bid => self.bids().take(n).collect(),
            Side::Ask => self.asks().take(n).collect(),
        }
    }

    /// Sum of quantities over the `n` best levels of a side
    pub fn volume_top_n(&self, side: Side, n: usize) -> f64 {
        match side {
            Side::Bid => self.bids.values().rev().take(n).sum(),
            Side::Ask => self.asks.values().take(n).sum(),
        }
    }

    /// Serialize the snapshot to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// JSON objects cannot carry float keys, so each side travels as a list of
/// `{price, quantity}` entries in ascending price order.
mod levels_as_vec {
    use super::{LevelMap, PriceLevel};
    use ordered_float::OrderedFloat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(levels: &LevelMap, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let levels: Vec<PriceLevel> = levels
            .iter()
            .map(|(price, quantity)| PriceLevel::new(price.0, *quantity))
            .collect();
        levels.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<LevelMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        let levels = Vec::<PriceLevel>::deserialize(deserializer)?;
        Ok(levels
            .into_iter()
            .filter(|level| level.quantity > 0.0)
            .map(|level| (OrderedFloat(level.price), level.quantity))
            .collect())
    }
}
