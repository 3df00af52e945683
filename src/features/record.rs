//! Fixed-field feature vector and the stored training row.

use crate::labeling::Label;
use serde::{Deserialize, Serialize};

/// Point-in-time microstructure features computed from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureFeatures {
    /// Highest bid price
    pub best_bid: f64,
    /// Lowest ask price
    pub best_ask: f64,
    /// `best_ask - best_bid`
    pub spread: f64,
    /// `(best_bid + best_ask) / 2`
    pub mid_price: f64,
    /// Quantity summed over the top-N bid levels
    pub bid_volume_top_n: f64,
    /// Quantity summed over the top-N ask levels
    pub ask_volume_top_n: f64,
    /// `(bid - ask) / (bid + ask)` over the top-N volumes, 0 when both are empty
    pub imbalance: f64,
    /// Capped running standard deviation of the mid-price
    pub rolling_volatility: f64,
    /// Difference between the two latest mid-prices
    pub rolling_mid_return: f64,
    /// Mean of the stored imbalance history
    pub rolling_imbalance_mean: f64,
}

impl MicrostructureFeatures {
    /// Column names in the order returned by [`Self::to_array`].
    pub const NAMES: [&'static str; 10] = [
        "best_bid",
        "best_ask",
        "spread",
        "mid_price",
        "bid_volume_top_n",
        "ask_volume_top_n",
        "imbalance",
        "rolling_volatility",
        "rolling_mid_return",
        "rolling_imbalance_mean",
    ];

    /// Flatten into a dense vector, ordered as [`Self::NAMES`].
    pub fn to_array(&self) -> [f64; 10] {
        [
            self.best_bid,
            self.best_ask,
            self.spread,
            self.mid_price,
            self.bid_volume_top_n,
            self.ask_volume_top_n,
            self.imbalance,
            self.rolling_volatility,
            self.rolling_mid_return,
            self.rolling_imbalance_mean,
        ]
    }
}

/// One training row: bucket timestamp, its features and the delayed label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Bucket boundary timestamp in milliseconds
    pub timestamp: u64,
    /// Features computed for the bucket
    #[serde(flatten)]
    pub features: MicrostructureFeatures,
    /// Direction label, `None` until the horizon has elapsed
    pub label: Option<Label>,
}
