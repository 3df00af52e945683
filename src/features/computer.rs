//! Snapshot to feature vector computation with rolling state.

use super::record::MicrostructureFeatures;
use super::rolling::CappedRunningVariance;
use crate::orderbook::{BookSnapshot, Side};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

/// Default number of levels per side summed into the volume features
pub const DEFAULT_FEATURE_DEPTH: usize = 10;

/// Default rolling window length, in snapshots
pub const DEFAULT_WINDOW: usize = 50;

/// Feature computation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Levels per side included in the volume and imbalance features
    pub depth: usize,
    /// Capacity of the rolling histories and cap of the variance count
    pub window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_FEATURE_DEPTH,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Computes [`MicrostructureFeatures`] from snapshots, carrying rolling state
/// between calls.
#[derive(Debug, Clone)]
pub struct FeatureComputer {
    depth: usize,
    window: usize,
    mid_prices: VecDeque<f64>,
    imbalances: VecDeque<f64>,
    volatility: CappedRunningVariance,
}

impl FeatureComputer {
    /// Create a computer summing `depth` levels per side with a rolling
    /// window of `window` snapshots. Zero values are raised to one.
    pub fn new(depth: usize, window: usize) -> Self {
        let window = window.max(1);
        Self {
            depth: depth.max(1),
            window,
            mid_prices: VecDeque::with_capacity(window),
            imbalances: VecDeque::with_capacity(window),
            volatility: CappedRunningVariance::new(window),
        }
    }

    /// Create a computer from a [`FeatureConfig`]
    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(config.depth, config.window)
    }

    /// Levels per side included in the volume features
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Rolling window length
    pub fn window(&self) -> usize {
        self.window
    }

    /// Samples folded into the volatility estimate (capped at the window)
    pub fn sample_count(&self) -> usize {
        self.volatility.count()
    }

    /// Number of mid-prices currently held in the rolling history
    pub fn history_len(&self) -> usize {
        self.mid_prices.len()
    }

    /// Compute features for `snapshot`.
    ///
    /// Returns `None` without touching the rolling state when either side of
    /// the snapshot is empty.
    pub fn compute(&mut self, snapshot: &BookSnapshot) -> Option<MicrostructureFeatures> {
        let (best_bid, best_ask) = match (snapshot.best_bid(), snapshot.best_ask()) {
            (Some(bid), Some(ask)) => (bid, ask),
            _ => return None,
        };

        let mid_price = (best_bid + best_ask) / 2.0;
        let spread = best_ask - best_bid;

        let bid_volume_top_n = snapshot.volume_top_n(Side::Bid, self.depth);
        let ask_volume_top_n = snapshot.volume_top_n(Side::Ask, self.depth);
        let total_volume = bid_volume_top_n + ask_volume_top_n;
        let imbalance = if total_volume > 0.0 {
            (bid_volume_top_n - ask_volume_top_n) / total_volume
        } else {
            0.0
        };

        push_bounded(&mut self.mid_prices, mid_price, self.window);
        push_bounded(&mut self.imbalances, imbalance, self.window);
        self.volatility.push(mid_price);

        let rolling_mid_return = match (
            self.mid_prices.back(),
            self.mid_prices.iter().nth_back(1),
        ) {
            (Some(last), Some(previous)) => last - previous,
            _ => 0.0,
        };
        let rolling_imbalance_mean =
            self.imbalances.iter().sum::<f64>() / self.imbalances.len() as f64;

        let features = MicrostructureFeatures {
            best_bid,
            best_ask,
            spread,
            mid_price,
            bid_volume_top_n,
            ask_volume_top_n,
            imbalance,
            rolling_volatility: self.volatility.std_dev(),
            rolling_mid_return,
            rolling_imbalance_mean,
        };
        trace!(?features, "computed features");
        Some(features)
    }

    /// Drop all rolling state
    pub fn reset(&mut self) {
        self.mid_prices.clear();
        self.imbalances.clear();
        self.volatility.reset();
    }
}

impl Default for FeatureComputer {
    fn default() -> Self {
        Self::from_config(&FeatureConfig::default())
    }
}

fn push_bounded(history: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if history.len() == capacity {
        history.pop_front();
    }
    history.push_back(value);
}
