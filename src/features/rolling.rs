//! Running mean/variance with a capped sample count.

use serde::{Deserialize, Serialize};

/// Welford-style accumulator whose sample count stops growing at `cap`.
///
/// Once `cap` samples have been seen, every new sample still updates the
/// mean and the sum of squared deviations, but with the count frozen at
/// `cap`. Expired samples are never subtracted, so the result is a smoothed
/// estimate that keeps memory of older data, not a sliding-window variance.
/// Trained models depend on this exact statistic; do not replace it with a
/// true window recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CappedRunningVariance {
    cap: usize,
    count: usize,
    mean: f64,
    m2: f64,
}

impl CappedRunningVariance {
    /// Create an empty accumulator. A `cap` of zero is treated as one.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Fold one sample into the estimate.
    pub fn push(&mut self, value: f64) {
        self.count = (self.count + 1).min(self.cap);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Sample count, capped
    pub fn count(&self) -> usize {
        self.count
    }

    /// Running mean
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// `sqrt(m2 / (count - 1))`, or 0 with fewer than two samples
    pub fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / (self.count - 1) as f64).sqrt()
        } else {
            0.0
        }
    }

    /// Forget every sample
    pub fn reset(&mut self) {
        self.count = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
    }
}
