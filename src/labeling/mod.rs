//! Delayed directional labels.
//!
//! An observation `(t, price)` is labeled once a later call reports a time
//! at least `horizon_ms` past `t`. The label compares the price at that later
//! time against the observed price:
//!
//! ```text
//! ret   = (current_price - price) / price
//! label = Flat  if |ret| <  threshold
//!         Up    if  ret  >  0
//!         Down  otherwise
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{trace, warn};

/// Basis points per unit of return
const BPS: f64 = 10_000.0;

/// Default labeling horizon in milliseconds
pub const DEFAULT_HORIZON_MS: u64 = 5_000;

/// Default flat band in basis points
pub const DEFAULT_FLAT_THRESHOLD_BPS: f64 = 0.3;

/// Direction of the mid-price move over the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Label {
    /// Price fell by at least the threshold
    Down = -1,
    /// Price moved less than the threshold
    Flat = 0,
    /// Price rose by at least the threshold
    Up = 1,
}

impl Label {
    /// Integer encoding used by training data: -1, 0, 1
    #[inline]
    pub fn as_int(self) -> i8 {
        self as i8
    }

    /// Classify a relative return against a flat band.
    pub fn from_return(ret: f64, flat_threshold: f64) -> Self {
        if ret.abs() < flat_threshold {
            Label::Flat
        } else if ret > 0.0 {
            Label::Up
        } else {
            Label::Down
        }
    }
}

impl From<Label> for i8 {
    fn from(label: Label) -> Self {
        label.as_int()
    }
}

impl TryFrom<i8> for Label {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Label::Down),
            0 => Ok(Label::Flat),
            1 => Ok(Label::Up),
            other => Err(format!("invalid label value {other}, expected -1, 0 or 1")),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_int())
    }
}

/// Labeling settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Time after an observation at which it is labeled
    pub horizon_ms: u64,
    /// Half-width of the flat band, in basis points
    pub flat_threshold_bps: f64,
}

impl LabelConfig {
    /// Flat band as a fraction of price
    pub fn flat_threshold_fraction(&self) -> f64 {
        self.flat_threshold_bps / BPS
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            horizon_ms: DEFAULT_HORIZON_MS,
            flat_threshold_bps: DEFAULT_FLAT_THRESHOLD_BPS,
        }
    }
}

/// FIFO buffer of observations awaiting their horizon.
///
/// Callers must feed non-decreasing timestamps to [`add_observation`]; the
/// buffer relies on that order to stop at the first observation still inside
/// the horizon and does not check it.
///
/// [`add_observation`]: LabelGenerator::add_observation
#[derive(Debug, Clone)]
pub struct LabelGenerator {
    horizon_ms: u64,
    flat_threshold: f64,
    buffer: VecDeque<(u64, f64)>,
}

impl LabelGenerator {
    /// Create a generator with a horizon and a flat band given as a fraction
    /// (0.3 bps is `0.00003`).
    pub fn new(horizon_ms: u64, flat_threshold: f64) -> Self {
        Self {
            horizon_ms,
            flat_threshold,
            buffer: VecDeque::new(),
        }
    }

    /// Create a generator from a [`LabelConfig`]
    pub fn from_config(config: &LabelConfig) -> Self {
        Self::new(config.horizon_ms, config.flat_threshold_fraction())
    }

    /// Labeling horizon in milliseconds
    pub fn horizon_ms(&self) -> u64 {
        self.horizon_ms
    }

    /// Flat band as a fraction of price
    pub fn flat_threshold(&self) -> f64 {
        self.flat_threshold
    }

    /// Observations still waiting for their horizon
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer an observation for later labeling.
    pub fn add_observation(&mut self, timestamp_ms: u64, price: f64) {
        self.buffer.push_back((timestamp_ms, price));
    }

    /// Label and remove every buffered observation at least `horizon_ms` old.
    ///
    /// Stops at the first observation still inside the horizon. A current
    /// time earlier than an observation counts as inside the horizon.
    pub fn pop_ready_labels(
        &mut self,
        current_timestamp_ms: u64,
        current_price: f64,
    ) -> Vec<(u64, Label)> {
        let mut labels = Vec::new();

        while let Some(&(timestamp_ms, price)) = self.buffer.front() {
            let ready = current_timestamp_ms
                .checked_sub(timestamp_ms)
                .is_some_and(|age| age >= self.horizon_ms);
            if !ready {
                break;
            }
            self.buffer.pop_front();

            let label = if price == 0.0 {
                warn!(timestamp_ms, "observation with zero price, labeling flat");
                Label::Flat
            } else {
                let ret = (current_price - price) / price;
                Label::from_return(ret, self.flat_threshold)
            };
            trace!(timestamp_ms, %label, "label ready");
            labels.push((timestamp_ms, label));
        }

        labels
    }

    /// Drop every pending observation
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LabelGenerator {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}
