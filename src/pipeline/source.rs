//! Upstream sources feeding the producer.
//!
//! A source yields batches of [`Update`]s in non-decreasing timestamp order.
//! The producer flattens every batch onto the queue, so a source is free to
//! mirror its transport: one update per replayed row, or one batch per
//! exchange message.

use super::update::Update;
use crate::orderbook::Side;
use crate::utils::normalize_timestamp_ms;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Asynchronous supplier of update batches.
pub trait UpdateSource: Send {
    /// Next batch, or `None` once the source is exhausted.
    fn next_batch(&mut self) -> impl Future<Output = Option<Vec<Update>>> + Send;
}

/// Replays recorded updates, pacing them by their timestamps.
///
/// With a speed of `s`, the gap between two consecutive updates is slept for
/// `gap / s`. A speed of zero or below replays as fast as the queue allows.
#[derive(Debug)]
pub struct ReplaySource {
    updates: std::vec::IntoIter<Update>,
    speed: f64,
    last_timestamp_ms: Option<u64>,
}

impl ReplaySource {
    /// Replay `updates` in the given order at `speed` times real time.
    pub fn new(updates: Vec<Update>, speed: f64) -> Self {
        Self {
            updates: updates.into_iter(),
            speed,
            last_timestamp_ms: None,
        }
    }

    /// Replay without pacing
    pub fn unpaced(updates: Vec<Update>) -> Self {
        Self::new(updates, 0.0)
    }

    /// Parse JSON-lines text, one [`Update`] object per non-blank line.
    pub fn from_json_lines(text: &str, speed: f64) -> Result<Self, serde_json::Error> {
        let updates = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<Update>, _>>()?;
        debug!(updates = updates.len(), speed, "replay source loaded");
        Ok(Self::new(updates, speed))
    }

    /// Updates not yet replayed
    pub fn remaining(&self) -> usize {
        self.updates.len()
    }

    fn pacing_delay(&self, timestamp_ms: u64) -> Option<Duration> {
        if self.speed <= 0.0 || !self.speed.is_finite() {
            return None;
        }
        let gap_ms = timestamp_ms.checked_sub(self.last_timestamp_ms?)?;
        if gap_ms == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(gap_ms as f64 / 1_000.0 / self.speed))
    }
}

impl UpdateSource for ReplaySource {
    async fn next_batch(&mut self) -> Option<Vec<Update>> {
        let update = self.updates.next()?;
        let timestamp_ms = normalize_timestamp_ms(update.timestamp);

        if let Some(delay) = self.pacing_delay(timestamp_ms) {
            tokio::time::sleep(delay).await;
        }
        self.last_timestamp_ms = Some(timestamp_ms);

        Some(vec![update])
    }
}

/// Source fed by a live client through a channel of batches.
///
/// Exhausted once every sender has been dropped.
#[derive(Debug)]
pub struct BatchedSource {
    receiver: mpsc::Receiver<Vec<Update>>,
}

impl BatchedSource {
    pub fn new(receiver: mpsc::Receiver<Vec<Update>>) -> Self {
        Self { receiver }
    }

    /// Create a source together with the sender a client pushes batches into
    pub fn channel(capacity: usize) -> (mpsc::Sender<Vec<Update>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx))
    }
}

impl UpdateSource for BatchedSource {
    async fn next_batch(&mut self) -> Option<Vec<Update>> {
        self.receiver.recv().await
    }
}

/// Exchange depth-diff message: event time, last update id and absolute
/// quantities per price, prices and quantities encoded as strings.
///
/// ```
/// use lob_microstructure::pipeline::DepthUpdateMessage;
///
/// let msg: DepthUpdateMessage = serde_json::from_str(
///     r#"{"e":"depthUpdate","E":1700000000123,"s":"BTCUSDT","U":1,"u":7,
///         "b":[["100.5","2.0"]],"a":[["101.0","0"]]}"#,
/// ).unwrap();
/// let updates = msg.to_updates();
/// assert_eq!(updates.len(), 2);
/// assert_eq!(updates[1].quantity, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthUpdateMessage {
    /// Event time in milliseconds
    #[serde(rename = "E")]
    pub event_time: u64,
    /// Final update id in the message
    #[serde(rename = "u")]
    pub last_update_id: u64,
    /// Bid `[price, quantity]` pairs
    #[serde(rename = "b", default)]
    pub bids: Vec<[String; 2]>,
    /// Ask `[price, quantity]` pairs
    #[serde(rename = "a", default)]
    pub asks: Vec<[String; 2]>,
}

impl DepthUpdateMessage {
    /// Flatten into individual updates, bids first.
    ///
    /// `level` is the position of the pair within its side. Pairs that do
    /// not parse as numbers are dropped with a warning.
    pub fn to_updates(&self) -> Vec<Update> {
        let mut updates = Vec::with_capacity(self.bids.len() + self.asks.len());
        for (side, pairs) in [(Side::Bid, &self.bids), (Side::Ask, &self.asks)] {
            for (level, [price, quantity]) in pairs.iter().enumerate() {
                match (price.parse::<f64>(), quantity.parse::<f64>()) {
                    (Ok(price), Ok(quantity)) => updates.push(
                        Update::new(self.event_time, side, price, quantity)
                            .with_position(level as u32, self.last_update_id),
                    ),
                    _ => warn!(
                        %side,
                        price = price.as_str(),
                        quantity = quantity.as_str(),
                        "unparseable depth level dropped"
                    ),
                }
            }
        }
        updates
    }
}
