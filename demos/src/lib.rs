//! Shared helpers for the demo binaries.

use lob_microstructure::orderbook::Side;
use lob_microstructure::pipeline::Update;
use std::env;
use tracing::Level;

/// Install a formatting subscriber.
///
/// The level is read from the `LOGLEVEL` environment variable
/// (`trace`, `debug`, `info`, `warn`, `error`), defaulting to `info`.
pub fn setup_logger() {
    let level = env::var("LOGLEVEL")
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Deterministic two-sided feed: `buckets` seconds of full books whose mid
/// follows a slow sine, `levels` levels per side.
pub fn sample_replay_updates(start_ms: u64, buckets: u64, levels: u32) -> Vec<Update> {
    let mut updates = Vec::new();
    for bucket in 0..buckets {
        let ts = start_ms + bucket * 1_000;
        let mid = 100.0 + (bucket as f64 / 6.0).sin() * 0.8;
        for level in 0..levels {
            let offset = 0.05 + f64::from(level) * 0.1;
            let quantity = 1.0 + f64::from((level + bucket as u32) % 4);
            updates.push(
                Update::new(ts, Side::Bid, round_tick(mid - offset), quantity)
                    .with_position(level, bucket),
            );
            updates.push(
                Update::new(ts + 1, Side::Ask, round_tick(mid + offset), quantity + 0.5)
                    .with_position(level, bucket),
            );
        }
    }
    updates
}

/// Round to a 0.01 tick
pub fn round_tick(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
