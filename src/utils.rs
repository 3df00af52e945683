use std::time::{SystemTime, UNIX_EPOCH};

/// Raw timestamps above this value are taken to be microseconds.
///
/// Millisecond epoch times sit around `1.7e12`; microsecond epoch times
/// around `1.7e15`.
pub const MICROSECOND_THRESHOLD: u64 = 10_000_000_000_000;

/// Normalize a producer timestamp of unknown unit to milliseconds.
#[inline]
pub fn normalize_timestamp_ms(raw: u64) -> u64 {
    if raw > MICROSECOND_THRESHOLD {
        raw / 1_000
    } else {
        raw
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Returns 0 if the system clock is set before the epoch.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
