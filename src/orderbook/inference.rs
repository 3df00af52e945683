//! Diffing of consecutive snapshots into discrete level events.

use super::event::{BookEvent, BookEventType};
use super::side::Side;
use super::snapshot::BookSnapshot;

/// Stateless engine that turns two consecutive snapshots into level events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventInferenceEngine;

impl EventInferenceEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }

    /// Compare `prev` against `curr` side by side.
    ///
    /// - price only in `curr`: [`BookEventType::Add`] with `prev_qty = 0`
    /// - price in both with a different quantity: [`BookEventType::Modify`]
    /// - price only in `prev`: [`BookEventType::Cancel`] with `new_qty = 0`
    ///
    /// Callers must not rely on the order of the returned events.
    pub fn infer(
        &self,
        prev: &BookSnapshot,
        curr: &BookSnapshot,
        timestamp: u64,
    ) -> Vec<BookEvent> {
        let mut events = Vec::new();

        for side in [Side::Bid, Side::Ask] {
            let prev_levels = prev.levels(side);
            let curr_levels = curr.levels(side);

            for (price, &new_qty) in curr_levels {
                let event = match prev_levels.get(price) {
                    None => Some((0.0, BookEventType::Add)),
                    Some(&prev_qty) if prev_qty != new_qty => {
                        Some((prev_qty, BookEventType::Modify))
                    }
                    Some(_) => None,
                };
                if let Some((prev_qty, event_type)) = event {
                    events.push(BookEvent {
                        timestamp,
                        side,
                        price: price.0,
                        prev_qty,
                        new_qty,
                        event_type,
                    });
                }
            }

            events.extend(
                prev_levels
                    .iter()
                    .filter(|(price, _)| !curr_levels.contains_key(*price))
                    .map(|(price, &prev_qty)| BookEvent {
                        timestamp,
                        side,
                        price: price.0,
                        prev_qty,
                        new_qty: 0.0,
                        event_type: BookEventType::Cancel,
                    }),
            );
        }

        events
    }
}
