//! Order book error types

use thiserror::Error;

/// Errors that can occur within the OrderBook
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum OrderBookError {
    /// Side value that is neither bid nor ask
    #[error("invalid side: {value:?} (expected \"bid\" or \"ask\")")]
    InvalidSide {
        /// The raw value received from the producer
        value: String,
    },

    /// Price that cannot be used as a level key (NaN or infinite)
    #[error("invalid price level: {price}")]
    InvalidPrice {
        /// The rejected price
        price: f64,
    },

    /// Quantity that is NaN or infinite
    #[error("invalid quantity {quantity} at price {price}")]
    InvalidQuantity {
        /// Price of the level being updated
        price: f64,
        /// The rejected quantity
        quantity: f64,
    },
}
