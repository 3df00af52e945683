//! Book side definition.

use super::error::OrderBookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of the order book a price level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy interest, best level is the highest price
    Bid,
    /// Sell interest, best level is the lowest price
    Ask,
}

impl Side {
    /// Returns the opposite side
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Lowercase wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bid" | "b" | "buy" => Ok(Side::Bid),
            "ask" | "a" | "sell" => Ok(Side::Ask),
            _ => Err(OrderBookError::InvalidSide {
                value: s.to_string(),
            }),
        }
    }
}
