//! Microstructure feature computation.
//!
//! [`FeatureComputer`] turns a [`BookSnapshot`](crate::orderbook::BookSnapshot)
//! into a fixed set of named features. It keeps three pieces of rolling state
//! for the lifetime of a processing session:
//!
//! - the last `window` mid-prices (for the mid return)
//! - the last `window` imbalance values (for the imbalance mean)
//! - a [`CappedRunningVariance`] over mid-prices (for the volatility)

pub mod computer;
pub mod record;
pub mod rolling;

pub use computer::{DEFAULT_FEATURE_DEPTH, DEFAULT_WINDOW, FeatureComputer, FeatureConfig};
pub use record::{FeatureRecord, MicrostructureFeatures};
pub use rolling::CappedRunningVariance;
