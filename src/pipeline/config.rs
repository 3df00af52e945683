//! Processor configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! overrides:
//!
//! ```
//! use lob_microstructure::pipeline::{ProcessingMode, ProcessorConfig};
//!
//! let config = ProcessorConfig::from_json_str(
//!     r#"{ "mode": "replay", "labels": { "horizon_ms": 1000 } }"#,
//! ).unwrap();
//! assert_eq!(config.mode, ProcessingMode::Replay);
//! assert_eq!(config.labels.horizon_ms, 1000);
//! assert_eq!(config.snapshot_interval_ms, 1000);
//! ```

use super::error::PipelineError;
use crate::features::FeatureConfig;
use crate::labeling::LabelConfig;
use crate::orderbook::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default snapshot bucket width in milliseconds
pub const DEFAULT_SNAPSHOT_INTERVAL_MS: u64 = 1_000;

/// Default capacity of the producer to processor queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Default number of emitted snapshots between progress log lines
pub const DEFAULT_PROGRESS_LOG_INTERVAL: u64 = 100;

/// How buffered updates relate to the book state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ProcessingMode {
    /// Deltas accumulate on one book for the whole session
    #[default]
    Live,
    /// Each bucket is a full reconstruction; the book is reset per bucket
    Replay,
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::Live => f.write_str("live"),
            ProcessingMode::Replay => f.write_str("replay"),
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(ProcessingMode::Live),
            "replay" => Ok(ProcessingMode::Replay),
            _ => Err(PipelineError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ProcessingMode {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Full configuration of a [`Processor`](super::Processor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Reset semantics between buckets
    pub mode: ProcessingMode,

    /// Width of a snapshot bucket in milliseconds
    pub snapshot_interval_ms: u64,

    /// Levels kept per side of the order book
    pub max_depth: usize,

    /// Feature computation settings
    pub features: FeatureConfig,

    /// Labeling settings
    pub labels: LabelConfig,

    /// Capacity of the bounded update queue
    pub queue_capacity: usize,

    /// Emitted snapshots between progress log lines, 0 disables them
    pub progress_log_interval: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::default(),
            snapshot_interval_ms: DEFAULT_SNAPSHOT_INTERVAL_MS,
            max_depth: DEFAULT_MAX_DEPTH,
            features: FeatureConfig::default(),
            labels: LabelConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress_log_interval: DEFAULT_PROGRESS_LOG_INTERVAL,
        }
    }
}

impl ProcessorConfig {
    /// Default configuration with the given mode
    pub fn with_mode(mode: ProcessingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Check every field is within range.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |message: &str| {
            Err(PipelineError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if self.snapshot_interval_ms == 0 {
            return invalid("snapshot_interval_ms must be greater than 0");
        }
        if self.max_depth == 0 {
            return invalid("max_depth must be greater than 0");
        }
        if self.features.depth == 0 {
            return invalid("features.depth must be greater than 0");
        }
        if self.features.window == 0 {
            return invalid("features.window must be greater than 0");
        }
        if !self.labels.flat_threshold_bps.is_finite() || self.labels.flat_threshold_bps < 0.0 {
            return invalid("labels.flat_threshold_bps must be a finite, non-negative number");
        }
        if self.queue_capacity == 0 {
            return invalid("queue_capacity must be greater than 0");
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
