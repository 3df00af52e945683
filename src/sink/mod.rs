//! Destinations for feature records and their delayed labels.
//!
//! The processor only talks to a [`FeatureSink`]. [`FeatureStore`] is the
//! in-memory implementation: rows in insertion order plus a timestamp index
//! so labels can be attached after the fact.

use crate::features::{FeatureRecord, MicrostructureFeatures};
use crate::labeling::Label;
use crate::pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Receiver of feature rows and late-arriving labels.
pub trait FeatureSink {
    /// Store a new row for `timestamp`.
    ///
    /// A second row for an existing timestamp is appended and becomes the
    /// target of later labels for that timestamp.
    fn add_record(
        &mut self,
        timestamp: u64,
        features: MicrostructureFeatures,
        label: Option<Label>,
    );

    /// Attach a label to the row stored for `timestamp`.
    ///
    /// Returns `false` when no row exists for that timestamp; nothing is
    /// stored in that case.
    fn set_label(&mut self, timestamp: u64, label: Label) -> bool;
}

impl<S: FeatureSink + ?Sized> FeatureSink for &mut S {
    fn add_record(
        &mut self,
        timestamp: u64,
        features: MicrostructureFeatures,
        label: Option<Label>,
    ) {
        (**self).add_record(timestamp, features, label);
    }

    fn set_label(&mut self, timestamp: u64, label: Label) -> bool {
        (**self).set_label(timestamp, label)
    }
}

impl<S: FeatureSink + ?Sized> FeatureSink for Box<S> {
    fn add_record(
        &mut self,
        timestamp: u64,
        features: MicrostructureFeatures,
        label: Option<Label>,
    ) {
        (**self).add_record(timestamp, features, label);
    }

    fn set_label(&mut self, timestamp: u64, label: Label) -> bool {
        (**self).set_label(timestamp, label)
    }
}

/// Summary of a [`FeatureStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Rows stored
    pub total_records: usize,
    /// Rows carrying a label
    pub labeled_records: usize,
    /// Last row timestamp minus first row timestamp, 0 below two rows
    pub time_span_ms: u64,
    /// Count of labeled rows per label
    pub label_distribution: BTreeMap<Label, usize>,
}

/// In-memory feature table.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    records: Vec<FeatureRecord>,
    index_by_timestamp: HashMap<u64, usize>,
}

impl FeatureStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when no rows are stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All rows in insertion order
    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    /// Row indexed for `timestamp`
    pub fn get(&self, timestamp: u64) -> Option<&FeatureRecord> {
        self.index_by_timestamp
            .get(&timestamp)
            .and_then(|&idx| self.records.get(idx))
    }

    /// Rows that already carry a label
    pub fn labeled_records(&self) -> impl Iterator<Item = &FeatureRecord> + '_ {
        self.records.iter().filter(|record| record.label.is_some())
    }

    /// Consume the store, returning its rows
    pub fn into_records(self) -> Vec<FeatureRecord> {
        self.records
    }

    /// Aggregate counts over the stored rows.
    pub fn stats(&self) -> StoreStats {
        let mut label_distribution = BTreeMap::new();
        for label in self.records.iter().filter_map(|record| record.label) {
            *label_distribution.entry(label).or_insert(0) += 1;
        }

        let time_span_ms = match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => last.timestamp.saturating_sub(first.timestamp),
            _ => 0,
        };

        StoreStats {
            total_records: self.records.len(),
            labeled_records: label_distribution.values().sum(),
            time_span_ms,
            label_distribution,
        }
    }

    /// Write every row as one JSON object per line.
    pub fn write_json_lines<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut writer = BufWriter::new(writer);
        for record in &self.records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    /// Save every row to a JSON-lines file, replacing any existing file.
    pub fn save_json_lines<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let path = path.as_ref();
        File::create(path)
            .and_then(|file| self.write_json_lines(file))
            .map_err(|source| PipelineError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), records = self.records.len(), "feature store saved");
        Ok(())
    }
}

impl FeatureSink for FeatureStore {
    fn add_record(
        &mut self,
        timestamp: u64,
        features: MicrostructureFeatures,
        label: Option<Label>,
    ) {
        self.index_by_timestamp
            .insert(timestamp, self.records.len());
        self.records.push(FeatureRecord {
            timestamp,
            features,
            label,
        });
    }

    fn set_label(&mut self, timestamp: u64, label: Label) -> bool {
        match self
            .index_by_timestamp
            .get(&timestamp)
            .and_then(|&idx| self.records.get_mut(idx))
        {
            Some(record) => {
                record.label = Some(label);
                true
            }
            None => {
                debug!(timestamp, %label, "no record for label");
                false
            }
        }
    }
}
