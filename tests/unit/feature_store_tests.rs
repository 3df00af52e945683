use lob_microstructure::features::FeatureRecord;
use lob_microstructure::labeling::{Label, LabelConfig};
use lob_microstructure::orderbook::Side;
use lob_microstructure::pipeline::{
    PipelineError, ProcessingMode, Processor, ProcessorConfig, Update,
};
use lob_microstructure::sink::FeatureStore;
use std::fs;
use tempfile::tempdir;

#[cfg(test)]
mod tests {
    use super::*;

    /// Replay ten one-second buckets with an up, down, flat mid pattern.
    fn populated_store() -> FeatureStore {
        let config = ProcessorConfig {
            mode: ProcessingMode::Replay,
            labels: LabelConfig {
                horizon_ms: 1_000,
                ..LabelConfig::default()
            },
            ..ProcessorConfig::default()
        };
        let mut processor = Processor::new(config, FeatureStore::new()).unwrap();

        let mids = [100.0, 101.0, 100.0, 100.0, 102.0, 101.0, 101.0, 103.0, 102.0, 102.0];
        for (k, mid) in mids.into_iter().enumerate() {
            let ts = 10_000 + k as u64 * 1_000;
            processor
                .on_update(Update::new(ts, Side::Bid, mid - 0.5, 1.0))
                .unwrap();
            processor
                .on_update(Update::new(ts + 1, Side::Ask, mid + 0.5, 1.0))
                .unwrap();
        }
        processor.finalize().unwrap();
        processor.into_sink()
    }

    #[test]
    fn test_stats_after_pipeline_run() {
        let store = populated_store();
        let stats = store.stats();

        assert_eq!(stats.total_records, 10);
        assert_eq!(stats.labeled_records, 9);
        assert_eq!(stats.time_span_ms, 9_000);
        assert_eq!(stats.label_distribution.get(&Label::Up), Some(&3));
        assert_eq!(stats.label_distribution.get(&Label::Down), Some(&3));
        assert_eq!(stats.label_distribution.get(&Label::Flat), Some(&3));
        assert_eq!(store.records().last().unwrap().label, None);
    }

    #[test]
    fn test_save_and_reload_json_lines() {
        let store = populated_store();
        let dir = tempdir().unwrap();
        let path = dir.path().join("features.jsonl");

        store.save_json_lines(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let reloaded: Vec<FeatureRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(reloaded.len(), store.len());
        for (loaded, original) in reloaded.iter().zip(store.records()) {
            assert_eq!(loaded.timestamp, original.timestamp);
            assert_eq!(loaded.label, original.label);
            assert_eq!(loaded.features.mid_price, original.features.mid_price);
            assert!(
                (loaded.features.rolling_volatility - original.features.rolling_volatility).abs()
                    < 1e-12
            );
        }
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("features.jsonl");
        fs::write(&path, "stale\nstale\nstale\n").unwrap();

        FeatureStore::new().save_json_lines(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("features.jsonl");

        let err = populated_store().save_json_lines(&path).unwrap_err();
        match err {
            PipelineError::Io { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processor.json");
        fs::write(
            &path,
            r#"{ "mode": "replay", "snapshot_interval_ms": 250, "features": { "depth": 5 } }"#,
        )
        .unwrap();

        let config = ProcessorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.mode, ProcessingMode::Replay);
        assert_eq!(config.snapshot_interval_ms, 250);
        assert_eq!(config.features.depth, 5);
        assert_eq!(config.features.window, 50);
    }
}
