use lob_microstructure::labeling::{Label, LabelConfig};
use lob_microstructure::orderbook::{BookEvent, BookEventListener, BookEventType, Side};
use lob_microstructure::pipeline::{
    PipelineError, ProcessingMode, Processor, ProcessorConfig, StreamMessage, Update, channel,
};
use lob_microstructure::sink::FeatureStore;
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: ProcessingMode, horizon_ms: u64) -> ProcessorConfig {
        ProcessorConfig {
            mode,
            labels: LabelConfig {
                horizon_ms,
                ..LabelConfig::default()
            },
            ..ProcessorConfig::default()
        }
    }

    /// One bucket per second, each a full two-level book around `mids[k]`.
    fn quoted_buckets(mids: &[f64]) -> Vec<Update> {
        mids.iter()
            .enumerate()
            .flat_map(|(k, &mid)| {
                let ts = k as u64 * 1_000;
                [
                    Update::new(ts, Side::Bid, mid - 0.5, 1.0),
                    Update::new(ts + 10, Side::Ask, mid + 0.5, 1.0),
                ]
            })
            .collect()
    }

    fn feed(processor: &mut Processor<FeatureStore>, updates: &[Update]) {
        for update in updates {
            processor.on_update(*update).unwrap();
        }
    }

    #[test]
    fn test_live_mode_accumulates_across_buckets() {
        let mut processor = Processor::new(
            config(ProcessingMode::Live, 5_000),
            FeatureStore::new(),
        )
        .unwrap();

        feed(
            &mut processor,
            &[
                Update::new(1_000, Side::Bid, 99.0, 1.0),
                Update::new(1_100, Side::Ask, 101.0, 1.0),
                Update::new(2_000, Side::Bid, 100.0, 1.0),
            ],
        );
        processor.finalize().unwrap();

        let store = processor.sink();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1_000).unwrap().features.mid_price, 100.0);
        assert_eq!(store.get(2_000).unwrap().features.mid_price, 100.5);
        assert_eq!(processor.book().len(Side::Bid), 2);
    }

    #[test]
    fn test_replay_mode_resets_each_bucket() {
        let mut processor = Processor::new(
            config(ProcessingMode::Replay, 5_000),
            FeatureStore::new(),
        )
        .unwrap();

        feed(
            &mut processor,
            &[
                Update::new(1_000, Side::Bid, 99.0, 1.0),
                Update::new(1_100, Side::Ask, 101.0, 1.0),
                Update::new(2_000, Side::Bid, 100.0, 1.0),
            ],
        );
        processor.finalize().unwrap();

        let stats = processor.stats();
        assert_eq!(stats.buckets_applied, 2);
        assert_eq!(stats.snapshots_emitted, 1);
        assert_eq!(stats.buckets_skipped, 1);
        assert_eq!(processor.sink().len(), 1);
        assert_eq!(processor.book().best_bid(), Some(100.0));
        assert_eq!(processor.book().best_ask(), None);
    }

    #[test]
    fn test_microsecond_timestamps_share_millisecond_buckets() {
        let mut processor = Processor::new(
            config(ProcessingMode::Live, 5_000),
            FeatureStore::new(),
        )
        .unwrap();

        feed(
            &mut processor,
            &[
                Update::new(1_700_000_000_123_456, Side::Bid, 99.0, 1.0),
                Update::new(1_700_000_000_999, Side::Ask, 101.0, 1.0),
            ],
        );
        assert_eq!(processor.current_bucket(), Some(1_700_000_000));
        assert_eq!(processor.pending_updates(), 2);

        processor.finalize().unwrap();
        let record = processor.latest_features().unwrap();
        assert_eq!(record.timestamp, 1_700_000_000_000);
        assert!(processor.sink().get(1_700_000_000_000).is_some());
    }

    #[test]
    fn test_rising_mid_labels_up_after_horizon() {
        let mut processor = Processor::new(
            config(ProcessingMode::Replay, 2_000),
            FeatureStore::new(),
        )
        .unwrap();

        feed(
            &mut processor,
            &quoted_buckets(&[100.0, 101.0, 102.0, 103.0, 104.0]),
        );
        processor.finalize().unwrap();

        let store = processor.sink();
        assert_eq!(store.len(), 5);
        for ts in [0, 1_000, 2_000] {
            assert_eq!(store.get(ts).unwrap().label, Some(Label::Up), "ts {ts}");
        }
        for ts in [3_000, 4_000] {
            assert_eq!(store.get(ts).unwrap().label, None, "ts {ts}");
        }

        let stats = processor.stats();
        assert_eq!(stats.labels_emitted, 3);
        assert_eq!(stats.labels_unmatched, 0);
    }

    #[test]
    fn test_falling_and_flat_labels() {
        let mut processor = Processor::new(
            config(ProcessingMode::Replay, 1_000),
            FeatureStore::new(),
        )
        .unwrap();

        feed(&mut processor, &quoted_buckets(&[100.0, 99.0, 99.0]));
        processor.finalize().unwrap();

        let store = processor.sink();
        assert_eq!(store.get(0).unwrap().label, Some(Label::Down));
        assert_eq!(store.get(1_000).unwrap().label, Some(Label::Flat));
        assert_eq!(store.get(2_000).unwrap().label, None);
    }

    #[test]
    fn test_zero_horizon_label_precedes_its_record() {
        let mut processor = Processor::new(
            config(ProcessingMode::Replay, 0),
            FeatureStore::new(),
        )
        .unwrap();

        feed(&mut processor, &quoted_buckets(&[100.0, 101.0, 102.0]));
        processor.finalize().unwrap();

        let stats = processor.stats();
        assert_eq!(stats.labels_emitted, 3);
        assert_eq!(stats.labels_unmatched, 3);
        assert_eq!(processor.sink().labeled_records().count(), 0);
    }

    #[test]
    fn test_event_listener_receives_diffs() {
        let seen: Arc<Mutex<Vec<BookEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: BookEventListener = Arc::new(move |events: &[BookEvent]| {
            sink.lock().unwrap().extend_from_slice(events);
        });

        let mut processor = Processor::new(
            config(ProcessingMode::Live, 5_000),
            FeatureStore::new(),
        )
        .unwrap()
        .with_event_listener(listener);

        feed(
            &mut processor,
            &[
                Update::new(1_000, Side::Bid, 99.0, 1.0),
                Update::new(1_000, Side::Ask, 101.0, 1.0),
                Update::new(2_000, Side::Bid, 99.0, 2.0),
                Update::new(2_000, Side::Ask, 102.0, 1.0),
            ],
        );

        // First bucket has nothing to diff against
        assert!(seen.lock().unwrap().is_empty());

        processor.finalize().unwrap();
        let mut events = seen.lock().unwrap().clone();
        events.sort_by(|a, b| a.price.total_cmp(&b.price));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, BookEventType::Modify);
        assert_eq!(events[0].prev_qty, 1.0);
        assert_eq!(events[0].new_qty, 2.0);
        assert_eq!(events[1].event_type, BookEventType::Add);
        assert_eq!(events[1].side, Side::Ask);
        assert!(events.iter().all(|e| e.timestamp == 2_000));
        assert_eq!(processor.stats().events_inferred, 2);
    }

    #[test]
    fn test_crossed_update_is_sanitized_in_bucket() {
        let mut processor = Processor::new(
            config(ProcessingMode::Live, 5_000),
            FeatureStore::new(),
        )
        .unwrap();

        feed(
            &mut processor,
            &[
                Update::new(1_000, Side::Bid, 101.0, 1.0),
                Update::new(1_000, Side::Ask, 100.0, 1.0),
                Update::new(1_000, Side::Ask, 102.0, 1.0),
            ],
        );
        processor.finalize().unwrap();

        let features = processor.latest_features().unwrap().features;
        assert_eq!(features.best_bid, 101.0);
        assert_eq!(features.best_ask, 102.0);
    }

    #[tokio::test]
    async fn test_run_until_end_of_stream() {
        let (tx, rx) = channel(16);
        for update in quoted_buckets(&[100.0, 100.0]) {
            tx.send(StreamMessage::Update(update)).await.unwrap();
        }
        tx.send(StreamMessage::EndOfStream).await.unwrap();

        let mut processor = Processor::new(
            config(ProcessingMode::Replay, 5_000),
            FeatureStore::new(),
        )
        .unwrap();
        let stats = processor.run(rx).await.unwrap();

        assert_eq!(stats.updates_processed, 4);
        assert_eq!(stats.snapshots_emitted, 2);
        assert!(matches!(
            processor.on_update(Update::new(9_000, Side::Bid, 1.0, 1.0)),
            Err(PipelineError::Finalized)
        ));
    }

    #[tokio::test]
    async fn test_run_treats_closed_channel_as_end() {
        let (tx, rx) = channel(16);
        tx.send(Update::new(1_000, Side::Bid, 99.0, 1.0).into())
            .await
            .unwrap();
        tx.send(Update::new(1_000, Side::Ask, f64::INFINITY, 1.0).into())
            .await
            .unwrap();
        tx.send(Update::new(1_000, Side::Ask, 101.0, 1.0).into())
            .await
            .unwrap();
        drop(tx);

        let mut processor = Processor::new(
            config(ProcessingMode::Live, 5_000),
            FeatureStore::new(),
        )
        .unwrap();
        let stats = processor.run(rx).await.unwrap();

        assert_eq!(stats.updates_processed, 2);
        assert_eq!(stats.updates_rejected, 1);
        assert_eq!(processor.into_sink().len(), 1);
    }
}
