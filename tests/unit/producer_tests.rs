use lob_microstructure::orderbook::Side;
use lob_microstructure::pipeline::{
    BatchedSource, ProcessingMode, Processor, ProcessorConfig, ProducerExit, ReplaySource,
    Shutdown, StreamMessage, Update, channel, run_producer, shutdown_pair,
};
use lob_microstructure::sink::FeatureStore;
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(test)]
mod tests {
    use super::*;

    fn updates(n: u64) -> Vec<Update> {
        (0..n)
            .map(|i| {
                let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
                let price = if side == Side::Bid { 99.0 } else { 101.0 };
                Update::new(1_000 + i * 100, side, price, (i + 1) as f64)
            })
            .collect()
    }

    async fn drain(rx: &mut mpsc::Receiver<StreamMessage>) -> Vec<StreamMessage> {
        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            let end = message == StreamMessage::EndOfStream;
            messages.push(message);
            if end {
                break;
            }
        }
        messages
    }

    #[tokio::test]
    async fn test_exhausted_source_ends_with_marker() {
        let (tx, mut rx) = channel(16);
        let report = run_producer(ReplaySource::unpaced(updates(3)), tx, Shutdown::never()).await;

        assert_eq!(report.exit, ProducerExit::Exhausted);
        assert_eq!(report.updates_sent, 3);
        assert_eq!(report.batches, 3);
        assert!(report.end_of_stream_sent);

        let messages = drain(&mut rx).await;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages.last(), Some(&StreamMessage::EndOfStream));
        let sent: Vec<Update> = updates(3);
        for (message, expected) in messages.iter().zip(&sent) {
            assert_eq!(message, &StreamMessage::Update(*expected));
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start_still_sends_marker() {
        let (tx, mut rx) = channel(16);
        let (handle, shutdown) = shutdown_pair();
        handle.shutdown();
        assert!(shutdown.is_shutdown());

        let report = run_producer(ReplaySource::unpaced(updates(5)), tx, shutdown).await;

        assert_eq!(report.exit, ProducerExit::Cancelled);
        assert_eq!(report.updates_sent, 0);
        assert_eq!(rx.recv().await, Some(StreamMessage::EndOfStream));
    }

    #[tokio::test]
    async fn test_cancel_while_blocked_on_full_queue() {
        let (tx, mut rx) = channel(1);
        let (handle, shutdown) = shutdown_pair();
        let producer = tokio::spawn(run_producer(
            ReplaySource::unpaced(updates(10)),
            tx,
            shutdown,
        ));

        // Let the producer fill the queue and block on the second send
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.shutdown();

        let messages = drain(&mut rx).await;
        let report = producer.await.unwrap();

        assert_eq!(report.exit, ProducerExit::Cancelled);
        assert_eq!(report.updates_sent, 1);
        assert!(report.end_of_stream_sent);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], StreamMessage::EndOfStream);
    }

    #[tokio::test]
    async fn test_consumer_gone() {
        let (tx, rx) = channel(4);
        drop(rx);

        let report = run_producer(ReplaySource::unpaced(updates(3)), tx, Shutdown::never()).await;

        assert_eq!(report.exit, ProducerExit::ConsumerClosed);
        assert_eq!(report.updates_sent, 0);
        assert!(!report.end_of_stream_sent);
    }

    #[tokio::test]
    async fn test_batches_are_flattened_in_order() {
        let (batch_tx, source) = BatchedSource::channel(4);
        batch_tx.send(updates(2)).await.unwrap();
        batch_tx.send(updates(3)).await.unwrap();
        drop(batch_tx);

        let (tx, mut rx) = channel(16);
        let report = run_producer(source, tx, Shutdown::never()).await;

        assert_eq!(report.batches, 2);
        assert_eq!(report.updates_sent, 5);

        let messages = drain(&mut rx).await;
        let quantities: Vec<f64> = messages
            .iter()
            .filter_map(|message| match message {
                StreamMessage::Update(update) => Some(update.quantity),
                StreamMessage::EndOfStream => None,
            })
            .collect();
        assert_eq!(quantities, vec![1.0, 2.0, 1.0, 2.0, 3.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_pacing_follows_timestamps() {
        let source = ReplaySource::new(
            vec![
                Update::new(0, Side::Bid, 99.0, 1.0),
                Update::new(4_000, Side::Ask, 101.0, 1.0),
            ],
            2.0,
        );
        let (tx, _rx) = channel(16);

        let start = tokio::time::Instant::now();
        let report = run_producer(source, tx, Shutdown::never()).await;

        assert_eq!(report.updates_sent, 2);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_pacing_sleep() {
        // One hour gap between the two updates at real-time speed
        let source = ReplaySource::new(
            vec![
                Update::new(0, Side::Bid, 99.0, 1.0),
                Update::new(3_600_000, Side::Ask, 101.0, 1.0),
            ],
            1.0,
        );
        let (tx, mut rx) = channel(16);
        let (handle, shutdown) = shutdown_pair();
        let start = tokio::time::Instant::now();
        let producer = tokio::spawn(run_producer(source, tx, shutdown));

        let first = rx.recv().await;
        assert!(matches!(first, Some(StreamMessage::Update(_))));

        // The producer is now suspended in the pacing sleep
        handle.shutdown();

        assert_eq!(rx.recv().await, Some(StreamMessage::EndOfStream));
        let report = producer.await.unwrap();

        assert_eq!(report.exit, ProducerExit::Cancelled);
        assert_eq!(report.updates_sent, 1);
        assert!(report.end_of_stream_sent);
        assert!(start.elapsed() < Duration::from_secs(3_600));
    }

    #[tokio::test]
    async fn test_producer_feeds_processor_end_to_end() {
        let config = ProcessorConfig::with_mode(ProcessingMode::Live);
        let (tx, rx) = channel(config.queue_capacity);
        let (_handle, shutdown) = shutdown_pair();

        let producer = tokio::spawn(run_producer(
            ReplaySource::unpaced(updates(40)),
            tx,
            shutdown,
        ));
        let mut processor = Processor::new(config, FeatureStore::new()).unwrap();
        let stats = processor.run(rx).await.unwrap();
        let report = producer.await.unwrap();

        assert_eq!(report.updates_sent, 40);
        assert_eq!(stats.updates_processed, 40);
        // 40 updates 100ms apart span buckets 1 through 4
        assert_eq!(stats.buckets_applied, 4);
        assert_eq!(processor.sink().len(), 4);
    }
}
