// demos/src/bin/synthetic_live.rs
//
// Simulates a live exchange feed: a client task emits depth-diff messages
// every 100ms in the exchange wire format, a producer flattens them onto the
// bounded queue and the processor accumulates them in live mode. Inferred
// book events are counted through an event listener.
//
// Stop with ctrl-c, or let it end after DEMO_SECONDS (default 15). Either
// way the producer sends end-of-stream and the last bucket is flushed.
//
// Run this demo with:
//   cargo run --bin synthetic_live

use demos::{round_tick, setup_logger};
use lob_microstructure::current_time_millis;
use lob_microstructure::orderbook::{BookEvent, BookEventListener, BookEventType};
use lob_microstructure::pipeline::{
    BatchedSource, DepthUpdateMessage, PipelineError, ProcessingMode, Processor,
    ProcessorConfig, Shutdown, Update, channel, run_producer, shutdown_pair,
};
use lob_microstructure::sink::FeatureStore;
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const TICK_MS: u64 = 100;
const LEVELS: usize = 5;

#[tokio::main]
async fn main() {
    setup_logger();
    if let Err(err) = run().await {
        error!(error = %err, "live demo failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PipelineError> {
    let seconds = env::var("DEMO_SECONDS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(15);

    let mut config = ProcessorConfig::with_mode(ProcessingMode::Live);
    config.labels.horizon_ms = 2_000;
    config.progress_log_interval = 5;

    let (batch_tx, source) = BatchedSource::channel(64);
    let (tx, rx) = channel(config.queue_capacity);
    let (handle, shutdown) = shutdown_pair();

    let client = tokio::spawn(synthetic_client(batch_tx, handle.subscribe()));
    let producer = tokio::spawn(run_producer(source, tx, shutdown));

    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!(error = %err, "ctrl-c handler failed");
                }
                info!("ctrl-c received, shutting down");
            }
            _ = tokio::time::sleep(Duration::from_secs(seconds)) => {
                info!(seconds, "demo duration reached, shutting down");
            }
        }
        handle.shutdown();
    });

    let adds = Arc::new(AtomicU64::new(0));
    let modifies = Arc::new(AtomicU64::new(0));
    let cancels = Arc::new(AtomicU64::new(0));
    let listener: BookEventListener = {
        let (adds, modifies, cancels) = (adds.clone(), modifies.clone(), cancels.clone());
        Arc::new(move |events: &[BookEvent]| {
            for event in events {
                let counter = match event.event_type {
                    BookEventType::Add => &adds,
                    BookEventType::Modify => &modifies,
                    BookEventType::Cancel => &cancels,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let mut processor =
        Processor::new(config, FeatureStore::new())?.with_event_listener(listener);
    let stats = processor.run(rx).await?;

    if let Ok(report) = producer.await {
        info!(
            sent = report.updates_sent,
            batches = report.batches,
            exit = ?report.exit,
            "producer stopped"
        );
    }
    if let Ok(messages) = client.await {
        info!(messages, "client stopped");
    }

    info!(
        updates = stats.updates_processed,
        snapshots = stats.snapshots_emitted,
        labels = stats.labels_emitted,
        adds = adds.load(Ordering::Relaxed),
        modifies = modifies.load(Ordering::Relaxed),
        cancels = cancels.load(Ordering::Relaxed),
        "live session complete"
    );
    let depth = processor.book().depth(3);
    info!(bids = ?depth.bids, asks = ?depth.asks, "final top of book");

    let store_stats = processor.sink().stats();
    info!(
        records = store_stats.total_records,
        labeled = store_stats.labeled_records,
        "feature store"
    );
    Ok(())
}

/// Emits exchange-format depth diffs until shutdown. Returns messages sent.
async fn synthetic_client(
    tx: mpsc::Sender<Vec<Update>>,
    mut shutdown: Shutdown,
) -> u64 {
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
    let mut sequence = 0u64;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }
        sequence += 1;

        let raw = depth_message_json(current_time_millis(), sequence);
        let message: DepthUpdateMessage = match serde_json::from_str(&raw) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "malformed depth message skipped");
                continue;
            }
        };
        debug!(sequence, bids = message.bids.len(), asks = message.asks.len(), "depth message");

        if tx.send(message.to_updates()).await.is_err() {
            break;
        }
    }
    sequence
}

/// Build one depth-diff message. The mid oscillates; one level per side is
/// removed every third message so cancels show up in the event stream.
fn depth_message_json(event_time: u64, sequence: u64) -> String {
    let phase = sequence as f64 / 25.0;
    let mid = 100.0 + phase.sin() * 0.5;

    let side_levels = |sign: f64| -> Vec<[String; 2]> {
        (0..LEVELS)
            .map(|level| {
                let price = round_tick(mid + sign * (0.05 + level as f64 * 0.1));
                let removed = sequence % 3 == 0 && level == (sequence as usize / 3) % LEVELS;
                let quantity = if removed {
                    0.0
                } else {
                    1.0 + ((sequence as usize + level) % 5) as f64
                };
                [format!("{price:.2}"), format!("{quantity:.3}")]
            })
            .collect()
    };

    serde_json::json!({
        "e": "depthUpdate",
        "E": event_time,
        "s": "SYNUSD",
        "U": sequence,
        "u": sequence,
        "b": side_levels(-1.0),
        "a": side_levels(1.0),
    })
    .to_string()
}
