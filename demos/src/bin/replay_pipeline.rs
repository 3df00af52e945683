// demos/src/bin/replay_pipeline.rs
//
// Replays recorded level updates through the full pipeline in replay mode:
// every one-second bucket is a complete book reconstruction. Prints the
// resulting feature store statistics and optionally writes the rows out.
//
// Input is JSON lines, one update per line:
//   {"timestamp":1700000000000,"side":"bid","price":99.95,"quantity":1.5}
//
// Run this demo with:
//   cargo run --bin replay_pipeline -- [updates.jsonl] [config.json] [out.jsonl]
//
// Without an input file a synthetic two-minute session is replayed.
// Set REPLAY_SPEED to pace the replay (1.0 = real time, default unpaced).

use demos::{sample_replay_updates, setup_logger};
use lob_microstructure::pipeline::{
    PipelineError, ProcessingMode, Processor, ProcessorConfig, ReplaySource, channel,
    run_producer, shutdown_pair,
};
use lob_microstructure::sink::FeatureStore;
use lob_microstructure::current_time_millis;
use std::env;
use std::fs;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    setup_logger();
    if let Err(err) = run().await {
        error!(error = %err, "replay failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PipelineError> {
    let args: Vec<String> = env::args().skip(1).collect();
    let speed = env::var("REPLAY_SPEED")
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(0.0);

    let mut config = match args.get(1) {
        Some(path) => ProcessorConfig::from_json_file(path)?,
        None => ProcessorConfig::default(),
    };
    config.mode = ProcessingMode::Replay;

    let source = match args.first() {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| PipelineError::Io {
                path: path.into(),
                source,
            })?;
            ReplaySource::from_json_lines(&text, speed)?
        }
        None => {
            let start = current_time_millis() / 1_000 * 1_000;
            ReplaySource::new(sample_replay_updates(start, 120, 10), speed)
        }
    };
    info!(updates = source.remaining(), speed, "replay starting");

    let (tx, rx) = channel(config.queue_capacity);
    let (_handle, shutdown) = shutdown_pair();
    let producer = tokio::spawn(run_producer(source, tx, shutdown));

    let mut processor = Processor::new(config, FeatureStore::new())?;
    let stats = processor.run(rx).await?;
    if let Ok(report) = producer.await {
        info!(sent = report.updates_sent, exit = ?report.exit, "producer report");
    }

    let store = processor.into_sink();
    let store_stats = store.stats();
    info!(
        buckets = stats.buckets_applied,
        snapshots = stats.snapshots_emitted,
        skipped = stats.buckets_skipped,
        events = stats.events_inferred,
        "processing complete"
    );
    info!(
        records = store_stats.total_records,
        labeled = store_stats.labeled_records,
        span_ms = store_stats.time_span_ms,
        "feature store"
    );
    for (label, count) in &store_stats.label_distribution {
        info!(%label, count, "label distribution");
    }

    if let Some(record) = store.records().last() {
        if let Ok(json) = serde_json::to_string_pretty(record) {
            info!("latest record:\n{json}");
        }
    }

    if let Some(out) = args.get(2) {
        store.save_json_lines(out)?;
    }
    Ok(())
}
