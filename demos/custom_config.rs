use std::time::{Duration, Instant};
use tracing::info;

use tracing_loki_sink::init::{init_tracing_with_config, LayerConfig};
use tracing_loki_sink::loki::LokiConfig;

fn main() {
    let loki = LokiConfig {
        app: "loki-sink-demo".to_string(),
        timeout: Duration::from_secs(1),
        ..LokiConfig::default()
    };

    let layer_config = LayerConfig {
        batch_size: 100,
        flush_interval: Duration::from_millis(200),
        enable_stdout: false,
    };

    let guard = init_tracing_with_config(loki, layer_config);

    let n: u64 = 10_000;
    let start = Instant::now();

    for i in 0..n {
        info!(iteration = i, "custom config load event");
    }

    let elapsed = start.elapsed();
    println!(
        "custom config: emitted {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    guard.close();

    let stats = guard.shipper().stats();
    println!(
        "shipped {} batches, {} failed",
        stats.shipped_batches, stats.failed_batches
    );
}
