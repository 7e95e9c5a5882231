use tracing::{error, info};
use uuid::Uuid;

use tracing_loki_sink::context;
use tracing_loki_sink::init::init_tracing;
use tracing_loki_sink::loki::LokiConfig;

fn main() {
    let guard = init_tracing(LokiConfig {
        app: "loki-sink-demo".to_string(),
        ..LokiConfig::default()
    });

    // Simulate one request's worth of logging.
    context::set_request_id(Uuid::new_v4().to_string());
    context::set_user_id("demo-user");

    info!("request started");
    for i in 0..25 {
        info!(iteration = i, "processing item");
    }
    error!("something went wrong near the end");

    context::clear();
    guard.close();

    let stats = guard.shipper().stats();
    println!(
        "shipped {} batches, {} failed ({} entries total)",
        stats.shipped_batches, stats.failed_batches, stats.total_entries
    );
}
