use crate::env::{env_or, LOKI_SINK_BATCH_SIZE_ENV, LOKI_SINK_FLUSH_SECS_ENV};
use crate::layer::LokiLayer;
use crate::shipper::{BatchConfig, Shipper};
use crate::transport::LokiTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the batching layer.
///
/// **Fields**
/// - `batch_size`: number of buffered entries that triggers a flush.
/// - `flush_interval`: quiet period after which the next event flushes
///   whatever has accumulated, full batch or not.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top so events also land on the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        LayerConfig {
            batch_size: 10,
            flush_interval: Duration::from_secs(5),
            enable_stdout: true,
        }
    }
}

impl LayerConfig {
    /// Build a config from `LOKI_SINK_BATCH_SIZE` / `LOKI_SINK_FLUSH_SECS`,
    /// keeping the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = LayerConfig::default();
        let batch_size = env_or(LOKI_SINK_BATCH_SIZE_ENV, "")
            .parse()
            .unwrap_or(defaults.batch_size);
        let flush_interval = env_or(LOKI_SINK_FLUSH_SECS_ENV, "")
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(defaults.flush_interval);

        LayerConfig {
            batch_size,
            flush_interval,
            enable_stdout: defaults.enable_stdout,
        }
    }
}

/// Build a [`LokiLayer`] and its [`Shipper`] without installing anything
/// globally. The handle is what tests and embedding applications use to
/// flush, close and read stats.
pub fn build_layer(
    transport: Arc<dyn LokiTransport>,
    app: impl Into<String>,
    config: &LayerConfig,
) -> (LokiLayer, Arc<Shipper>) {
    let shipper = Arc::new(Shipper::new(
        transport,
        BatchConfig {
            batch_size: config.batch_size,
            flush_interval: config.flush_interval,
        },
    ));
    let layer = LokiLayer::new(Arc::clone(&shipper), app);
    (layer, shipper)
}

/// Owns the shipper behind an installed subscriber and flushes it on
/// shutdown. Keep the guard alive for the life of the application; drop
/// it (or call [`close`](ShipperGuard::close)) to force the final flush.
pub struct ShipperGuard {
    shipper: Arc<Shipper>,
}

impl ShipperGuard {
    /// Flush whatever is pending and seal the shipper. Idempotent.
    pub fn close(&self) {
        self.shipper.close();
    }

    pub fn shipper(&self) -> &Arc<Shipper> {
        &self.shipper
    }
}

impl Drop for ShipperGuard {
    fn drop(&mut self) {
        self.shipper.close();
    }
}

/// Initialize global `tracing` subscriber shipping to Loki, using the
/// provided [`LokiConfig`](crate::loki::LokiConfig) and [`LayerConfig`].
///
/// **Parameters**
/// - `loki`: push endpoint, `app` label and client timeout.
/// - `config`: [`LayerConfig`] controlling batching behavior of the layer.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`LokiLayer`] (and a `fmt`
/// layer when `enable_stdout` is set) as the global default subscriber,
/// so all `tracing` events in the process are observed by the layer.
/// Returns the [`ShipperGuard`] that flushes remaining entries when it
/// goes out of scope.
#[cfg(feature = "http")]
pub fn init_tracing_with_config(
    loki: crate::loki::LokiConfig,
    config: LayerConfig,
) -> ShipperGuard {
    let app = loki.app.clone();
    let client = crate::loki::LokiClient::new(loki).expect("build loki http client");
    let (layer, shipper) = build_layer(Arc::new(client), app, &config);

    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }

    ShipperGuard { shipper }
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`]. This is the recommended entrypoint for
/// typical services.
#[cfg(feature = "http")]
pub fn init_tracing(loki: crate::loki::LokiConfig) -> ShipperGuard {
    init_tracing_with_config(loki, LayerConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoopTransport;

    #[test]
    fn guard_close_is_idempotent_and_seals_the_shipper() {
        let (_layer, shipper) =
            build_layer(Arc::new(NoopTransport), "test-app", &LayerConfig::default());
        let guard = ShipperGuard {
            shipper: Arc::clone(&shipper),
        };

        guard.close();
        guard.close();
        assert!(shipper.is_closed());
    }

    #[test]
    fn default_config_matches_documented_thresholds() {
        let config = LayerConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.flush_interval, Duration::from_secs(5));
    }
}
