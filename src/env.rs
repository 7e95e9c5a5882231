/// Environment variable names used by this crate for convenient
/// configuration of the sink from microservices.
///
/// These are purely helpers; the core types remain decoupled from
/// environment access.

/// Loki push URL, e.g. `http://localhost:3100/loki/api/v1/push`.
pub const LOKI_SINK_URL_ENV: &str = "LOKI_SINK_URL";

/// Value of the constant `app` label.
pub const LOKI_SINK_APP_ENV: &str = "LOKI_SINK_APP";

/// Batch size that triggers a flush.
pub const LOKI_SINK_BATCH_SIZE_ENV: &str = "LOKI_SINK_BATCH_SIZE";

/// Quiet period in seconds after which the next append flushes.
pub const LOKI_SINK_FLUSH_SECS_ENV: &str = "LOKI_SINK_FLUSH_SECS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
