use crate::entry::{BatchEntry, PushRequest};
use crate::env::{env_or, LOKI_SINK_APP_ENV, LOKI_SINK_URL_ENV};
use crate::transport::{LokiTransport, ShipError};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

/// Default push URL of a locally running Loki.
pub const DEFAULT_PUSH_URL: &str = "http://localhost:3100/loki/api/v1/push";

/// Configuration for [`LokiClient`].
#[derive(Clone, Debug)]
pub struct LokiConfig {
    /// Full push URL, e.g. "http://localhost:3100/loki/api/v1/push".
    pub url: String,
    /// Constant `app` label attached to every stream.
    pub app: String,
    /// Client-side cap on a single push. An unreachable backend blocks
    /// the emitting call site for at most this long.
    pub timeout: Duration,
}

impl Default for LokiConfig {
    fn default() -> Self {
        LokiConfig {
            url: DEFAULT_PUSH_URL.to_string(),
            app: "unnamed-service".to_string(),
            timeout: Duration::from_secs(3),
        }
    }
}

impl LokiConfig {
    /// Build a config from `LOKI_SINK_URL` / `LOKI_SINK_APP`, falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = LokiConfig::default();
        LokiConfig {
            url: env_or(LOKI_SINK_URL_ENV, &defaults.url),
            app: env_or(LOKI_SINK_APP_ENV, &defaults.app),
            timeout: defaults.timeout,
        }
    }
}

/// Loki implementation of [`LokiTransport`] using the HTTP push API.
#[derive(Clone)]
pub struct LokiClient {
    client: Client,
    config: LokiConfig,
}

impl LokiClient {
    /// Construct a new client using the provided configuration.
    ///
    /// Fails only if the underlying HTTP client cannot be built. Create
    /// the client at startup, before any async runtime is entered; the
    /// blocking reqwest client is not usable from inside one.
    pub fn new(config: LokiConfig) -> Result<Self, ShipError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(LokiClient { client, config })
    }

    pub fn config(&self) -> &LokiConfig {
        &self.config
    }
}

impl LokiTransport for LokiClient {
    fn push(&self, batch: &[BatchEntry]) -> Result<(), ShipError> {
        let body = serde_json::to_vec(&PushRequest::from_batch(batch))?;
        let resp = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            let body = resp.text().unwrap_or_else(|_| "<no body>".to_string());
            Err(ShipError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Formatter, StreamLabels};
    use httpmock::prelude::*;

    fn entry(message: &str) -> BatchEntry {
        BatchEntry {
            labels: StreamLabels {
                level: "info".to_string(),
                request_id: "req-1".to_string(),
                user_id: "u-1".to_string(),
                module: "checkout".to_string(),
                app: "test-app".to_string(),
            },
            timestamp_nanos: 1_700_000_000_000_000_000,
            message: message.to_string(),
        }
    }

    fn client_for(server: &MockServer) -> LokiClient {
        LokiClient::new(LokiConfig {
            url: server.url("/loki/api/v1/push"),
            app: "test-app".to_string(),
            timeout: Duration::from_secs(2),
        })
        .expect("build client")
    }

    #[test]
    fn push_succeeds_on_204() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/loki/api/v1/push")
                .header("content-type", "application/json");
            then.status(204);
        });

        let client = client_for(&server);
        client.push(&[entry("hello")]).expect("push should succeed");
        mock.assert();
    }

    #[test]
    fn non_204_is_a_status_error_even_when_2xx() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/loki/api/v1/push");
            then.status(200).body("unexpected body");
        });

        let client = client_for(&server);
        match client.push(&[entry("hello")]) {
            Err(ShipError::Status { status, body }) => {
                assert_eq!(status, 200);
                assert_eq!(body, "unexpected body");
            }
            other => panic!("expected status error, got {:?}", other.err()),
        }
    }

    #[test]
    fn server_error_carries_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/loki/api/v1/push");
            then.status(500).body("ingester unavailable");
        });

        let client = client_for(&server);
        match client.push(&[entry("hello")]) {
            Err(ShipError::Status { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected status error, got {:?}", other.err()),
        }
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is a safe bet for a refused connection.
        let client = LokiClient::new(LokiConfig {
            url: "http://127.0.0.1:9/loki/api/v1/push".to_string(),
            app: "test-app".to_string(),
            timeout: Duration::from_millis(500),
        })
        .expect("build client");

        match client.push(&[entry("hello")]) {
            Err(ShipError::Transport(_)) => {}
            other => panic!("expected transport error, got {:?}", other.err()),
        }
    }

    #[test]
    fn formatter_output_round_trips_through_push() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/loki/api/v1/push");
            then.status(204);
        });

        let formatter = Formatter::new("test-app");
        let record = crate::record::LogRecord {
            timestamp: chrono::Utc::now(),
            level: crate::record::Level::Error,
            module_path: None,
            fields: Default::default(),
            message: Some("boom".to_string()),
        };

        let client = client_for(&server);
        client
            .push(&[formatter.format(&record)])
            .expect("push should succeed");
        mock.assert();
    }
}
