use crate::record::LogRecord;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Label value used when an event carries no `request_id` field and the
/// ambient request context is empty.
pub const DEFAULT_REQUEST_ID: &str = "no-request-id";
/// Label value used when no user id is known for the event.
pub const DEFAULT_USER_ID: &str = "anonymous";
/// Label value used when the emitting module cannot be determined.
pub const DEFAULT_MODULE: &str = "unknown";

/// Fixed label set attached to every shipped entry.
///
/// Loki indexes these five labels; everything else about the event lives
/// in the message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamLabels {
    pub level: String,
    pub request_id: String,
    pub user_id: String,
    pub module: String,
    pub app: String,
}

/// A formatted entry awaiting delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub labels: StreamLabels,
    pub timestamp_nanos: i64,
    pub message: String,
}

/// Turns [`LogRecord`]s into [`BatchEntry`]s with the constant `app`
/// label baked in. Pure transformation apart from reading the clock.
#[derive(Debug, Clone)]
pub struct Formatter {
    app: String,
}

impl Formatter {
    pub fn new(app: impl Into<String>) -> Self {
        Formatter { app: app.into() }
    }

    /// Format a record for shipping.
    ///
    /// Label extraction applies documented defaults for missing fields.
    /// A message that parses as JSON is re-serialized in canonical form;
    /// anything else passes through verbatim. This never fails.
    pub fn format(&self, record: &LogRecord) -> BatchEntry {
        let labels = StreamLabels {
            level: record.level.as_label().to_string(),
            request_id: field_str(&record.fields, "request_id")
                .unwrap_or_else(|| DEFAULT_REQUEST_ID.to_string()),
            user_id: field_str(&record.fields, "user_id")
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            module: field_str(&record.fields, "module")
                .or_else(|| record.module_path.clone())
                .unwrap_or_else(|| DEFAULT_MODULE.to_string()),
            app: self.app.clone(),
        };

        let message = match &record.message {
            Some(text) => canonicalize_message(text),
            // No message: ship the structured fields themselves.
            None => serde_json::to_string(&record.fields).unwrap_or_default(),
        };

        // Stamped here, at format time, not from the record's own clock.
        let timestamp_nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        BatchEntry {
            labels,
            timestamp_nanos,
            message,
        }
    }
}

fn field_str(fields: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn canonicalize_message(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => value.to_string(),
        Err(_) => text.to_string(),
    }
}

/// Body of a single push request, `{"streams": [...]}` on the wire.
#[derive(Debug, Serialize)]
pub struct PushRequest {
    pub streams: Vec<Stream>,
}

/// One label set with its timestamped values.
#[derive(Debug, Serialize)]
pub struct Stream {
    pub stream: StreamLabels,
    pub values: Vec<[String; 2]>,
}

impl PushRequest {
    /// Build the wire body for a batch: one stream per entry, each with a
    /// single `[nanos-as-string, message]` pair. Entries sharing identical
    /// labels are deliberately not merged.
    pub fn from_batch(batch: &[BatchEntry]) -> Self {
        let streams = batch
            .iter()
            .map(|entry| Stream {
                stream: entry.labels.clone(),
                values: vec![[entry.timestamp_nanos.to_string(), entry.message.clone()]],
            })
            .collect();

        PushRequest { streams }
    }
}
