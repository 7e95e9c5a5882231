use crate::context;
use crate::entry::Formatter;
use crate::record::{Level, LogRecord};
use crate::shipper::Shipper;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`Shipper`].
///
/// The layer forwards every event routed to it; level filtering belongs
/// to the subscriber composition, not here. Appending may flush inline,
/// so the emitting thread pays for the push when a batch threshold is
/// crossed. Nothing on this path can fail the caller: formatting cannot
/// error and the shipper swallows delivery failures.
pub struct LokiLayer {
    formatter: Formatter,
    shipper: Arc<Shipper>,
}

impl LokiLayer {
    pub fn new(shipper: Arc<Shipper>, app: impl Into<String>) -> Self {
        LokiLayer {
            formatter: Formatter::new(app),
            shipper,
        }
    }

    pub fn shipper(&self) -> &Arc<Shipper> {
        &self.shipper
    }
}

impl<S> Layer<S> for LokiLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        // Events that did not carry ids pick them up from the ambient
        // request context, when one is installed.
        if !fields.contains_key("request_id") {
            if let Some(id) = context::get_request_id() {
                fields.insert("request_id".to_string(), serde_json::Value::String(id));
            }
        }
        if !fields.contains_key("user_id") {
            if let Some(id) = context::get_user_id() {
                fields.insert("user_id".to_string(), serde_json::Value::String(id));
            }
        }

        let meta = event.metadata();
        let record = LogRecord {
            timestamp: Utc::now(),
            level: Level::from(meta.level()),
            module_path: meta.module_path().map(|s| s.to_string()),
            fields,
            message,
        };

        self.shipper.append(self.formatter.format(&record));
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The format message of an event arrives here, not in record_str.
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(format!("{:?}", value)),
            );
        }
    }
}
