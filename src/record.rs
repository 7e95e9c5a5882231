use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Severity of a [`LogRecord`], normalized to the four labels Loki
/// queries are usually written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    /// Lowercase label value used in the `level` stream label.
    pub fn as_label(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        if *level == tracing::Level::ERROR {
            Level::Error
        } else if *level == tracing::Level::WARN {
            Level::Warning
        } else if *level == tracing::Level::INFO {
            Level::Info
        } else {
            // TRACE and DEBUG both land on the "debug" label.
            Level::Debug
        }
    }
}

/// One application log event, as captured at the emitting call site.
///
/// `timestamp` is the creation time of the record. Shipped entries are
/// stamped again at format time; see `Formatter::format`.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub module_path: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_levels_map_to_labels() {
        assert_eq!(Level::from(&tracing::Level::ERROR).as_label(), "error");
        assert_eq!(Level::from(&tracing::Level::WARN).as_label(), "warning");
        assert_eq!(Level::from(&tracing::Level::INFO).as_label(), "info");
        assert_eq!(Level::from(&tracing::Level::DEBUG).as_label(), "debug");
        assert_eq!(Level::from(&tracing::Level::TRACE).as_label(), "debug");
    }

    #[test]
    fn default_level_is_info() {
        assert_eq!(Level::default(), Level::Info);
    }
}
