//! Structured logging.
//!
//! JSON lines on stderr; the Spin runtime forwards stderr to the platform
//! log drain. Field order is deterministic (BTreeMap) so log lines diff
//! cleanly between runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A single structured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Component emitting the entry (workload or crate name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

/// Logger with a fixed component name and a minimum level.
#[derive(Debug, Clone)]
pub struct Logger {
    component: Option<String>,
    min_level: LogLevel,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            component: None,
            min_level: LogLevel::Info,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn debug(&self, message: &str) {
        self.event(LogLevel::Debug, message, &[]);
    }

    pub fn info(&self, message: &str) {
        self.event(LogLevel::Info, message, &[]);
    }

    pub fn warn(&self, message: &str) {
        self.event(LogLevel::Warn, message, &[]);
    }

    pub fn error(&self, message: &str) {
        self.event(LogLevel::Error, message, &[]);
    }

    /// Emit a log entry with structured fields.
    pub fn event(&self, level: LogLevel, message: &str, fields: &[(&str, serde_json::Value)]) {
        if level < self.min_level {
            return;
        }
        let entry = LogEntry {
            level,
            message: message.to_string(),
            component: self.component.clone(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        eprintln!("{}", entry.to_json());
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LogEntry {
            level: LogLevel::Warn,
            message: "fetch failed".to_string(),
            component: Some("search-page".to_string()),
            fields: [("offset".to_string(), serde_json::json!(20))]
                .into_iter()
                .collect(),
        };
        let json = entry.to_json();
        assert!(json.contains(r#""level":"warn""#));
        assert!(json.contains(r#""offset":20"#));
        assert!(json.contains(r#""component":"search-page""#));
    }
}
