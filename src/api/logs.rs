//! Real-time log streaming via Server-Sent Events (SSE).
//!
//! Pipeline phases and data-quality findings flow through a broadcast
//! channel that `/api/logs` streams to connected clients; every entry is
//! also echoed to stderr so CLI runs stay readable.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::diagnostics::{Diagnostic, Severity};

/// Log level for client display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Data row the entry is about, when it came from a diagnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            row: None,
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

/// Global log broadcaster.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Send a log entry to all subscribers and echo it to stderr.
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "  ",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️ ",
            LogLevel::Error => "❌ ",
        };
        match entry.row {
            Some(row) => eprintln!("{}row {}: {}", prefix, row, entry.message),
            None => eprintln!("{}{}", prefix, entry.message),
        }

        // no receivers is fine, the CLI never subscribes
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

/// Re-emit a data-quality finding as a log entry, severity mapped to level.
pub fn log_diagnostic(diagnostic: &Diagnostic) {
    let entry = match diagnostic.severity() {
        Severity::Warning => LogEntry::warning(diagnostic.message.clone()),
        Severity::Error => LogEntry::error(diagnostic.message.clone()),
    };
    LOG_BROADCASTER.log(entry.with_row(diagnostic.row_index));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn test_entry_serialization() {
        let entry = LogEntry::warning("selected 3 weeks but paid for 4").with_row(2);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["level"], "warning");
        assert_eq!(json["row"], 2);
        assert!(json["message"].as_str().unwrap().contains("3 weeks"));
        assert!(json.get("timestamp").is_some());

        // row omitted when absent
        let json = serde_json::to_value(LogEntry::info("hi")).unwrap();
        assert!(json.get("row").is_none());
    }

    #[test]
    fn test_broadcast_reaches_subscribers() {
        let broadcaster = LogBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::success("done"));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.message, "done");
        assert!(matches!(received.level, LogLevel::Success));
    }

    #[test]
    fn test_diagnostic_mapping() {
        let diagnostic = Diagnostic {
            row_index: 7,
            kind: DiagnosticKind::CohortUnmatched,
            message: "no cohort matches age 14 (boys)".into(),
        };

        // the global broadcaster is shared with concurrently running tests,
        // so scan for our entry instead of expecting it first
        let mut rx = LOG_BROADCASTER.subscribe();
        log_diagnostic(&diagnostic);

        let entry = std::iter::from_fn(|| match rx.try_recv() {
            Ok(entry) => Some(Some(entry)),
            Err(broadcast::error::TryRecvError::Lagged(_)) => Some(None),
            Err(_) => None,
        })
        .flatten()
        .find(|e| e.row == Some(7) && e.message.contains("age 14"))
        .expect("diagnostic entry broadcast");
        assert!(matches!(entry.level, LogLevel::Error));
    }
}
