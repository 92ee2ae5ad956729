//! Pipeline progress log, echoed to the terminal and streamed over SSE.
//!
//! Every stage reports through the `log_*` helpers; the HTTP server exposes
//! the same entries at `/api/logs` so a dashboard can show live progress.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::LOG_CHANNEL_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(&self) -> &'static str {
        match self {
            LogLevel::Info => "  ",
            LogLevel::Success => "  ✓",
            LogLevel::Warning => "  ⚠️",
            LogLevel::Error => "  ❌",
        }
    }
}

/// One progress line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth under the previous stage line.
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Terminal rendering of the entry.
    pub fn render(&self) -> String {
        format!(
            "{}{} {}",
            "   ".repeat(self.indent as usize),
            self.level.marker(),
            self.message
        )
    }
}

/// Process-wide log channel.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans log entries out to stderr and every SSE subscriber.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(LOG_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn log(&self, entry: LogEntry) {
        // stdout is reserved for report output
        eprintln!("{}", entry.render());
        let _ = self.sender.send(entry);
    }

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
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}
