//! Records shown by the two views.
//!
//! `LogEntry` is a line of the diagnostic console stream, `RequestLogRecord`
//! is one proxied request. Both serialize with camelCase field names, which is
//! what the log server speaks.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Where a console entry was produced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Local,
    Remote,
}

impl EntrySource {
    pub fn tag(&self) -> &'static str {
        match self {
            EntrySource::Local => "L",
            EntrySource::Remote => "R",
        }
    }
}

/// Severity of a console entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Map a tracing level onto the three console levels
    pub fn from_tracing(level: &tracing::Level) -> Self {
        if *level == tracing::Level::ERROR {
            LogLevel::Error
        } else if *level == tracing::Level::WARN {
            LogLevel::Warning
        } else {
            LogLevel::Info
        }
    }
}

/// A single console line. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
    pub source: EntrySource,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: i64, source: EntrySource, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            source,
            level,
            message: message.into(),
        }
    }

    /// A local entry stamped with the current wall-clock time
    pub fn local_now(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(now_millis(), EntrySource::Local, level, message)
    }
}

/// Lifecycle of a proxied request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Success,
    Error,
}

impl RequestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Success => "ok",
            RequestStatus::Error => "error",
        }
    }
}

/// One request that went through the proxy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogRecord {
    pub timestamp: i64,
    pub model: String,
    pub character: String,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    pub status: RequestStatus,
}

impl RequestLogRecord {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// A window of the historical request log as reported by the log source
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub entries: Vec<RequestLogRecord>,
    pub total: u64,
    pub has_more: bool,
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Render a millisecond timestamp as local `HH:MM:SS.mmm`
pub fn format_clock(timestamp: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S%.3f").to_string(),
        None => format!("@{}", timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_wire_format() {
        let entry = LogEntry::new(1_700_000_000_000, EntrySource::Remote, LogLevel::Warning, "slow upstream");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["source"], "remote");
        assert_eq!(json["level"], "warning");
        assert_eq!(json["message"], "slow upstream");
    }

    #[test]
    fn test_request_record_camel_case() {
        let raw = r#"{"timestamp":5,"model":"gpt","character":"Alice","responseTimeMs":null,"status":"pending"}"#;
        let record: RequestLogRecord = serde_json::from_str(raw).unwrap();
        assert!(record.is_pending());
        assert_eq!(record.response_time_ms, None);

        let raw = r#"{"timestamp":6,"model":"gpt","character":"Bob","responseTimeMs":812,"status":"success"}"#;
        let record: RequestLogRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.response_time_ms, Some(812));
        assert_eq!(record.status.label(), "ok");
    }

    #[test]
    fn test_history_page_decode() {
        let raw = r#"{"entries":[],"total":12,"hasMore":true}"#;
        let page: HistoryPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.total, 12);
        assert!(page.has_more);
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(LogLevel::from_tracing(&tracing::Level::ERROR), LogLevel::Error);
        assert_eq!(LogLevel::from_tracing(&tracing::Level::WARN), LogLevel::Warning);
        assert_eq!(LogLevel::from_tracing(&tracing::Level::INFO), LogLevel::Info);
        assert_eq!(LogLevel::from_tracing(&tracing::Level::DEBUG), LogLevel::Info);
    }

    #[test]
    fn test_format_clock_invalid() {
        assert_eq!(format_clock(i64::MAX), format!("@{}", i64::MAX));
        assert_eq!(format_clock(0).len(), "00:00:00.000".len());
    }
}
