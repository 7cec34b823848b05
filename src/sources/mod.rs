//! Log source abstraction and implementations.
//!
//! Provides a unified `LogSource` trait with implementations for:
//! - A log server reached over HTTP (`http`)
//! - An in-process store used by demo mode and tests (`memory`)

pub mod http;
pub mod memory;

use crate::error::SourceError;
use crate::model::{HistoryPage, LogEntry, RequestLogRecord};

/// Describes how the log source is configured
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Http { url: String },
    Demo,
}

impl SourceKind {
    pub fn name(&self) -> String {
        match self {
            SourceKind::Http { url } => {
                let trimmed = url
                    .trim_start_matches("http://")
                    .trim_start_matches("https://");
                format!("http:{}", trimmed.split('/').next().unwrap_or(trimmed))
            }
            SourceKind::Demo => "demo".to_string(),
        }
    }
}

/// Result of a connection test
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceHealth {
    pub label: String,
}

/// The remote side both views read from.
///
/// Pending requests are small and always fetched whole; history is paged
/// newest-first; the console stream is merged by the source from remote
/// entries and previously uploaded local ones.
#[async_trait::async_trait]
pub trait LogSource: Send + Sync {
    /// Every request that has started but not finished
    async fn fetch_pending(&self) -> Result<Vec<RequestLogRecord>, SourceError>;

    /// A window of finished requests
    async fn fetch_historical(&self, offset: usize, limit: usize) -> Result<HistoryPage, SourceError>;

    /// Irreversibly delete all finished requests
    async fn purge_historical(&self) -> Result<(), SourceError>;

    /// Console entries strictly newer than `since`, ordered by timestamp
    async fn fetch_tail(&self, since: i64) -> Result<Vec<LogEntry>, SourceError>;

    /// Store locally captured console entries
    async fn upload_local(&self, entries: &[LogEntry]) -> Result<(), SourceError>;

    /// Check that the source is reachable
    async fn health(&self) -> Result<SourceHealth, SourceError> {
        Ok(SourceHealth {
            label: "ok".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_name() {
        let kind = SourceKind::Http {
            url: "http://127.0.0.1:5501/api/plugins/rescue-proxy".to_string(),
        };
        assert_eq!(kind.name(), "http:127.0.0.1:5501");
        assert_eq!(SourceKind::Demo.name(), "demo");
    }
}
