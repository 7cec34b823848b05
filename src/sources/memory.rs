use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::LogSource;
use crate::error::SourceError;
use crate::model::{
    EntrySource, HistoryPage, LogEntry, LogLevel, RequestLogRecord, RequestStatus, now_millis,
};

/// Handle for a request that is still pending in a `MemorySource`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket(u64);

#[derive(Default)]
struct Store {
    next_ticket: u64,
    pending: Vec<(RequestTicket, RequestLogRecord)>,
    /// Newest first
    history: VecDeque<RequestLogRecord>,
    /// Ordered by timestamp, insertion order among equal timestamps
    console: Vec<LogEntry>,
}

impl Store {
    fn insert_console(&mut self, entry: LogEntry) {
        let at = self.console.partition_point(|e| e.timestamp <= entry.timestamp);
        self.console.insert(at, entry);
    }
}

/// An in-process log source.
///
/// Behaves like the log server: requests start pending and move to the front
/// of the history when they complete, and the console stream merges remote
/// and uploaded local entries by timestamp.
#[derive(Default)]
pub struct MemorySource {
    store: Mutex<Store>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a request that has just started
    pub fn begin_request(&self, timestamp: i64, model: &str, character: &str) -> RequestTicket {
        let mut store = self.store();
        let ticket = RequestTicket(store.next_ticket);
        store.next_ticket += 1;
        store.pending.push((
            ticket,
            RequestLogRecord {
                timestamp,
                model: model.to_string(),
                character: character.to_string(),
                response_time_ms: None,
                status: RequestStatus::Pending,
            },
        ));
        ticket
    }

    /// Finish a pending request. Returns false if the ticket is unknown
    /// or was already completed.
    pub fn complete_request(&self, ticket: RequestTicket, success: bool, response_time_ms: u64) -> bool {
        let mut store = self.store();
        let Some(idx) = store.pending.iter().position(|(t, _)| *t == ticket) else {
            return false;
        };
        let (_, mut record) = store.pending.remove(idx);
        record.status = if success {
            RequestStatus::Success
        } else {
            RequestStatus::Error
        };
        record.response_time_ms = Some(response_time_ms);
        store.history.push_front(record);
        true
    }

    /// Add an entry produced on the server side
    pub fn push_remote(&self, timestamp: i64, level: LogLevel, message: impl Into<String>) {
        self.store()
            .insert_console(LogEntry::new(timestamp, EntrySource::Remote, level, message));
    }

    pub fn pending_len(&self) -> usize {
        self.store().pending.len()
    }

    pub fn history_len(&self) -> usize {
        self.store().history.len()
    }

    pub fn console_len(&self) -> usize {
        self.store().console.len()
    }
}

#[async_trait::async_trait]
impl LogSource for MemorySource {
    async fn fetch_pending(&self) -> Result<Vec<RequestLogRecord>, SourceError> {
        Ok(self.store().pending.iter().map(|(_, r)| r.clone()).collect())
    }

    async fn fetch_historical(&self, offset: usize, limit: usize) -> Result<HistoryPage, SourceError> {
        let store = self.store();
        let total = store.history.len();
        let entries: Vec<_> = store.history.iter().skip(offset).take(limit).cloned().collect();
        let has_more = offset + entries.len() < total;
        Ok(HistoryPage {
            entries,
            total: total as u64,
            has_more,
        })
    }

    async fn purge_historical(&self) -> Result<(), SourceError> {
        self.store().history.clear();
        Ok(())
    }

    async fn fetch_tail(&self, since: i64) -> Result<Vec<LogEntry>, SourceError> {
        let store = self.store();
        let start = store.console.partition_point(|e| e.timestamp <= since);
        Ok(store.console[start..].to_vec())
    }

    async fn upload_local(&self, entries: &[LogEntry]) -> Result<(), SourceError> {
        let mut store = self.store();
        for entry in entries {
            store.insert_console(entry.clone());
        }
        Ok(())
    }
}

const DEMO_MODELS: [&str; 3] = ["claude-sonnet", "gpt-4o", "deepseek-chat"];
const DEMO_CHARACTERS: [&str; 4] = ["Seraphina", "Aqua", "Narrator", "Group: Tavern"];

/// Simulated proxy traffic for demo mode.
///
/// Starts a request every step, finishes each one three steps later (every
/// fifth one fails) and writes a remote console line for each transition.
pub fn spawn_demo_traffic(source: Arc<MemorySource>, step: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut in_flight: VecDeque<(RequestTicket, u64)> = VecDeque::new();
        let mut interval = tokio::time::interval(step);
        let mut n: u64 = 0;

        loop {
            interval.tick().await;
            let now = now_millis();
            let model = DEMO_MODELS[(n % DEMO_MODELS.len() as u64) as usize];
            let character = DEMO_CHARACTERS[(n % DEMO_CHARACTERS.len() as u64) as usize];

            let ticket = source.begin_request(now, model, character);
            source.push_remote(now, LogLevel::Info, format!("-> {} for {}", model, character));
            in_flight.push_back((ticket, n));

            while let Some(&(ticket, started)) = in_flight.front() {
                if n - started < 3 {
                    break;
                }
                in_flight.pop_front();
                let success = started % 5 != 4;
                let elapsed = (n - started) * step.as_millis() as u64 + (started * 37) % 400;
                source.complete_request(ticket, success, elapsed);
                if success {
                    source.push_remote(now_millis(), LogLevel::Info, format!("<- done in {}ms", elapsed));
                } else {
                    source.push_remote(now_millis(), LogLevel::Error, "<- upstream returned 502");
                }
            }

            debug!(
                step = n,
                pending = source.pending_len(),
                history = source.history_len(),
                console = source.console_len(),
                "demo traffic step"
            );
            n += 1;
        }
    })
}
