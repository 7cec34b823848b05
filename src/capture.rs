//! Local diagnostic capture.
//!
//! `CaptureLayer` is a tracing layer that copies matching events into an
//! `UploadBuffer`, from where the tail poller ships them to the log source on
//! its next tick.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use regex::Regex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::model::{LogEntry, LogLevel};

/// Entries waiting to be uploaded, shared between the capture layer and the
/// tail poller
#[derive(Clone, Default)]
pub struct UploadBuffer {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl UploadBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, entry: LogEntry) {
        self.lock().push(entry);
    }

    /// Record a locally generated message right away
    pub fn capture(&self, message: impl Into<String>, level: LogLevel) {
        self.push(LogEntry::local_now(level, message));
    }

    /// Take everything buffered so far
    pub fn take(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.lock())
    }

    /// Put back entries whose upload failed, ahead of anything captured since
    pub fn restore(&self, mut entries: Vec<LogEntry>) {
        let mut buffered = self.lock();
        entries.append(&mut buffered);
        *buffered = entries;
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }
}

/// Decides which event targets count as capture tags
#[derive(Clone, Debug)]
pub struct TagMatcher {
    /// The pattern string
    pub pattern: String,
    /// Compiled regex, None if the pattern is not a valid regex
    compiled: Option<Regex>,
}

impl TagMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let compiled = Regex::new(&pattern).ok();
        Self { pattern, compiled }
    }

    pub fn is_regex(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn matches(&self, target: &str) -> bool {
        match &self.compiled {
            Some(regex) => regex.is_match(target),
            // Invalid regex, treat as case-insensitive substring match
            None => target.to_lowercase().contains(&self.pattern.to_lowercase()),
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

impl MessageVisitor {
    fn into_text(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

/// Tracing layer feeding tagged INFO/WARN/ERROR events into an `UploadBuffer`
pub struct CaptureLayer {
    buffer: UploadBuffer,
    tags: TagMatcher,
}

impl CaptureLayer {
    pub fn new(buffer: UploadBuffer, tags: TagMatcher) -> Self {
        Self { buffer, tags }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        // Level ordering is by verbosity: DEBUG and TRACE are "greater"
        if *meta.level() > Level::INFO || !self.tags.matches(meta.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.buffer
            .capture(visitor.into_text(), LogLevel::from_tracing(meta.level()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntrySource;
    use tracing_subscriber::prelude::*;

    fn entry(ts: i64, msg: &str) -> LogEntry {
        LogEntry::new(ts, EntrySource::Local, LogLevel::Info, msg)
    }

    #[test]
    fn test_take_empties_buffer() {
        let buffer = UploadBuffer::new();
        buffer.push(entry(1, "a"));
        buffer.push(entry(2, "b"));

        let taken = buffer.take();
        assert_eq!(taken.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_restore_goes_in_front() {
        let buffer = UploadBuffer::new();
        buffer.push(entry(1, "a"));
        buffer.push(entry(2, "b"));
        let taken = buffer.take();

        // Captured while the failed upload was in flight
        buffer.push(entry(3, "c"));
        buffer.restore(taken);

        let messages: Vec<_> = buffer.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_capture_is_local() {
        let buffer = UploadBuffer::new();
        buffer.capture("proxy restarted", LogLevel::Warning);
        let entries = buffer.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, EntrySource::Local);
        assert_eq!(entries[0].level, LogLevel::Warning);
        assert!(entries[0].timestamp > 0);
    }

    #[test]
    fn test_tag_matcher_regex() {
        let matcher = TagMatcher::new("^diag");
        assert!(matcher.is_regex());
        assert!(matcher.matches("diag"));
        assert!(matcher.matches("diag::proxy"));
        assert!(!matcher.matches("relaylog::tail"));
    }

    #[test]
    fn test_tag_matcher_invalid_regex_falls_back() {
        let matcher = TagMatcher::new("[Proxy");
        assert!(!matcher.is_regex());
        assert!(matcher.matches("ui[proxy"));
        assert!(!matcher.matches("other"));
    }

    #[test]
    fn test_layer_captures_tagged_events() {
        let buffer = UploadBuffer::new();
        let subscriber = tracing_subscriber::registry()
            .with(CaptureLayer::new(buffer.clone(), TagMatcher::new("^diag")));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "diag", "settings loaded");
            tracing::warn!(target: "diag", port = 5501, "port changed");
            tracing::error!(target: "diag", "import failed");
            tracing::debug!(target: "diag", "too chatty");
            tracing::info!(target: "relaylog::tail", "not tagged");
        });

        let entries = buffer.snapshot();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "settings loaded");
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[1].message, "port changed port=5501");
        assert_eq!(entries[1].level, LogLevel::Warning);
        assert_eq!(entries[2].level, LogLevel::Error);
    }
}
