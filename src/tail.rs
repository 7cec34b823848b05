//! Live tail of the console stream.
//!
//! Each tick flushes locally captured entries to the log source, then pulls
//! everything newer than the cursor into a capped rolling buffer. In follow
//! mode a background task ticks on a fixed period.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::capture::UploadBuffer;
use crate::error::{SourceError, TailError, ensure_invariant};
use crate::model::{LogEntry, LogLevel};
use crate::sources::LogSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TailConfig {
    /// Maximum entries kept in the rolling buffer
    pub capacity: usize,
    pub poll_interval: Duration,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// What the console currently holds
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TailState {
    /// Oldest first, never longer than the configured capacity
    pub rolling_buffer: VecDeque<LogEntry>,
    /// Timestamp of the newest entry seen, 0 before the first fetch
    pub cursor: i64,
    pub follow_enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Applied {
        fetched: usize,
        cursor: i64,
        upload_failed: bool,
    },
    /// Another tick was still running
    Skipped,
    /// Follow was turned off or the buffer cleared while this tick was in flight
    Discarded,
}

/// Scheduled ticks give way to a running tick; manual ones wait for it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TickMode {
    Manual,
    Scheduled,
}

struct TailCore {
    source: Arc<dyn LogSource>,
    uploads: UploadBuffer,
    capacity: usize,
    state: Mutex<TailState>,
    in_flight: tokio::sync::Mutex<()>,
    /// Bumped whenever in-flight results must no longer be applied
    epoch: AtomicU64,
}

impl TailCore {
    fn state(&self) -> MutexGuard<'_, TailState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Must be called with the state lock held so the bump and the state
    /// change are observed together
    fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Upload buffered local entries and hand back what was sent. On
    /// failure the entries are back in the buffer.
    async fn flush_uploads(&self) -> Result<Vec<LogEntry>, SourceError> {
        let batch = self.uploads.take();
        if batch.is_empty() {
            return Ok(batch);
        }
        match self.source.upload_local(&batch).await {
            Ok(()) => {
                debug!(count = batch.len(), "uploaded local console entries");
                Ok(batch)
            }
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), count = batch.len(), "upload of local entries failed, keeping them");
                self.uploads.restore(batch);
                Err(e)
            }
        }
    }

    async fn tick(&self, cursor: Option<i64>, mode: TickMode) -> Result<TickOutcome, TailError> {
        let _running = match mode {
            TickMode::Manual => self.in_flight.lock().await,
            TickMode::Scheduled => match self.in_flight.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    trace!("tail tick skipped, previous one still running");
                    return Ok(TickOutcome::Skipped);
                }
            },
        };

        let (cursor, epoch) = {
            let state = self.state();
            (cursor.unwrap_or(state.cursor), self.epoch.load(Ordering::SeqCst))
        };

        let (uploaded, upload_failed) = match self.flush_uploads().await {
            Ok(batch) => (batch, false),
            Err(_) => (Vec::new(), true),
        };
        // The log source only returns entries newer than the cursor, so
        // anything uploaded at or before it has to be merged locally
        let behind: Vec<LogEntry> = if cursor == 0 {
            Vec::new()
        } else {
            uploaded.into_iter().filter(|e| e.timestamp <= cursor).collect()
        };

        let fetched = match self.source.fetch_tail(cursor).await {
            Ok(fetched) => fetched,
            Err(e) => {
                // Entries already uploaded behind the cursor are not fetched again
                if !behind.is_empty() {
                    let mut state = self.state();
                    if self.epoch.load(Ordering::SeqCst) == epoch {
                        apply_fetched(&mut state, cursor, Vec::new(), behind, self.capacity)?;
                    }
                }
                return Err(TailError::TransientFetch(e));
            }
        };

        let mut state = self.state();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(cursor, "tail response arrived after cancellation, dropped");
            return Ok(TickOutcome::Discarded);
        }

        let count = fetched.len();
        apply_fetched(&mut state, cursor, fetched, behind, self.capacity)?;
        Ok(TickOutcome::Applied {
            fetched: count,
            cursor: state.cursor,
            upload_failed,
        })
    }
}

/// Merge a fetch result into the buffer.
///
/// A zero cursor means cold start: the buffer is replaced, not appended to.
/// `behind` holds entries at or before the cursor that a fetch will never
/// return; they are slotted in by timestamp.
fn apply_fetched(
    state: &mut TailState,
    cursor: i64,
    fetched: Vec<LogEntry>,
    behind: Vec<LogEntry>,
    capacity: usize,
) -> Result<(), TailError> {
    if cursor == 0 {
        state.rolling_buffer = fetched.into();
    } else {
        state.rolling_buffer.extend(fetched);
    }
    for entry in behind {
        let at = state.rolling_buffer.partition_point(|e| e.timestamp <= entry.timestamp);
        state.rolling_buffer.insert(at, entry);
    }

    let excess = state.rolling_buffer.len().saturating_sub(capacity);
    if excess > 0 {
        state.rolling_buffer.drain(..excess);
        trace!(dropped = excess, "trimmed oldest console entries");
    }
    ensure_invariant(state.rolling_buffer.len() <= capacity, "tail buffer over capacity")?;

    state.cursor = state
        .rolling_buffer
        .back()
        .map_or(cursor, |last| last.timestamp.max(cursor));
    Ok(())
}

/// Stops the periodic tick task when cancelled or dropped.
///
/// A tick already running is left to finish; its result is discarded
/// through the epoch check.
pub struct FollowHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FollowHandle {
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for FollowHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

/// The live tail poller
pub struct TailPoller {
    core: Arc<TailCore>,
    poll_interval: Duration,
    follow: Option<FollowHandle>,
}

impl TailPoller {
    pub fn new(source: Arc<dyn LogSource>, uploads: UploadBuffer, config: TailConfig) -> Self {
        Self {
            core: Arc::new(TailCore {
                source,
                uploads,
                capacity: config.capacity.max(1),
                state: Mutex::new(TailState::default()),
                in_flight: tokio::sync::Mutex::new(()),
                epoch: AtomicU64::new(0),
            }),
            poll_interval: config.poll_interval,
            follow: None,
        }
    }

    /// Upload pending local entries, then fetch everything after `cursor`.
    ///
    /// Waits for a tick already in flight rather than overlapping it.
    pub async fn tick(&self, cursor: i64) -> Result<TickOutcome, TailError> {
        self.core.tick(Some(cursor), TickMode::Manual).await
    }

    /// Cold-start reload of the whole buffer
    pub async fn refresh(&self) -> Result<TickOutcome, TailError> {
        self.tick(0).await
    }

    /// Turn follow mode on or off.
    ///
    /// Enabling reloads the buffer once and then ticks every poll interval
    /// from the current cursor. The schedule starts even if the first
    /// reload fails; its error is returned.
    pub async fn set_follow(&mut self, enabled: bool) -> Result<Option<TickOutcome>, TailError> {
        if !enabled {
            self.stop_following();
            return Ok(None);
        }

        self.follow.take();
        self.core.state().follow_enabled = true;

        let first = self.refresh().await;
        if let Err(e) = &first {
            warn!(error = %e, "initial tail refresh failed, polling anyway");
        }
        self.follow = Some(self.spawn_schedule());
        debug!(interval = ?self.poll_interval, "tail follow enabled");
        first.map(Some)
    }

    fn stop_following(&mut self) {
        if let Some(handle) = self.follow.take() {
            handle.cancel();
        }
        let mut state = self.core.state();
        self.core.invalidate();
        state.follow_enabled = false;
        debug!("tail follow disabled");
    }

    fn spawn_schedule(&self) -> FollowHandle {
        let core = Arc::clone(&self.core);
        let period = self.poll_interval;

        let (stop, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = stopped.changed() => break,
                }
                match core.tick(None, TickMode::Scheduled).await {
                    Ok(TickOutcome::Applied { fetched, cursor, .. }) if fetched > 0 => {
                        trace!(fetched, cursor, "scheduled tail tick");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "scheduled tail tick failed"),
                }
            }
        });

        FollowHandle { stop, task }
    }

    pub fn is_following(&self) -> bool {
        self.follow.as_ref().is_some_and(FollowHandle::is_running)
    }

    /// Empty the buffer and rewind the cursor. Buffered uploads are kept.
    pub fn clear(&self) {
        let mut state = self.core.state();
        self.core.invalidate();
        state.rolling_buffer.clear();
        state.cursor = 0;
    }

    /// Queue a locally generated message for the next upload
    pub fn capture_local(&self, message: impl Into<String>, level: LogLevel) {
        self.core.uploads.capture(message, level);
    }

    pub fn pending_uploads(&self) -> usize {
        self.core.uploads.len()
    }

    /// Read the state under its lock
    pub fn with_state<R>(&self, f: impl FnOnce(&TailState) -> R) -> R {
        f(&self.core.state())
    }

    pub fn state(&self) -> TailState {
        self.core.state().clone()
    }

    /// Stop polling and ignore anything still in flight
    pub fn shutdown(&mut self) {
        self.stop_following();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use tokio::sync::Notify;

    use super::*;
    use crate::error::SourceError;
    use crate::model::{EntrySource, HistoryPage, RequestLogRecord};
    use crate::sources::memory::MemorySource;

    /// A `MemorySource` whose calls can be made to fail or to block
    #[derive(Default)]
    struct Controlled {
        inner: MemorySource,
        fail_upload: AtomicBool,
        fail_fetch: AtomicBool,
        empty_tail: AtomicBool,
        gated: AtomicBool,
        gated_upload: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl LogSource for Controlled {
        async fn fetch_pending(&self) -> Result<Vec<RequestLogRecord>, SourceError> {
            self.inner.fetch_pending().await
        }

        async fn fetch_historical(&self, offset: usize, limit: usize) -> Result<HistoryPage, SourceError> {
            self.inner.fetch_historical(offset, limit).await
        }

        async fn purge_historical(&self) -> Result<(), SourceError> {
            self.inner.purge_historical().await
        }

        async fn fetch_tail(&self, since: i64) -> Result<Vec<LogEntry>, SourceError> {
            if self.gated.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable("fetch down".to_string()));
            }
            if self.empty_tail.load(Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            self.inner.fetch_tail(since).await
        }

        async fn upload_local(&self, entries: &[LogEntry]) -> Result<(), SourceError> {
            if self.gated_upload.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.fail_upload.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable("upload down".to_string()));
            }
            self.inner.upload_local(entries).await
        }
    }

    fn poller(source: Arc<Controlled>) -> TailPoller {
        TailPoller::new(source, UploadBuffer::new(), TailConfig::default())
    }

    fn stamps(state: &TailState) -> Vec<i64> {
        state.rolling_buffer.iter().map(|e| e.timestamp).collect()
    }

    #[tokio::test]
    async fn test_tick_from_cursor_appends() {
        let source = Arc::new(Controlled::default());
        source.inner.push_remote(50, LogLevel::Info, "a");
        source.inner.push_remote(100, LogLevel::Info, "b");
        let poller = poller(source.clone());
        poller.refresh().await.unwrap();

        for ts in [101, 105, 110] {
            source.inner.push_remote(ts, LogLevel::Info, "new");
        }
        let outcome = poller.tick(100).await.unwrap();

        assert_eq!(
            outcome,
            TickOutcome::Applied {
                fetched: 3,
                cursor: 110,
                upload_failed: false
            }
        );
        let state = poller.state();
        assert_eq!(state.cursor, 110);
        assert_eq!(stamps(&state), vec![50, 100, 101, 105, 110]);
    }

    #[tokio::test]
    async fn test_empty_fetch_keeps_cursor() {
        let source = Arc::new(Controlled::default());
        let poller = poller(source.clone());
        poller.tick(0).await.unwrap();
        assert_eq!(poller.state().cursor, 0);

        source.inner.push_remote(7, LogLevel::Info, "x");
        poller.tick(0).await.unwrap();
        poller.tick(7).await.unwrap();
        assert_eq!(poller.state().cursor, 7);
    }

    #[tokio::test]
    async fn test_buffer_capped_to_most_recent() {
        let source = Arc::new(Controlled::default());
        for ts in 1..=600 {
            source.inner.push_remote(ts, LogLevel::Info, format!("line {}", ts));
        }
        let poller = poller(source.clone());

        poller.refresh().await.unwrap();
        let state = poller.state();
        assert_eq!(state.rolling_buffer.len(), 500);
        assert_eq!(state.rolling_buffer.front().unwrap().timestamp, 101);
        assert_eq!(state.cursor, 600);

        for ts in 601..=650 {
            source.inner.push_remote(ts, LogLevel::Info, format!("line {}", ts));
        }
        poller.tick(600).await.unwrap();
        let state = poller.state();
        assert_eq!(state.rolling_buffer.len(), 500);
        assert_eq!(stamps(&state), (151..=650).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_zero_cursor_replaces_buffer() {
        let source = Arc::new(Controlled::default());
        for ts in 1..=10 {
            source.inner.push_remote(ts, LogLevel::Info, "x");
        }
        let poller = poller(source.clone());

        poller.tick(0).await.unwrap();
        poller.tick(0).await.unwrap();
        assert_eq!(poller.state().rolling_buffer.len(), 10);

        // Appending from an old cursor duplicates, a cold start does not
        poller.tick(5).await.unwrap();
        assert_eq!(poller.state().rolling_buffer.len(), 15);
        poller.tick(0).await.unwrap();
        assert_eq!(stamps(&poller.state()), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_local_entries_uploaded_then_tailed() {
        let source = Arc::new(Controlled::default());
        let poller = poller(source.clone());

        poller.capture_local("settings saved", LogLevel::Info);
        poller.capture_local("port changed", LogLevel::Warning);
        assert_eq!(poller.pending_uploads(), 2);

        poller.refresh().await.unwrap();
        assert_eq!(poller.pending_uploads(), 0);
        assert_eq!(source.inner.console_len(), 2);

        let state = poller.state();
        assert_eq!(state.rolling_buffer.len(), 2);
        assert!(state.rolling_buffer.iter().all(|e| e.source == EntrySource::Local));
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_entries() {
        let source = Arc::new(Controlled::default());
        source.inner.push_remote(1, LogLevel::Info, "remote");
        source.fail_upload.store(true, Ordering::SeqCst);
        let poller = poller(source.clone());

        poller.capture_local("keep me", LogLevel::Error);
        let outcome = poller.refresh().await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Applied {
                fetched: 1,
                cursor: 1,
                upload_failed: true
            }
        );
        assert_eq!(poller.pending_uploads(), 1);

        source.fail_upload.store(false, Ordering::SeqCst);
        poller.tick(1).await.unwrap();
        assert_eq!(poller.pending_uploads(), 0);
        assert_eq!(source.inner.console_len(), 2);
    }

    #[tokio::test]
    async fn test_upload_retried_after_cursor_moved_on() {
        let source = Arc::new(Controlled::default());
        let poller = poller(source.clone());

        poller.capture_local("local first", LogLevel::Info);
        source.fail_upload.store(true, Ordering::SeqCst);
        let later = crate::model::now_millis() + 5_000;
        source.inner.push_remote(later, LogLevel::Info, "remote later");

        let outcome = poller.refresh().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Applied { upload_failed: true, cursor, .. } if cursor == later));
        assert_eq!(poller.pending_uploads(), 1);

        source.fail_upload.store(false, Ordering::SeqCst);
        poller.tick(later).await.unwrap();

        let state = poller.state();
        let messages: Vec<_> = state.rolling_buffer.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["local first", "remote later"]);
        assert_eq!(state.cursor, later);
        assert_eq!(poller.pending_uploads(), 0);
        assert_eq!(source.inner.console_len(), 2);
    }

    #[tokio::test]
    async fn test_uploaded_entries_kept_when_fetch_fails() {
        let source = Arc::new(Controlled::default());
        let later = crate::model::now_millis() + 5_000;
        source.inner.push_remote(later, LogLevel::Info, "remote later");
        let poller = poller(source.clone());
        poller.refresh().await.unwrap();

        poller.capture_local("sent before the failure", LogLevel::Info);
        source.fail_fetch.store(true, Ordering::SeqCst);
        assert!(poller.tick(later).await.is_err());

        let state = poller.state();
        let messages: Vec<_> = state.rolling_buffer.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["sent before the failure", "remote later"]);
        assert_eq!(state.cursor, later);
        assert_eq!(poller.pending_uploads(), 0);
    }

    #[tokio::test]
    async fn test_empty_cold_start_rewinds_cursor() {
        let source = Arc::new(Controlled::default());
        source.inner.push_remote(7, LogLevel::Info, "x");
        let poller = poller(source.clone());
        poller.refresh().await.unwrap();
        assert_eq!(poller.state().cursor, 7);

        source.empty_tail.store(true, Ordering::SeqCst);
        poller.refresh().await.unwrap();
        let state = poller.state();
        assert!(state.rolling_buffer.is_empty());
        assert_eq!(state.cursor, 0);

        // The next tick from the stored cursor is a cold start again
        source.empty_tail.store(false, Ordering::SeqCst);
        poller.core.tick(None, TickMode::Manual).await.unwrap();
        assert_eq!(stamps(&poller.state()), vec![7]);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state() {
        let source = Arc::new(Controlled::default());
        source.inner.push_remote(3, LogLevel::Info, "a");
        let poller = poller(source.clone());
        poller.refresh().await.unwrap();
        let before = poller.state();

        source.inner.push_remote(4, LogLevel::Info, "b");
        source.fail_fetch.store(true, Ordering::SeqCst);
        let err = poller.tick(3).await.unwrap_err();
        assert!(matches!(err, TailError::TransientFetch(_)));
        assert_eq!(poller.state(), before);
    }

    #[tokio::test]
    async fn test_clear_keeps_uploads() {
        let source = Arc::new(Controlled::default());
        source.inner.push_remote(9, LogLevel::Info, "a");
        let poller = poller(source.clone());
        poller.refresh().await.unwrap();

        poller.capture_local("queued", LogLevel::Info);
        poller.clear();

        let state = poller.state();
        assert!(state.rolling_buffer.is_empty());
        assert_eq!(state.cursor, 0);
        assert_eq!(poller.pending_uploads(), 1);
    }

    #[tokio::test]
    async fn test_response_after_clear_is_discarded() {
        let source = Arc::new(Controlled::default());
        source.inner.push_remote(1, LogLevel::Info, "a");
        let poller = poller(source.clone());

        source.gated.store(true, Ordering::SeqCst);
        let core = poller.core.clone();
        let in_flight = tokio::spawn(async move { core.tick(Some(0), TickMode::Manual).await });

        source.entered.notified().await;
        poller.clear();
        source.release.notify_one();

        let outcome = in_flight.await.unwrap().unwrap();
        assert_eq!(outcome, TickOutcome::Discarded);
        assert!(poller.state().rolling_buffer.is_empty());
    }

    #[tokio::test]
    async fn test_response_after_follow_disabled_is_discarded() {
        let source = Arc::new(Controlled::default());
        let mut poller = poller(source.clone());
        poller.set_follow(true).await.unwrap();
        assert!(poller.state().follow_enabled);

        source.inner.push_remote(1, LogLevel::Info, "late");
        source.gated.store(true, Ordering::SeqCst);
        let core = poller.core.clone();
        let in_flight = tokio::spawn(async move { core.tick(Some(0), TickMode::Manual).await });

        source.entered.notified().await;
        poller.set_follow(false).await.unwrap();
        source.release.notify_one();

        assert_eq!(in_flight.await.unwrap().unwrap(), TickOutcome::Discarded);
        let state = poller.state();
        assert!(!state.follow_enabled);
        assert!(state.rolling_buffer.is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_tick_skips_when_busy() {
        let source = Arc::new(Controlled::default());
        let poller = poller(source.clone());

        let _running = poller.core.in_flight.lock().await;
        let outcome = poller.core.tick(None, TickMode::Scheduled).await.unwrap();
        assert_eq!(outcome, TickOutcome::Skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_polls_until_disabled() {
        let source = Arc::new(Controlled::default());
        source.inner.push_remote(1, LogLevel::Info, "first");
        let mut poller = poller(source.clone());

        let first = poller.set_follow(true).await.unwrap();
        assert!(matches!(first, Some(TickOutcome::Applied { fetched: 1, .. })));
        assert!(poller.is_following());

        source.inner.push_remote(2, LogLevel::Info, "second");
        tokio::time::sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;
        assert_eq!(stamps(&poller.state()), vec![1, 2]);
        assert_eq!(poller.state().cursor, 2);

        poller.set_follow(false).await.unwrap();
        assert!(!poller.is_following());

        source.inner.push_remote(3, LogLevel::Info, "third");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(stamps(&poller.state()), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_off_lets_running_upload_finish() {
        let source = Arc::new(Controlled::default());
        let mut poller = poller(source.clone());
        poller.set_follow(true).await.unwrap();

        poller.capture_local("must reach the server", LogLevel::Warning);
        source.gated_upload.store(true, Ordering::SeqCst);

        // Wait for the scheduled tick to block inside the upload
        source.entered.notified().await;
        poller.set_follow(false).await.unwrap();
        source.release.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(source.inner.console_len(), 1);
        assert_eq!(poller.pending_uploads(), 0);
        assert!(poller.state().rolling_buffer.is_empty());
    }

    #[tokio::test]
    async fn test_follow_starts_even_if_first_refresh_fails() {
        let source = Arc::new(Controlled::default());
        source.fail_fetch.store(true, Ordering::SeqCst);
        let mut poller = poller(source.clone());

        assert!(poller.set_follow(true).await.is_err());
        assert!(poller.is_following());
        poller.shutdown();
        assert!(!poller.is_following());
    }
}
