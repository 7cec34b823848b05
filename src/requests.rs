//! Paginated request log.
//!
//! Merges the pending requests, refetched whole on every refresh, with a
//! growing prefix of the persisted history, and shows it one fixed-size page
//! at a time.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{ViewError, ensure_invariant};
use crate::model::RequestLogRecord;
use crate::paging::{Pager, total_pages};
use crate::sources::LogSource;

/// Paging parameters for the request view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagingConfig {
    pub page_size: usize,
    /// Pages of history loaded by a full refresh
    pub initial_pages: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            initial_pages: 4,
        }
    }
}

/// What the request view currently shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageState {
    pager: Pager,
    /// Pending records first, then the loaded history in source order
    pub displayed: Vec<RequestLogRecord>,
    /// How many leading `displayed` entries are pending
    pub pending_count: usize,
    /// History entries loaded so far; the offset of the next load-more
    pub historical_loaded: usize,
    pub total_historical: u64,
    pub has_more_history: bool,
}

impl PageState {
    fn new(page_size: usize) -> Self {
        Self {
            pager: Pager::new(page_size),
            displayed: Vec::new(),
            pending_count: 0,
            historical_loaded: 0,
            total_historical: 0,
            has_more_history: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.pager.page_size()
    }

    pub fn current_page(&self) -> usize {
        self.pager.current()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.displayed.len(), self.pager.page_size())
    }

    /// The history part of `displayed`
    pub fn historical(&self) -> &[RequestLogRecord] {
        &self.displayed[self.pending_count.min(self.displayed.len())..]
    }
}

/// Human-readable pagination line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSummary {
    /// 1-based, 0 when there is nothing to show
    pub page: usize,
    pub total_pages: usize,
    pub displayed: usize,
    /// `total_historical + pending_count`
    pub available: u64,
    pub pending: usize,
    pub has_more: bool,
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page {}/{} | showing {} of {}",
            self.page, self.total_pages, self.displayed, self.available
        )?;
        if self.pending > 0 {
            write!(f, " ({} pending)", self.pending)?;
        }
        if self.has_more {
            write!(f, " | more available")?;
        }
        Ok(())
    }
}

/// Whether the user agreed to a destructive action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Purged,
}

/// The paginated request log view
pub struct RequestLogView {
    source: Arc<dyn LogSource>,
    config: PagingConfig,
    state: PageState,
}

impl RequestLogView {
    pub fn new(source: Arc<dyn LogSource>, config: PagingConfig) -> Self {
        Self {
            source,
            state: PageState::new(config.page_size),
            config,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Reload pending requests and either the first pages of history
    /// (`load_more == false`) or the next page of it.
    ///
    /// Nothing is changed unless both fetches succeed.
    pub async fn refresh(&mut self, load_more: bool) -> Result<&PageState, ViewError> {
        debug!(load_more, "RequestLogView::refresh: called");
        let page_size = self.state.page_size();

        let pending = self
            .source
            .fetch_pending()
            .await
            .map_err(ViewError::TransientFetch)?;

        let (offset, limit) = if load_more {
            (self.state.historical_loaded, page_size)
        } else {
            (0, self.config.initial_pages.max(1) * page_size)
        };

        let page = self
            .source
            .fetch_historical(offset, limit)
            .await
            .map_err(ViewError::TransientFetch)?;

        if page.entries.len() > limit {
            warn!(
                returned = page.entries.len(),
                limit, "log source returned more history than requested"
            );
        }

        let mut historical = if load_more {
            self.state.historical().to_vec()
        } else {
            Vec::new()
        };
        ensure_invariant(historical.len() == offset, "history offset out of sync with display")?;
        historical.extend(page.entries);

        let mut next = PageState::new(page_size);
        if load_more {
            next.pager = self.state.pager;
        }
        next.pending_count = pending.len();
        next.historical_loaded = historical.len();
        next.total_historical = page.total;
        next.has_more_history = page.has_more;
        next.displayed = pending;
        next.displayed.extend(historical);
        next.pager.clamp(next.displayed.len());

        debug!(
            pending = next.pending_count,
            historical = next.historical_loaded,
            total = next.total_historical,
            "RequestLogView::refresh: applied"
        );
        self.state = next;
        Ok(&self.state)
    }

    /// Forget everything on screen. Persisted history is untouched.
    pub fn clear_display(&mut self) {
        self.state = PageState::new(self.state.page_size());
    }

    /// Purge the persisted history, then reload.
    ///
    /// With `Confirmation::Denied` the log source is never contacted.
    pub async fn delete_history(&mut self, confirmation: Confirmation) -> Result<DeleteOutcome, ViewError> {
        if confirmation == Confirmation::Denied {
            debug!("RequestLogView::delete_history: not confirmed");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.source
            .purge_historical()
            .await
            .map_err(ViewError::DestructiveOperation)?;
        info!("request history purged");

        self.refresh(false).await?;
        Ok(DeleteOutcome::Purged)
    }

    pub fn next_page(&mut self) -> bool {
        self.state.pager.next(self.state.displayed.len())
    }

    pub fn previous_page(&mut self) -> bool {
        self.state.pager.previous()
    }

    /// Entries of the current page plus its summary line
    pub fn render_page(&mut self) -> (&[RequestLogRecord], PageSummary) {
        let len = self.state.displayed.len();
        if ensure_invariant(self.state.pager.in_range(len), "page index past last page").is_err() {
            self.state.pager.clamp(len);
        }

        let pages = self.state.total_pages();
        let summary = PageSummary {
            page: if pages == 0 { 0 } else { self.state.current_page() + 1 },
            total_pages: pages,
            displayed: len,
            available: self.state.total_historical + self.state.pending_count as u64,
            pending: self.state.pending_count,
            has_more: self.state.has_more_history,
        };

        let range = self.state.pager.range(len);
        (&self.state.displayed[range], summary)
    }
}
