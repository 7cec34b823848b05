use std::sync::Arc;

use tracing::{error, info, warn};

use crate::paging::TailScroll;
use crate::requests::{Confirmation, DeleteOutcome, RequestLogView};
use crate::sources::{LogSource, SourceKind};
use crate::tail::{TailPoller, TickOutcome};
use crate::theme::Theme;

/// Which view is on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Requests,
    Console,
}

/// Input mode for the application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Waiting for y/n before deleting the request history
    ConfirmPurge,
}

/// Result of the last connection test
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connection {
    Unknown,
    Connected(String),
    Disconnected(String),
}

/// Operations that talk to the log source and have to be awaited
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    RefreshRequests,
    LoadMoreRequests,
    DeleteHistory(Confirmation),
    ToggleFollow,
    RefreshConsole,
    TestConnection,
}

impl Action {
    /// Status line shown while the action is awaited
    pub fn busy_label(&self) -> &'static str {
        match self {
            Action::RefreshRequests => "Loading requests...",
            Action::LoadMoreRequests => "Loading more history...",
            Action::DeleteHistory(Confirmation::Granted) => "Deleting history...",
            Action::DeleteHistory(Confirmation::Denied) => "Cancelling...",
            Action::ToggleFollow => "Switching follow...",
            Action::RefreshConsole => "Reloading console...",
            Action::TestConnection => "Testing connection...",
        }
    }
}

/// Main application state
pub struct AppState {
    pub requests: RequestLogView,
    pub tail: TailPoller,
    source: Arc<dyn LogSource>,
    pub source_kind: SourceKind,
    pub theme: Theme,
    pub view: View,
    pub mode: InputMode,
    /// Scroll position of the console view
    pub console_scroll: TailScroll,
    pub connection: Connection,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Status message to display
    pub status_message: Option<String>,
    /// Whether to show help overlay
    pub show_help: bool,
}

impl AppState {
    pub fn new(
        source: Arc<dyn LogSource>,
        source_kind: SourceKind,
        requests: RequestLogView,
        tail: TailPoller,
        theme: Theme,
    ) -> Self {
        Self {
            requests,
            tail,
            source,
            source_kind,
            theme,
            view: View::Requests,
            mode: InputMode::Normal,
            console_scroll: TailScroll::default(),
            connection: Connection::Unknown,
            should_quit: false,
            status_message: None,
            show_help: false,
        }
    }

    /// Initial load: connection test, first page of requests, console follow
    pub async fn start(&mut self) {
        self.dispatch(Action::TestConnection).await;
        self.dispatch(Action::RefreshRequests).await;
        self.dispatch(Action::ToggleFollow).await;
    }

    /// Stop background polling
    pub fn shutdown(&mut self) {
        self.tail.shutdown();
    }

    pub fn switch_view(&mut self) {
        self.view = match self.view {
            View::Requests => View::Console,
            View::Console => View::Requests,
        };
    }

    pub fn next_page(&mut self) {
        if !self.requests.next_page() {
            self.status_message = Some("Last page".to_string());
        }
    }

    pub fn previous_page(&mut self) {
        if !self.requests.previous_page() {
            self.status_message = Some("First page".to_string());
        }
    }

    pub fn clear_requests(&mut self) {
        self.requests.clear_display();
        self.status_message = Some("Display cleared (history kept)".to_string());
    }

    pub fn clear_console(&mut self) {
        self.tail.clear();
        self.console_scroll.pin();
        self.status_message = Some("Console cleared".to_string());
    }

    pub fn console_len(&self) -> usize {
        self.tail.with_state(|s| s.rolling_buffer.len())
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let len = self.console_len();
        self.console_scroll.up(lines, len);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.console_scroll.down(lines);
    }

    pub fn go_to_top(&mut self) {
        let len = self.console_len();
        self.console_scroll.top(len);
    }

    pub fn go_to_bottom(&mut self) {
        self.console_scroll.pin();
    }

    /// Show that `action` is in progress until `dispatch` replaces the message
    pub fn mark_busy(&mut self, action: Action) {
        self.status_message = Some(action.busy_label().to_string());
    }

    /// Run an operation against the log source. Failures end up in the
    /// status line and the last good view stays on screen.
    pub async fn dispatch(&mut self, action: Action) {
        match action {
            Action::RefreshRequests => match self.requests.refresh(false).await {
                Ok(state) => {
                    self.status_message = Some(format!(
                        "Loaded {} requests ({} pending)",
                        state.displayed.len(),
                        state.pending_count
                    ));
                }
                Err(e) => {
                    warn!(target: "diag", error = %e, "request log refresh failed");
                    self.status_message = Some(e.to_string());
                }
            },
            Action::LoadMoreRequests => {
                if !self.requests.state().has_more_history {
                    self.status_message = Some("No more history".to_string());
                    return;
                }
                match self.requests.refresh(true).await {
                    Ok(state) => {
                        self.status_message = Some(format!(
                            "{} of {} history entries loaded",
                            state.historical_loaded, state.total_historical
                        ));
                    }
                    Err(e) => {
                        warn!(target: "diag", error = %e, "loading more history failed");
                        self.status_message = Some(e.to_string());
                    }
                }
            }
            Action::DeleteHistory(confirmation) => {
                self.mode = InputMode::Normal;
                match self.requests.delete_history(confirmation).await {
                    Ok(DeleteOutcome::Cancelled) => {
                        self.status_message = Some("Delete cancelled".to_string());
                    }
                    Ok(DeleteOutcome::Purged) => {
                        info!(target: "diag", "request history deleted");
                        self.status_message = Some("Request history deleted".to_string());
                    }
                    Err(e) => {
                        error!(target: "diag", error = %e, "deleting request history failed");
                        self.status_message = Some(e.to_string());
                    }
                }
            }
            Action::ToggleFollow => {
                let enable = !self.tail.with_state(|s| s.follow_enabled);
                if enable {
                    self.console_scroll.pin();
                }
                match self.tail.set_follow(enable).await {
                    Ok(_) => {
                        self.status_message = Some(format!("Follow: {}", if enable { "on" } else { "off" }));
                    }
                    Err(e) => {
                        warn!(target: "diag", error = %e, "console refresh failed");
                        self.status_message = Some(format!("Follow on, but {}", e));
                    }
                }
            }
            Action::RefreshConsole => match self.tail.refresh().await {
                Ok(TickOutcome::Applied { fetched, upload_failed, .. }) => {
                    self.status_message = Some(if upload_failed {
                        format!("{} console entries (local upload pending)", fetched)
                    } else {
                        format!("{} console entries", fetched)
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(target: "diag", error = %e, "console refresh failed");
                    self.status_message = Some(e.to_string());
                }
            },
            Action::TestConnection => match self.source.health().await {
                Ok(health) => {
                    info!(target: "diag", source = %self.source_kind.name(), "log source {}", health.label);
                    self.connection = Connection::Connected(health.label);
                }
                Err(e) => {
                    error!(target: "diag", error = %e, "log source unreachable");
                    self.connection = Connection::Disconnected(e.to_string());
                }
            },
        }
    }
}
