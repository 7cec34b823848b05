use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table, Tabs},
};

use crate::app::{AppState, Connection, InputMode, View};
use crate::model::{LogEntry, RequestLogRecord, format_clock};
use crate::theme::Theme;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Tabs
            Constraint::Min(3),    // Active view
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Message line
        ])
        .split(frame.area());

    draw_header(frame, state, chunks[0]);
    draw_tabs(frame, state, chunks[1]);
    match state.view {
        View::Requests => draw_requests(frame, state, chunks[2]),
        View::Console => draw_console(frame, state, chunks[2]),
    }
    draw_status_bar(frame, state, chunks[3]);
    draw_message_line(frame, state, chunks[4]);

    if state.mode == InputMode::ConfirmPurge {
        draw_confirm_overlay(frame, &state.theme);
    }
    if state.show_help {
        draw_help_overlay(frame, &state.theme);
    }
}

/// Draw the header showing the source and its connection status
fn draw_header(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = &state.theme;
    let (status, color) = match &state.connection {
        Connection::Unknown => ("checking...".to_string(), theme.empty_state),
        Connection::Connected(label) => (label.clone(), theme.connected),
        Connection::Disconnected(reason) => (format!("disconnected: {}", reason), theme.disconnected),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" relaylog ", Style::default().fg(theme.header_title).add_modifier(Modifier::BOLD)),
        Span::raw("| "),
        Span::styled(state.source_kind.name(), Style::default().fg(theme.header_source)),
        Span::raw(" | "),
        Span::styled(status, Style::default().fg(color)),
    ]))
    .style(Style::default().bg(theme.header_bg));

    frame.render_widget(header, area);
}

fn draw_tabs(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = &state.theme;
    let selected = match state.view {
        View::Requests => 0,
        View::Console => 1,
    };
    let tabs = Tabs::new(vec![" Requests ", " Console "])
        .select(selected)
        .style(Style::default().fg(theme.tab_inactive))
        .highlight_style(Style::default().fg(theme.tab_active).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, area);
}

fn request_row<'a>(record: &'a RequestLogRecord, theme: &Theme) -> Row<'a> {
    let elapsed = match record.response_time_ms {
        Some(ms) => format!("{} ms", ms),
        None if record.is_pending() => "...".to_string(),
        None => "-".to_string(),
    };
    Row::new(vec![
        Cell::from(format_clock(record.timestamp)).style(Style::default().fg(theme.timestamp)),
        Cell::from(record.model.as_str()),
        Cell::from(record.character.as_str()),
        Cell::from(elapsed),
        Cell::from(record.status.label()).style(Style::default().fg(theme.request_status(record.status))),
    ])
}

/// Draw the current page of the request log
fn draw_requests(frame: &mut Frame, state: &mut AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(2), Constraint::Length(1)])
        .split(area);

    let theme = state.theme.clone();
    let (entries, summary) = state.requests.render_page();

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(theme.border));

    if entries.is_empty() {
        let msg = Paragraph::new("No requests yet (r to refresh)")
            .style(Style::default().fg(theme.empty_state))
            .block(block);
        frame.render_widget(msg, chunks[0]);
    } else {
        let rows: Vec<Row> = entries.iter().map(|r| request_row(r, &theme)).collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
                Constraint::Length(10),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(vec!["time", "model", "character", "elapsed", "status"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block);
        frame.render_widget(table, chunks[0]);
    }

    let mut spans = vec![Span::raw(format!(" {}", summary))];
    if summary.has_more {
        spans.push(Span::styled("  (m: load more)", Style::default().fg(theme.status_help)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
}

fn console_line<'a>(entry: &'a LogEntry, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format_clock(entry.timestamp), Style::default().fg(theme.timestamp)),
        Span::raw(" "),
        Span::styled(format!("[{}]", entry.source.tag()), Style::default().fg(theme.origin(entry.source))),
        Span::raw(" "),
        Span::styled(format!("{:<5}", entry.level.label()), Style::default().fg(theme.level(entry.level))),
        Span::raw(" "),
        Span::raw(entry.message.as_str()),
    ])
}

/// Draw the rolling console buffer
fn draw_console(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = &state.theme;
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = inner.height as usize;
    if height == 0 {
        return;
    }

    let scroll = state.console_scroll;
    state.tail.with_state(|tail| {
        let total = tail.rolling_buffer.len();
        if total == 0 {
            let msg = Paragraph::new("Waiting for console entries...").style(Style::default().fg(theme.empty_state));
            frame.render_widget(msg, inner);
            return;
        }

        let window = scroll.window(total, height);
        let lines: Vec<Line> = tail
            .rolling_buffer
            .range(window.clone())
            .map(|entry| console_line(entry, theme))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);

        // Draw scrollbar if there are more lines than visible
        if total > height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(height)).position(window.start);
            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    });
}

/// Draw the status bar
fn draw_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = &state.theme;
    let mode_str = match state.mode {
        InputMode::Normal => "NORMAL",
        InputMode::ConfirmPurge => "CONFIRM",
    };

    let (len, cursor, following) = state
        .tail
        .with_state(|s| (s.rolling_buffer.len(), s.cursor, s.follow_enabled));
    let uploads = state.tail.pending_uploads();

    let follow_indicator = if following { "[F]" } else { "" };
    let pinned_indicator = if state.console_scroll.pinned() { "" } else { "[scrolled]" };
    let indicators: Vec<&str> = [follow_indicator, pinned_indicator]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect();
    let indicators_str = if indicators.is_empty() {
        String::new()
    } else {
        format!(" {}", indicators.join(" "))
    };

    let help_text = match state.view {
        View::Requests => " r:refresh m:more n/p:page c:clear D:delete ?:help ",
        View::Console => " f:follow r:refresh x:clear g/G:top/bottom ?:help ",
    };

    let status = Line::from(vec![
        Span::styled(
            format!(" {} ", mode_str),
            Style::default().bg(theme.status_mode_bg).fg(theme.status_mode_fg),
        ),
        Span::raw(format!(
            " console {} lines, cursor {}, {} to upload{} ",
            len, cursor, uploads, indicators_str
        )),
        Span::styled(help_text, Style::default().fg(theme.status_help)),
    ]);

    frame.render_widget(Paragraph::new(status).style(Style::default().bg(theme.status_bg)), area);
}

fn draw_message_line(frame: &mut Frame, state: &AppState, area: Rect) {
    if let Some(msg) = &state.status_message {
        let content = Line::from(Span::styled(msg.as_str(), Style::default().fg(state.theme.warning_message)));
        frame.render_widget(Paragraph::new(content), area);
    }
}

/// A centered rect of at most `width` x `height`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn draw_confirm_overlay(frame: &mut Frame, theme: &Theme) {
    let area = centered(frame.area(), 48, 6);
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::styled("Delete all request history?", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("This cannot be undone."),
        Line::from("y: delete   n/Esc: cancel"),
    ];
    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.danger_border))
        .style(Style::default().bg(theme.help_bg));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Draw the help overlay
fn draw_help_overlay(frame: &mut Frame, theme: &Theme) {
    let area = centered(frame.area(), 50, 24);
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("General:"),
        Line::from("  Tab          Switch Requests / Console"),
        Line::from("  t            Test connection"),
        Line::from("  f            Toggle console follow"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q            Quit"),
        Line::from(""),
        Line::from("Requests:"),
        Line::from("  r            Refresh"),
        Line::from("  m            Load more history"),
        Line::from("  n/p, ←/→     Next/previous page"),
        Line::from("  c            Clear display"),
        Line::from("  D            Delete history"),
        Line::from(""),
        Line::from("Console:"),
        Line::from("  r            Reload from start"),
        Line::from("  x            Clear"),
        Line::from("  j/k, ↑/↓     Scroll"),
        Line::from("  g/G          Go to top/bottom"),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.help_border))
        .style(Style::default().bg(theme.help_bg));
    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::capture::UploadBuffer;
    use crate::model::LogLevel;
    use crate::requests::{PagingConfig, RequestLogView};
    use crate::sources::memory::MemorySource;
    use crate::sources::{LogSource, SourceKind};
    use crate::tail::{TailConfig, TailPoller};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[tokio::test]
    async fn test_draw_both_views() {
        let memory = Arc::new(MemorySource::new());
        for i in 0..25 {
            let t = memory.begin_request(i, "gpt-4o", "Aqua");
            memory.complete_request(t, true, 120);
        }
        memory.push_remote(5, LogLevel::Warning, "upstream slow");
        let source: Arc<dyn LogSource> = memory;

        let mut state = AppState::new(
            source.clone(),
            SourceKind::Demo,
            RequestLogView::new(source.clone(), PagingConfig::default()),
            TailPoller::new(source, UploadBuffer::new(), TailConfig::default()),
            Theme::default(),
        );
        state.requests.refresh(false).await.unwrap();
        state.tail.refresh().await.unwrap();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, &mut state)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Page 1/2 | showing 25 of 25"));
        assert!(text.contains("gpt-4o"));

        state.switch_view();
        terminal.draw(|frame| draw(frame, &mut state)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("upstream slow"));
        assert!(text.contains("WARN"));

        state.mode = InputMode::ConfirmPurge;
        terminal.draw(|frame| draw(frame, &mut state)).unwrap();
        assert!(buffer_text(&terminal).contains("Delete all request history?"));
    }
}
