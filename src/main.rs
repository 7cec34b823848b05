mod app;
mod capture;
mod config;
mod error;
mod input;
mod model;
mod paging;
mod requests;
mod sources;
mod tail;
mod theme;
mod ui;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use app::AppState;
use capture::{CaptureLayer, TagMatcher, UploadBuffer};
use config::Config;
use model::LogLevel;
use requests::RequestLogView;
use sources::{LogSource, SourceKind, http::HttpSource, memory::MemorySource};
use tail::TailPoller;
use theme::Theme;

/// Parsed command line
struct Args {
    demo: bool,
    url: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { demo: false, url: None };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--demo" => args.demo = true,
            "--url" => match iter.next() {
                Some(url) => args.url = Some(url),
                None => bail!("--url needs a value"),
            },
            "-h" | "--help" => {
                println!("Usage: relaylog [--demo] [--url <server_url>]");
                std::process::exit(0);
            }
            other => bail!("Unknown argument: {} (try --help)", other),
        }
    }
    Ok(args)
}

/// Log to a file, never to the terminal the TUI owns. Events with a
/// matching target also go to the upload buffer for the remote console.
fn setup_logging(uploads: UploadBuffer, tags: TagMatcher) -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("relaylog");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_path = log_dir.join("relaylog.log");
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())),
        )
        .with(CaptureLayer::new(uploads, tags))
        .init();

    Ok(log_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = args.url {
        config.server_url = url;
    }

    let uploads = UploadBuffer::new();
    let tags = TagMatcher::new(config.capture_pattern.as_str());
    let regex_tags = tags.is_regex();
    let log_path = setup_logging(uploads.clone(), tags).context("Failed to setup logging")?;
    info!(
        path = %log_path.display(),
        capture = %config.capture_pattern,
        regex = regex_tags,
        "Logging initialized"
    );

    let mut demo_task = None;
    let (source_kind, source): (SourceKind, Arc<dyn LogSource>) = if args.demo {
        let memory = Arc::new(MemorySource::new());
        demo_task = Some(sources::memory::spawn_demo_traffic(memory.clone(), Duration::from_millis(700)));
        (SourceKind::Demo, memory)
    } else {
        let source = HttpSource::new(config.server_url.as_str(), config.request_timeout())
            .context("Failed to build HTTP client")?;
        (
            SourceKind::Http {
                url: config.server_url.clone(),
            },
            Arc::new(source),
        )
    };
    info!(source = %source_kind.name(), page_size = config.page_size, "Starting relaylog");

    let requests = RequestLogView::new(source.clone(), config.paging());
    let tail = TailPoller::new(source.clone(), uploads, config.tail());
    let mut state = AppState::new(source, source_kind, requests, tail, Theme::by_name(&config.theme));
    state
        .tail
        .capture_local(format!("relaylog {} attached", env!("CARGO_PKG_VERSION")), LogLevel::Info);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic);
    }));

    state.start().await;

    // Main event loop
    let result = run_event_loop(&mut terminal, &mut state).await;

    state.shutdown();
    if let Some(task) = demo_task {
        task.abort();
    }
    let final_state = state.tail.state();
    info!(
        entries = final_state.rolling_buffer.len(),
        cursor = final_state.cursor,
        "Console closed"
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;

    result
}

async fn run_event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, state: &mut AppState) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|frame| {
            ui::draw(frame, state);
        })?;

        // Calculate page size for scrolling
        let page_size = terminal.size()?.height.saturating_sub(6) as usize;

        // Background polling updates the tail state directly; redraw at ~60fps
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(16)) => {
                // Poll for events with no blocking
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) => {
                            // Only handle key press events (not release)
                            if key.kind == KeyEventKind::Press {
                                if let Some(action) = input::handle_key(state, key, page_size) {
                                    // Redraw first so the wait on the log source is visible
                                    state.mark_busy(action);
                                    terminal.draw(|frame| ui::draw(frame, state))?;
                                    state.dispatch(action).await;
                                }
                            }
                        }
                        Event::Mouse(mouse) => {
                            input::handle_mouse(state, mouse);
                        }
                        _ => {}
                    }
                }
            }

            // SIGINT from outside the terminal (raw mode turns Ctrl+C into a key)
            _ = tokio::signal::ctrl_c() => {
                state.should_quit = true;
            }
        }

        // Check if we should quit
        if state.should_quit {
            break;
        }
    }

    Ok(())
}
