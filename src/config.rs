use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::requests::PagingConfig;
use crate::tail::TailConfig;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5501/api/plugins/rescue-proxy";
pub const DEFAULT_CAPTURE_PATTERN: &str = "^diag";

/// Configuration for relaylog
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the log server API
    pub server_url: String,
    /// Requests shown per page
    pub page_size: usize,
    /// Pages of history loaded on a full refresh
    pub initial_pages: usize,
    /// Maximum console entries kept in memory
    pub tail_capacity: usize,
    /// Console poll period while following
    pub poll_interval_ms: u64,
    /// HTTP request timeout
    pub request_timeout_ms: u64,
    /// Regex over tracing targets selecting events to upload to the console
    pub capture_pattern: String,
    /// Color theme name
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            page_size: 20,
            initial_pages: 4,
            tail_capacity: 500,
            poll_interval_ms: 2000,
            request_timeout_ms: 10_000,
            capture_pattern: DEFAULT_CAPTURE_PATTERN.to_string(),
            theme: "default".to_string(),
        }
    }
}

impl Config {
    /// `~/.config/relaylog/config.toml` (or the platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("relaylog").join("config.toml"))
    }

    /// Load the config file if there is one, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from `RELAYLOG_*` variables; unparsable values are ignored
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("RELAYLOG_URL") {
            self.server_url = url;
        }
        if let Some(n) = var("RELAYLOG_PAGE_SIZE").and_then(|s| s.parse().ok()) {
            self.page_size = n;
        }
        if let Some(ms) = var("RELAYLOG_POLL_MS").and_then(|s| s.parse().ok()) {
            self.poll_interval_ms = ms;
        }
        if let Some(n) = var("RELAYLOG_TAIL_CAPACITY").and_then(|s| s.parse().ok()) {
            self.tail_capacity = n;
        }
        if let Some(theme) = var("RELAYLOG_THEME") {
            self.theme = theme;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.initial_pages == 0 {
            bail!("initial_pages must be at least 1");
        }
        if self.tail_capacity == 0 {
            bail!("tail_capacity must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be at least 1");
        }
        Ok(())
    }

    pub fn paging(&self) -> PagingConfig {
        PagingConfig {
            page_size: self.page_size,
            initial_pages: self.initial_pages,
        }
    }

    pub fn tail(&self) -> TailConfig {
        TailConfig {
            capacity: self.tail_capacity,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
