use ratatui::style::Color;

use crate::model::{EntrySource, LogLevel, RequestStatus};

/// All themeable colors in the application
#[derive(Clone, Debug)]
pub struct Theme {
    // Console levels
    pub level_error: Color,
    pub level_warn: Color,
    pub level_info: Color,

    // Request status
    pub request_pending: Color,
    pub request_ok: Color,
    pub request_error: Color,

    // Entry origin tags
    pub origin_local: Color,
    pub origin_remote: Color,

    // Tabs and borders
    pub tab_active: Color,
    pub tab_inactive: Color,
    pub border: Color,

    // Header
    pub header_title: Color,
    pub header_source: Color,
    pub header_bg: Color,
    pub connected: Color,
    pub disconnected: Color,

    // Status bar
    pub status_mode_bg: Color,
    pub status_mode_fg: Color,
    pub status_help: Color,
    pub status_bg: Color,

    pub timestamp: Color,

    // Empty states / messages
    pub empty_state: Color,
    pub warning_message: Color,

    // Overlays
    pub help_border: Color,
    pub help_bg: Color,
    pub danger_border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            level_error: Color::Red,
            level_warn: Color::Yellow,
            level_info: Color::Green,

            request_pending: Color::Yellow,
            request_ok: Color::Green,
            request_error: Color::Red,

            origin_local: Color::Magenta,
            origin_remote: Color::Blue,

            tab_active: Color::Cyan,
            tab_inactive: Color::DarkGray,
            border: Color::DarkGray,

            header_title: Color::Green,
            header_source: Color::Cyan,
            header_bg: Color::DarkGray,
            connected: Color::Green,
            disconnected: Color::Red,

            status_mode_bg: Color::Blue,
            status_mode_fg: Color::White,
            status_help: Color::DarkGray,
            status_bg: Color::Black,

            timestamp: Color::DarkGray,

            empty_state: Color::DarkGray,
            warning_message: Color::Yellow,

            help_border: Color::Cyan,
            help_bg: Color::Black,
            danger_border: Color::Red,
        }
    }

    /// Dracula theme - popular dark theme
    pub fn dracula() -> Self {
        Self {
            level_error: Color::Rgb(255, 85, 85),   // Red
            level_warn: Color::Rgb(255, 184, 108),  // Orange
            level_info: Color::Rgb(80, 250, 123),   // Green

            request_pending: Color::Rgb(241, 250, 140), // Yellow
            request_ok: Color::Rgb(80, 250, 123),
            request_error: Color::Rgb(255, 85, 85),

            origin_local: Color::Rgb(255, 121, 198),  // Pink
            origin_remote: Color::Rgb(139, 233, 253), // Cyan

            tab_active: Color::Rgb(189, 147, 249), // Purple
            tab_inactive: Color::Rgb(98, 114, 164),
            border: Color::Rgb(68, 71, 90), // Current line

            header_title: Color::Rgb(255, 121, 198),
            header_source: Color::Rgb(139, 233, 253),
            header_bg: Color::Rgb(40, 42, 54), // Background
            connected: Color::Rgb(80, 250, 123),
            disconnected: Color::Rgb(255, 85, 85),

            status_mode_bg: Color::Rgb(189, 147, 249),
            status_mode_fg: Color::Rgb(40, 42, 54),
            status_help: Color::Rgb(98, 114, 164), // Comment
            status_bg: Color::Rgb(33, 34, 44),

            timestamp: Color::Rgb(98, 114, 164),

            empty_state: Color::Rgb(98, 114, 164),
            warning_message: Color::Rgb(255, 184, 108),

            help_border: Color::Rgb(189, 147, 249),
            help_bg: Color::Rgb(40, 42, 54),
            danger_border: Color::Rgb(255, 85, 85),
        }
    }

    /// Monochrome theme - grayscale only
    pub fn monochrome() -> Self {
        Self {
            level_error: Color::Rgb(255, 255, 255), // White (stands out)
            level_warn: Color::Rgb(200, 200, 200),
            level_info: Color::Rgb(150, 150, 150),

            request_pending: Color::Rgb(200, 200, 200),
            request_ok: Color::Rgb(150, 150, 150),
            request_error: Color::Rgb(255, 255, 255),

            origin_local: Color::Rgb(180, 180, 180),
            origin_remote: Color::Rgb(120, 120, 120),

            tab_active: Color::Rgb(255, 255, 255),
            tab_inactive: Color::Rgb(100, 100, 100),
            border: Color::Rgb(80, 80, 80),

            header_title: Color::Rgb(255, 255, 255),
            header_source: Color::Rgb(180, 180, 180),
            header_bg: Color::Rgb(50, 50, 50),
            connected: Color::Rgb(200, 200, 200),
            disconnected: Color::Rgb(255, 255, 255),

            status_mode_bg: Color::Rgb(200, 200, 200),
            status_mode_fg: Color::Rgb(0, 0, 0),
            status_help: Color::Rgb(120, 120, 120),
            status_bg: Color::Rgb(30, 30, 30),

            timestamp: Color::Rgb(120, 120, 120),

            empty_state: Color::Rgb(120, 120, 120),
            warning_message: Color::Rgb(200, 200, 200),

            help_border: Color::Rgb(180, 180, 180),
            help_bg: Color::Rgb(20, 20, 20),
            danger_border: Color::Rgb(255, 255, 255),
        }
    }

    /// Get a theme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "monochrome" | "mono" => Self::monochrome(),
            "dracula" => Self::dracula(),
            _ => Self::default_theme(),
        }
    }

    pub fn level(&self, level: LogLevel) -> Color {
        match level {
            LogLevel::Error => self.level_error,
            LogLevel::Warning => self.level_warn,
            LogLevel::Info => self.level_info,
        }
    }

    pub fn request_status(&self, status: RequestStatus) -> Color {
        match status {
            RequestStatus::Pending => self.request_pending,
            RequestStatus::Success => self.request_ok,
            RequestStatus::Error => self.request_error,
        }
    }

    pub fn origin(&self, source: EntrySource) -> Color {
        match source {
            EntrySource::Local => self.origin_local,
            EntrySource::Remote => self.origin_remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_falls_back_to_default() {
        assert_eq!(Theme::by_name("nope").level_error, Color::Red);
        assert_eq!(Theme::by_name("Dracula").level_error, Color::Rgb(255, 85, 85));
        assert_eq!(Theme::by_name("mono").tab_active, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_status_colors() {
        let theme = Theme::default_theme();
        assert_eq!(theme.request_status(RequestStatus::Pending), Color::Yellow);
        assert_eq!(theme.level(LogLevel::Warning), Color::Yellow);
        assert_eq!(theme.origin(EntrySource::Local), Color::Magenta);
    }
}
