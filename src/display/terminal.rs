//! Terminal rendering for the CLI.

use crate::display::{Alert, AlertPresenter, Color, DisplaySink};
use chrono::Utc;
use chrono_tz::Tz;

/// A named label that prints each update on its own line.
pub struct TerminalLabel {
    name: String,
    timezone: Tz,
    use_color: bool,
}

impl TerminalLabel {
    pub fn new(name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            name: name.into(),
            timezone,
            use_color: true,
        }
    }

    /// Disable ANSI color codes (for piped output).
    pub fn plain(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The line printed for an update, without the trailing newline.
    pub fn line(&self, text: &str, color: Color) -> String {
        let time = Utc::now().with_timezone(&self.timezone).format("%H:%M:%S");
        let code = match color {
            Color::Red => "31",
            Color::Green => "32",
            Color::Neutral => "0",
        };
        if self.use_color {
            format!("[{time}] {}: \x1b[{code}m{text}\x1b[0m", self.name)
        } else {
            format!("[{time}] {}: {text}", self.name)
        }
    }
}

impl DisplaySink for TerminalLabel {
    fn render(&self, text: &str, color: Color) {
        println!("{}", self.line(text, color));
    }
}

/// Prints alerts as a boxed notice on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAlerts;

impl AlertPresenter for TerminalAlerts {
    fn present(&self, alert: Alert) {
        let width = alert.title.len().max(alert.message.len()) + 4;
        let border = "─".repeat(width);
        eprintln!("┌{border}┐");
        eprintln!("│  {:<w$}│", alert.title, w = width - 2);
        eprintln!("│  {:<w$}│", alert.message, w = width - 2);
        eprintln!("│  {:<w$}│", format!("[{}]", alert.confirm), w = width - 2);
        eprintln!("└{border}┘");
    }
}
