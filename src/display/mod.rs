//! Display sinks and alert presentation.
//!
//! Controllers only talk to these traits. The in-memory `Label` and
//! `AlertLog` back the tests; the terminal implementations back the CLI.

pub mod terminal;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use terminal::{TerminalAlerts, TerminalLabel};

/// Text shown while no reading is available.
pub const PLACEHOLDER: &str = "---";

/// Label text colors used by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Green,
    Neutral,
}

/// Anything that can show one line of colored text.
pub trait DisplaySink {
    fn render(&self, text: &str, color: Color);
}

/// A dismissible notice with a single confirm button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub confirm: String,
}

impl Alert {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm: confirm.into(),
        }
    }
}

/// Anything that can put an alert in front of the user.
pub trait AlertPresenter {
    fn present(&self, alert: Alert);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LabelState {
    text: String,
    color: Color,
    renders: usize,
}

/// In-memory label. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Label {
    state: Arc<Mutex<LabelState>>,
}

impl Label {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LabelState {
                text: String::new(),
                color: Color::Neutral,
                renders: 0,
            })),
        }
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    pub fn color(&self) -> Color {
        self.lock().color
    }

    /// How many times the label was rendered.
    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    fn lock(&self) -> MutexGuard<'_, LabelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for Label {
    fn render(&self, text: &str, color: Color) {
        let mut state = self.lock();
        state.text = text.to_string();
        state.color = color;
        state.renders += 1;
    }
}

/// Presenter that keeps every alert it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Alert> {
        self.alerts().pop()
    }
}

impl AlertPresenter for AlertLog {
    fn present(&self, alert: Alert) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert);
    }
}
