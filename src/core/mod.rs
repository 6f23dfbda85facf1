//! Core functionality for the health monitor.
//!
//! This module contains:
//! - Formatting of readings for display
//! - The UI-context event queue that store callbacks post to
//! - Per-metric subscriptions with their cursors
//! - The monitoring and profile screen controllers
//! - A one-shot summary over the last day

pub mod dispatch;
pub mod format;
pub mod profile;
pub mod session;
pub mod subscription;
pub mod summary;

// Re-export commonly used types
pub use dispatch::{UiEvent, UiQueue};
pub use format::{format_metric, MetricFormatter};
pub use profile::{ProfileController, ProfileSinks};
pub use session::{
    CursorPolicy, MonitorSinks, MonitoringState, SessionController, SessionSettings, START_LABEL,
    STOP_LABEL,
};
pub use subscription::{select_value, DeliveryOutcome, MetricSubscription};
pub use summary::{summarize, DailySummary, HeartRateStats};
