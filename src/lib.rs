//! Health Monitor - live heart-rate and step-count display.
//!
//! This library drives a two-screen monitor on top of a health-data store:
//! a monitoring screen that toggles live heart-rate and step-count
//! subscriptions, and a profile screen that shows four static
//! characteristics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Health Monitor                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ HealthStore │──▶│  UI queue   │──▶│ Subscription│       │
//! │  │  (threads)  │   │ (crossbeam) │   │ (cursor)    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Activity   │◀────────────────────│   Display   │       │
//! │  │    Log      │                     │    sinks    │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use health_monitor::core::{MonitorSinks, SessionController, SessionSettings};
//! use health_monitor::display::{AlertLog, Label};
//! use health_monitor::health::MemoryHealthStore;
//!
//! let store = Arc::new(MemoryHealthStore::new());
//! let sinks = MonitorSinks {
//!     heart_rate: Box::new(Label::new()),
//!     step_count: Box::new(Label::new()),
//!     button: Box::new(Label::new()),
//! };
//! let mut controller =
//!     SessionController::new(store, sinks, Box::new(AlertLog::new()), SessionSettings::default());
//!
//! controller.activate();
//! controller.toggle();
//! controller.process_pending();
//! ```

pub mod activity;
pub mod config;
pub mod core;
pub mod display;
pub mod health;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use config::{Config, ConfigError};
pub use crate::core::{
    format_metric, MetricFormatter, MetricSubscription, MonitorSinks, MonitoringState,
    ProfileController, ProfileSinks, SessionController, SessionSettings,
};
pub use display::{Alert, AlertPresenter, Color, DisplaySink, Label, PLACEHOLDER};
pub use health::{HealthError, HealthStore, MemoryHealthStore, NoopHealthStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data access declaration shown before asking for permission.
pub const ACCESS_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              HEALTH MONITOR - DATA ACCESS DECLARATION            ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This monitor READS the following health data:                   ║
║    • Heart rate (live, while monitoring is on)                   ║
║    • Step count (last 24 hours, while monitoring is on)          ║
║    • Date of birth, biological sex and blood type                ║
║                                                                  ║
║  It NEVER WRITES health data.                                    ║
║                                                                  ║
║  Readings are shown and then discarded. Only activity counters   ║
║  (sessions started, readings displayed) are kept on disk.        ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_declaration_contents() {
        assert!(ACCESS_DECLARATION.contains("READS"));
        assert!(ACCESS_DECLARATION.contains("NEVER WRITES"));
        assert!(ACCESS_DECLARATION.contains("Heart rate"));
    }
}
