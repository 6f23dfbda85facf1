//! Activity accounting for the monitor.
//!
//! Tracks how many sessions, deliveries and readings the monitor handled so
//! a user can see what it has been doing.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_history, ActivityLog, ActivityStats, RunRecord,
    SharedActivityLog,
};
