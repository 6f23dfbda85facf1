//! Counters for sessions, deliveries and displayed readings.
//!
//! Each monitor run keeps its counters in memory. When a history file is
//! configured, [`ActivityLog::record_run`] appends one JSON line per run so
//! lifetime totals can be rebuilt from the file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Counter {
    SessionsStarted,
    DeliveriesApplied,
    DeliveriesIgnored,
    ReadingsDisplayed,
}

const COUNTERS: usize = 4;

/// Activity counters for the current process.
#[derive(Debug)]
pub struct ActivityLog {
    counters: [AtomicU64; COUNTERS],
    started_at: DateTime<Utc>,
    history_path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            counters: Default::default(),
            started_at: Utc::now(),
            history_path: None,
        }
    }

    /// Create a log whose runs are appended to the JSON-lines file at `path`.
    pub fn with_history(path: PathBuf) -> Self {
        Self {
            history_path: Some(path),
            ..Self::new()
        }
    }

    fn bump(&self, counter: Counter) {
        self.counters[counter as usize].fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self, counter: Counter) -> u64 {
        self.counters[counter as usize].load(Ordering::Relaxed)
    }

    pub fn record_session_started(&self) {
        self.bump(Counter::SessionsStarted);
    }

    pub fn record_delivery_applied(&self) {
        self.bump(Counter::DeliveriesApplied);
    }

    pub fn record_delivery_ignored(&self) {
        self.bump(Counter::DeliveriesIgnored);
    }

    pub fn record_reading_displayed(&self) {
        self.bump(Counter::ReadingsDisplayed);
    }

    /// Counters for this run so far.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            sessions_started: self.get(Counter::SessionsStarted),
            deliveries_applied: self.get(Counter::DeliveriesApplied),
            deliveries_ignored: self.get(Counter::DeliveriesIgnored),
            readings_displayed: self.get(Counter::ReadingsDisplayed),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append this run to the history file. Does nothing without one.
    pub fn record_run(&self) -> std::io::Result<()> {
        let Some(path) = &self.history_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let run = RunRecord {
            started_at: self.started_at,
            finished_at: Utc::now(),
            counts: self.stats(),
        };
        let mut line = serde_json::to_string(&run).map_err(std::io::Error::other)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())
    }

    /// Every run recorded in the history file, oldest first.
    pub fn history(&self) -> std::io::Result<Vec<RunRecord>> {
        match &self.history_path {
            Some(path) => read_history(path),
            None => Ok(Vec::new()),
        }
    }

    /// Human-readable report of this run, plus lifetime totals when a
    /// history file exists.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let uptime = (Utc::now() - self.started_at).num_seconds().max(0);
        let mut out = format!(
            "Activity this run ({uptime}s): {} session(s), {} reading(s) shown, \
             {} deliveries applied, {} ignored",
            stats.sessions_started,
            stats.readings_displayed,
            stats.deliveries_applied,
            stats.deliveries_ignored,
        );

        match self.history() {
            Ok(runs) if !runs.is_empty() => {
                let total = runs.iter().fold(ActivityStats::default(), |mut acc, run| {
                    acc.absorb(&run.counts);
                    acc
                });
                out.push_str(&format!(
                    "\nAll {} run(s): {} session(s), {} reading(s) shown",
                    runs.len(),
                    total.sessions_started,
                    total.readings_displayed,
                ));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read activity history: {e}"),
        }
        out
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

fn read_history(path: &Path) -> std::io::Result<Vec<RunRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut runs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(run) => runs.push(run),
            Err(e) => tracing::warn!(line = index + 1, "skipping unreadable activity record: {e}"),
        }
    }
    Ok(runs)
}

/// Snapshot of activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub sessions_started: u64,
    pub deliveries_applied: u64,
    pub deliveries_ignored: u64,
    pub readings_displayed: u64,
}

impl ActivityStats {
    fn absorb(&mut self, other: &ActivityStats) {
        self.sessions_started += other.sessions_started;
        self.deliveries_applied += other.deliveries_applied;
        self.deliveries_ignored += other.deliveries_ignored;
        self.readings_displayed += other.readings_displayed;
    }
}

/// One line of the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub counts: ActivityStats,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

pub fn create_shared_log_with_history(path: PathBuf) -> SharedActivityLog {
    Arc::new(ActivityLog::with_history(path))
}
