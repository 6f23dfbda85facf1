//! Synthetic sample producer for a `MemoryHealthStore`.
//!
//! A background thread appends one heart-rate reading and one step-count
//! reading per interval, so the monitor has live data on machines without
//! a wearable attached.

use crate::health::memory::MemoryHealthStore;
use crate::health::types::{MetricKind, MetricSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How the simulator paces and shapes its readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Time between generated readings
    pub interval_ms: u64,
    /// Baseline heart rate in beats per minute
    pub resting_heart_rate: f64,
    /// Average steps recorded per interval
    pub steps_per_interval: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            resting_heart_rate: 64.0,
            steps_per_interval: 18.0,
        }
    }
}

/// Errors that can occur while driving the simulator.
#[derive(Debug)]
pub enum SimulatorError {
    AlreadyRunning,
}

impl std::fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulatorError::AlreadyRunning => write!(f, "Simulator is already running"),
        }
    }
}

impl std::error::Error for SimulatorError {}

/// Background producer of synthetic samples.
pub struct SampleSimulator {
    config: SimulatorConfig,
    store: Arc<MemoryHealthStore>,
    source: String,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SampleSimulator {
    /// Create a simulator feeding `store`. Samples are attributed to this host.
    pub fn new(config: SimulatorConfig, store: Arc<MemoryHealthStore>) -> Self {
        let source = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "simulator".to_string());

        Self {
            config,
            store,
            source,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start producing samples in a background thread.
    pub fn start(&mut self) -> Result<(), SimulatorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SimulatorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let store = self.store.clone();
        let running = self.running.clone();
        let config = self.config.clone();
        let source = self.source.clone();

        let handle = thread::spawn(move || {
            run_producer(store, running, config, source);
        });

        self.thread_handle = Some(handle);
        tracing::debug!(interval_ms = self.config.interval_ms, "simulator started");
        Ok(())
    }

    /// Stop producing samples.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Name attached to generated samples.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fill the store with readings every `every` over the `span` leading up
    /// to now. Returns the number of samples added.
    pub fn backfill(&self, span: chrono::Duration, every: chrono::Duration) -> usize {
        if every <= chrono::Duration::zero() {
            return 0;
        }

        let now = Utc::now();
        let Some(mut at) = now.checked_sub_signed(span) else {
            return 0;
        };
        let mut tick: u64 = 0;
        let mut samples = Vec::new();
        while at < now {
            samples.extend(generate_tick_at(tick, at, &self.config, &self.source));
            at += every;
            tick += 1;
        }

        let count = samples.len();
        self.store.append_samples(samples);
        count
    }
}

impl Drop for SampleSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_producer(
    store: Arc<MemoryHealthStore>,
    running: Arc<AtomicBool>,
    config: SimulatorConfig,
    source: String,
) {
    let interval = Duration::from_millis(config.interval_ms.max(1));
    let mut tick: u64 = 0;

    while running.load(Ordering::SeqCst) {
        store.append_samples(generate_tick(tick, &config, &source));
        tick += 1;

        // Sleep in short slices so stop() returns promptly.
        let deadline = Instant::now() + interval;
        while running.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50).min(interval));
        }
    }
}

/// Readings for one interval, stamped now.
pub fn generate_tick(tick: u64, config: &SimulatorConfig, source: &str) -> Vec<MetricSample> {
    generate_tick_at(tick, Utc::now(), config, source)
}

/// Readings for one interval. Values are deterministic in `tick`.
pub fn generate_tick_at(
    tick: u64,
    now: DateTime<Utc>,
    config: &SimulatorConfig,
    source: &str,
) -> Vec<MetricSample> {
    let t = tick as f64;

    let heart_rate = (config.resting_heart_rate + 9.0 * (t / 5.0).sin() + (tick % 3) as f64).max(30.0);
    let steps = (config.steps_per_interval * (1.0 + 0.5 * (t / 7.0).sin())).round().max(0.0);

    vec![
        MetricSample::new(MetricKind::HeartRate, heart_rate, now).with_source(source),
        MetricSample::new(MetricKind::StepCount, steps, now).with_source(source),
    ]
}
