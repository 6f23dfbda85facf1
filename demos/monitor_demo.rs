//! Demonstration of a monitoring session against the simulated store.
//!
//! This example shows how to:
//! 1. Build a store and feed it with the sample simulator
//! 2. Wire a session controller to display labels
//! 3. Toggle monitoring on and drain deliveries on the UI thread
//! 4. Toggle off and see the placeholders return
//!
//! Run with: cargo run --example monitor_demo

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use health_monitor::{
    activity::create_shared_log,
    core::{MonitorSinks, SessionController, SessionSettings},
    display::{Label, TerminalAlerts},
    health::{MemoryHealthStore, SampleSimulator, SimulatorConfig},
    ACCESS_DECLARATION,
};

fn main() {
    println!("Health Monitor - Session Demo");
    println!("=============================");
    println!();
    println!("{ACCESS_DECLARATION}");

    let store = Arc::new(MemoryHealthStore::new());
    let mut simulator = SampleSimulator::new(
        SimulatorConfig {
            interval_ms: 500,
            ..SimulatorConfig::default()
        },
        store.clone(),
    );
    simulator.backfill(chrono::Duration::hours(24), chrono::Duration::minutes(30));

    let heart_rate = Label::new();
    let step_count = Label::new();
    let button = Label::new();
    let activity = create_shared_log();

    let mut controller = SessionController::with_activity_log(
        store.clone(),
        MonitorSinks {
            heart_rate: Box::new(heart_rate.clone()),
            step_count: Box::new(step_count.clone()),
            button: Box::new(button.clone()),
        },
        Box::new(TerminalAlerts),
        SessionSettings::default(),
        activity.clone(),
    );

    controller.activate();
    controller.process_pending();

    println!("Button: {}", button.text());
    controller.toggle();
    println!("Button: {}", button.text());
    println!();

    if let Err(e) = simulator.start() {
        eprintln!("Error starting simulator: {e}");
        return;
    }

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    println!("Monitoring for 10 seconds...");
    let start = Instant::now();
    let mut last_shown = (String::new(), String::new());

    while running.load(Ordering::SeqCst) && start.elapsed() < Duration::from_secs(10) {
        controller.process_next(Duration::from_millis(100));

        let shown = (heart_rate.text(), step_count.text());
        if shown != last_shown {
            println!("  Heart rate: {:>4}   Steps: {:>6}", shown.0, shown.1);
            last_shown = shown;
        }
    }

    simulator.stop();
    controller.toggle();
    controller.process_pending();

    println!();
    println!("Button: {}", button.text());
    println!("Heart rate: {}   Steps: {}", heart_rate.text(), step_count.text());
    println!();
    println!("{}", activity.summary());
    println!();
    println!("Demo complete!");
}
