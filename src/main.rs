//! Health Monitor CLI
//!
//! Live heart-rate and step-count monitor.

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use health_monitor::{
    activity::create_shared_log_with_history,
    config::{window_from_hours, Config},
    core::{
        summarize, MonitorSinks, MonitoringState, ProfileController, ProfileSinks,
        SessionController, UiEvent,
    },
    display::{TerminalAlerts, TerminalLabel},
    health::{HealthStore, MemoryHealthStore, NoopHealthStore, SampleSimulator, READ_TYPES},
    ACCESS_DECLARATION, VERSION,
};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "health-monitor")]
#[command(version = VERSION)]
#[command(about = "Live heart-rate and step-count monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which health-data store to run against.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreKind {
    /// In-process store fed by the sample simulator
    Simulated,
    /// No health service present
    Unavailable,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring screen (Enter toggles, q or Ctrl+C quits)
    Monitor {
        /// Health-data store backend
        #[arg(long, value_enum, default_value = "simulated")]
        store: StoreKind,

        /// Start monitoring immediately
        #[arg(long)]
        autostart: bool,

        /// Exit after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Hours of history to backfill into the simulated store
        #[arg(long, default_value = "24")]
        history_hours: u64,

        /// Print labels without color codes
        #[arg(long)]
        plain: bool,
    },

    /// Show the profile screen once
    Profile {
        #[arg(long, value_enum, default_value = "simulated")]
        store: StoreKind,
    },

    /// Print step total and heart-rate statistics for a recent window
    Summary {
        #[arg(long, value_enum, default_value = "simulated")]
        store: StoreKind,

        /// Window length in hours
        #[arg(long, default_value = "24")]
        hours: u64,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the data types the monitor reads
    Permissions,

    /// Show configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            store,
            autostart,
            duration,
            history_hours,
            plain,
        } => cmd_monitor(store, autostart, duration, history_hours, plain),
        Commands::Profile { store } => cmd_profile(store),
        Commands::Summary { store, hours, json } => cmd_summary(store, hours, json),
        Commands::Permissions => {
            cmd_permissions();
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

/// Everything a command needs about the selected backend.
struct Backend {
    store: Arc<dyn HealthStore>,
    simulator: Option<SampleSimulator>,
}

fn open_store(kind: StoreKind, config: &Config, history_hours: u64) -> anyhow::Result<Backend> {
    let history = window_from_hours(history_hours).context("invalid history length")?;
    let backend = match kind {
        StoreKind::Unavailable => Backend {
            store: Arc::new(NoopHealthStore::new()),
            simulator: None,
        },
        StoreKind::Simulated => {
            let memory = Arc::new(MemoryHealthStore::new().with_profile(
                config.profile.date_of_birth,
                config.profile.sex,
                config.profile.blood_type,
            ));
            let simulator = SampleSimulator::new(config.simulation.clone(), memory.clone());
            if history_hours > 0 {
                let added = simulator.backfill(history, chrono::Duration::minutes(15));
                tracing::debug!(samples = added, "backfilled simulated history");
            }
            Backend {
                store: memory,
                simulator: Some(simulator),
            }
        }
    };
    Ok(backend)
}

fn load_config() -> (Config, Tz) {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config, using defaults: {e}");
        Config::default()
    });
    let timezone = config.timezone().unwrap_or_else(|e| {
        eprintln!("Warning: {e}, using UTC");
        chrono_tz::UTC
    });
    (config, timezone)
}

fn cmd_monitor(
    store_kind: StoreKind,
    autostart: bool,
    duration: Option<u64>,
    history_hours: u64,
    plain: bool,
) -> anyhow::Result<()> {
    println!("Health Monitor v{VERSION}");
    println!();

    let (config, timezone) = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let label = |name: &str| {
        let label = TerminalLabel::new(name, timezone);
        if plain {
            label.plain()
        } else {
            label
        }
    };

    let settings = config
        .session_settings()
        .context("invalid step window in config")?;
    let mut backend = open_store(store_kind, &config, history_hours)?;
    let activity = create_shared_log_with_history(config.activity_path());

    let sinks = MonitorSinks {
        heart_rate: Box::new(label("Heart rate")),
        step_count: Box::new(label("Steps")),
        button: Box::new(label("Button")),
    };
    let mut controller = SessionController::with_activity_log(
        backend.store.clone(),
        sinks,
        Box::new(TerminalAlerts),
        settings,
        activity.clone(),
    );

    controller.activate();

    if let Some(simulator) = backend.simulator.as_mut() {
        simulator
            .start()
            .context("could not start the sample simulator")?;
        println!("Simulating samples from {}", simulator.source());
    }

    println!("Press Enter to toggle monitoring, q then Enter or Ctrl+C to quit");
    println!();

    // Ctrl+C and stdin both post to the UI queue; the loop below is the only
    // place that touches the controller.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("could not install Ctrl+C handler")?;

    let ui = controller.ui_sender();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let event = if line.trim().eq_ignore_ascii_case("q") {
                UiEvent::Shutdown
            } else {
                UiEvent::ToggleRequested
            };
            if ui.send(event).is_err() {
                break;
            }
        }
    });

    if autostart {
        controller.toggle();
    }

    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    while running.load(Ordering::SeqCst) {
        if !controller.process_next(Duration::from_millis(100)) {
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
    }

    println!();
    println!("Stopping...");
    if controller.state() == MonitoringState::Active {
        controller.toggle();
    }
    if let Some(mut simulator) = backend.simulator.take() {
        simulator.stop();
    }

    if let Err(e) = activity.record_run() {
        eprintln!("Warning: Could not save activity log: {e}");
    }

    println!();
    println!("{}", activity.summary());
    Ok(())
}

fn cmd_profile(store_kind: StoreKind) -> anyhow::Result<()> {
    let (config, timezone) = load_config();
    let backend = open_store(store_kind, &config, 0)?;

    let sinks = ProfileSinks {
        date_of_birth: Box::new(TerminalLabel::new("Date of birth", timezone).plain()),
        age: Box::new(TerminalLabel::new("Age", timezone).plain()),
        sex: Box::new(TerminalLabel::new("Sex", timezone).plain()),
        blood_type: Box::new(TerminalLabel::new("Blood type", timezone).plain()),
    };

    println!("Profile");
    println!("=======");
    ProfileController::new(backend.store, sinks, timezone)
        .with_placeholder(config.placeholder.clone())
        .activate();
    Ok(())
}

fn cmd_summary(store_kind: StoreKind, hours: u64, json: bool) -> anyhow::Result<()> {
    let (config, timezone) = load_config();
    let window = window_from_hours(hours).context("invalid summary window")?;
    let backend = open_store(store_kind, &config, hours)?;

    let summary = summarize(backend.store.as_ref(), Utc::now(), window)
        .context("could not read health data")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Summary");
    println!("=======");
    println!();
    println!(
        "Window: {} to {}",
        summary.since.with_timezone(&timezone).format("%Y-%m-%d %H:%M"),
        summary.until.with_timezone(&timezone).format("%Y-%m-%d %H:%M")
    );
    println!("Steps: {}", health_monitor::format_metric(summary.steps));
    match summary.heart_rate {
        Some(hr) => {
            println!(
                "Heart rate: latest {}, mean {:.1}, min {}, max {} ({} samples)",
                health_monitor::format_metric(hr.latest),
                hr.mean,
                health_monitor::format_metric(hr.min),
                health_monitor::format_metric(hr.max),
                hr.samples
            );
        }
        None => println!("Heart rate: {}", config.placeholder),
    }
    Ok(())
}

fn cmd_permissions() {
    println!("{ACCESS_DECLARATION}");
    println!("Requested read types:");
    for data_type in READ_TYPES {
        println!("  - {}", data_type.identifier());
    }
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
