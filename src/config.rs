//! Configuration for the health monitor.

use crate::core::{CursorPolicy, SessionSettings};
use crate::display::PLACEHOLDER;
use crate::health::{BiologicalSex, BloodType, SimulatorConfig};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest step or summary window accepted, one hundred years.
pub const MAX_WINDOW_HOURS: u64 = 24 * 366 * 100;

/// Convert a window length in hours, rejecting lengths over [`MAX_WINDOW_HOURS`].
pub fn window_from_hours(hours: u64) -> Result<chrono::Duration, ConfigError> {
    if hours > MAX_WINDOW_HOURS {
        return Err(ConfigError::InvalidWindow(hours));
    }
    i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .ok_or(ConfigError::InvalidWindow(hours))
}

/// Main configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Text shown while no reading is available
    pub placeholder: String,

    /// How many hours of steps a session covers
    pub step_window_hours: u64,

    /// Cursor handling when a new session starts
    pub cursor_policy: CursorPolicy,

    /// IANA timezone used for ages and timestamps
    pub timezone: String,

    /// Synthetic data settings
    pub simulation: SimulatorConfig,

    /// Characteristics served by the simulated store
    pub profile: ProfileConfig,

    /// Directory for the activity history
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("health-monitor");

        Self {
            placeholder: PLACEHOLDER.to_string(),
            step_window_hours: 24,
            cursor_policy: CursorPolicy::default(),
            timezone: "UTC".to_string(),
            simulation: SimulatorConfig::default(),
            profile: ProfileConfig::default(),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("health-monitor")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Parse the configured timezone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Settings for the monitoring screen's controller.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        Ok(SessionSettings {
            placeholder: self.placeholder.clone(),
            step_window: window_from_hours(self.step_window_hours)?,
            cursor_policy: self.cursor_policy,
        })
    }

    /// Where each run's activity counters are appended.
    pub fn activity_path(&self) -> PathBuf {
        self.data_path.join("activity.jsonl")
    }
}

/// Static characteristics served by the simulated store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<BiologicalSex>,
    pub blood_type: Option<BloodType>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            sex: Some(BiologicalSex::NotSet),
            blood_type: Some(BloodType::NotSet),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidTimezone(String),
    InvalidWindow(u64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidTimezone(tz) => write!(f, "Unknown timezone: {tz}"),
            ConfigError::InvalidWindow(hours) => write!(
                f,
                "Window of {hours} hours is too long (at most {MAX_WINDOW_HOURS})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
