//! Client settings, read from `timeroom.toml`

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::timer::{
    TimeEntry, TimerSettings, DEFAULT_HOLD_THRESHOLD_MS, DEFAULT_TICK_INTERVAL_MS,
};

pub const CONFIG_FILE_NAME: &str = "timeroom.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// How long the timer must be held before it arms
    pub hold_threshold_ms: u64,
    pub tick_interval_ms: u64,
    pub time_entry: TimeEntry,
    /// Device silence before the hardware signal counts as lost
    pub signal_timeout_ms: u64,
    /// Average-of-N windows shown in the stats panel
    pub stats_windows: Vec<usize>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            hold_threshold_ms: DEFAULT_HOLD_THRESHOLD_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            time_entry: TimeEntry::default(),
            signal_timeout_ms: 1000,
            stats_windows: vec![5, 12],
        }
    }
}

impl RoomConfig {
    /// Load from a file. A missing file gives the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from the platform config directory
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "timeroom", "timeroom").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            hold_threshold_ms: self.hold_threshold_ms,
            tick_interval_ms: self.tick_interval_ms,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".into()));
        }
        if let Some(n) = self.stats_windows.iter().find(|n| **n <= 2) {
            return Err(Error::Config(format!(
                "stats window {n} is too small; trimmed averages need at least 3 solves"
            )));
        }
        Ok(())
    }
}
