use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::AlertSettings;
use crate::error::{Error, Result};
use crate::interval::IntervalRange;
use crate::notifications::MAX_PENDING;
use crate::scheduler::{SchedulerSettings, DEFAULT_BATCH_SIZE, DEFAULT_REPLENISH_THRESHOLD};

const APP_DIR: &str = "random-chime";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "random-chime.log";

/// User settings, stored as JSON. The schedule itself is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub min_secs: u32,
    pub max_secs: u32,
    pub batch_size: usize,
    pub replenish_threshold: usize,
    pub sound_file: Option<PathBuf>,
    pub volume: f32,
    pub desktop_notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        let interval = IntervalRange::default();
        Self {
            min_secs: interval.min_secs(),
            max_secs: interval.max_secs(),
            batch_size: DEFAULT_BATCH_SIZE,
            replenish_threshold: DEFAULT_REPLENISH_THRESHOLD,
            sound_file: None,
            volume: 1.0,
            desktop_notifications: false,
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.interval()?;
        if self.batch_size == 0 || self.batch_size > MAX_PENDING {
            return Err(Error::InvalidConfig(format!(
                "batch_size must be between 1 and {MAX_PENDING}, got {}",
                self.batch_size
            )));
        }
        if self.replenish_threshold > self.batch_size {
            return Err(Error::InvalidConfig(format!(
                "replenish_threshold {} exceeds batch_size {}",
                self.replenish_threshold, self.batch_size
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::InvalidConfig(format!(
                "volume must be between 0 and 1, got {}",
                self.volume
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Result<IntervalRange> {
        IntervalRange::new(self.min_secs, self.max_secs)
    }

    pub fn set_interval(&mut self, interval: IntervalRange) {
        self.min_secs = interval.min_secs();
        self.max_secs = interval.max_secs();
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            batch_size: self.batch_size,
            replenish_threshold: self.replenish_threshold,
        }
    }

    pub fn alert_settings(&self) -> AlertSettings {
        AlertSettings {
            sound_file: self.sound_file.clone(),
            volume: self.volume,
            desktop_notifications: self.desktop_notifications,
        }
    }
}

/// `$XDG_CONFIG_HOME/random-chime`, else `$HOME/.config/random-chime`,
/// else the working directory.
pub fn config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map_or_else(|| PathBuf::from("."), |base| base.join(APP_DIR))
}

pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Log file sits beside whichever config file is in use.
pub fn log_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map_or_else(|| PathBuf::from(LOG_FILE), |dir| dir.join(LOG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "min_secs": 5, "max_secs": 15 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.interval().unwrap(), IntervalRange::new(5, 15).unwrap());
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.sound_file.is_none());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config {
            sound_file: Some(PathBuf::from("/tmp/bell.ogg")),
            desktop_notifications: true,
            ..Config::default()
        };
        config.set_interval(IntervalRange::new(7, 9).unwrap());
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let crossed = Config {
            min_secs: 50,
            max_secs: 10,
            ..Config::default()
        };
        assert!(matches!(
            crossed.validate(),
            Err(Error::InvalidInterval { min: 50, max: 10 })
        ));

        let oversized = Config {
            batch_size: MAX_PENDING + 1,
            ..Config::default()
        };
        assert!(matches!(oversized.validate(), Err(Error::InvalidConfig(_))));

        let threshold = Config {
            batch_size: 5,
            replenish_threshold: 6,
            ..Config::default()
        };
        assert!(matches!(threshold.validate(), Err(Error::InvalidConfig(_))));

        let loud = Config {
            volume: 1.5,
            ..Config::default()
        };
        assert!(matches!(loud.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn log_file_lives_next_to_config() {
        let path = Path::new("/etc/chime/config.json");
        assert_eq!(log_path(path), PathBuf::from("/etc/chime/random-chime.log"));
    }
}
