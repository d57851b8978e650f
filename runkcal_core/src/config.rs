//! Configuration file support for runkcal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/runkcal/config.toml`.

use crate::{Error, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub clock: ClockConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Time zone used for date-keys and month boundaries
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClockConfig {
    /// IANA time zone name, e.g. `Asia/Tokyo`
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
        }
    }
}

/// File locations under a data directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataPaths {
    pub settings: PathBuf,
    pub log_dir: PathBuf,
    pub live_log: PathBuf,
    pub archive: PathBuf,
}

impl DataPaths {
    pub fn under(data_dir: &Path) -> Self {
        let log_dir = data_dir.join("wal");
        Self {
            settings: data_dir.join("settings.json"),
            live_log: log_dir.join("runs.wal"),
            log_dir,
            archive: data_dir.join("runs.csv"),
        }
    }
}

// Default value functions
fn home_dir_or_cwd() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir_or_cwd().join(".local/share"));
    base.join("runkcal")
}

fn default_time_zone() -> String {
    "UTC".into()
}

/// Parse an IANA time zone name
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::Config(format!("Unknown time zone {:?}: {}", name, e)))
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir_or_cwd().join(".config"));
        base.join("runkcal").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// The configured time zone
    pub fn time_zone(&self) -> Result<Tz> {
        parse_time_zone(&self.clock.time_zone)
    }
}
