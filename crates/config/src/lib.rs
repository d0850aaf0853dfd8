use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Failed to read file {0}: {1}")]
    FileReadError(String, String),

    #[error("Failed to parse YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

pub const CONFIG_FILE_ENV: &str = "GAMEFORGE_CONFIG_FILE";
pub const DATA_DIR_ENV: &str = "GAMEFORGE_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "GAMEFORGE_LOG_LEVEL";
pub const TIME_ZONE_ENV: &str = "GAMEFORGE_TIME_ZONE";
pub const TICK_SECS_ENV: &str = "GAMEFORGE_TICK_SECS";

const DEFAULT_CONFIG_FILE: &str = "gameforge.yaml";

/// Runtime configuration of a GameForge process.
///
/// Only deployment concerns live here. The rules of the process itself
/// (phase length, vote thresholds, XP tables) are fixed in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Directory the snapshot store writes into
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Storage key of the rulebook snapshot
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// IANA name of the community's time zone, used for the daily reset
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// How often the scheduler loop checks for due work
    #[serde(default = "default_scheduler_tick_secs")]
    pub scheduler_tick_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_snapshot_key() -> String {
    "sandbox-game.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_time_zone() -> String {
    "America/New_York".to_string()
}

fn default_scheduler_tick_secs() -> u64 {
    30
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_key: default_snapshot_key(),
            log_level: default_log_level(),
            time_zone: default_time_zone(),
            scheduler_tick_secs: default_scheduler_tick_secs(),
        }
    }
}

impl ForgeConfig {
    /// Load configuration: the YAML file named by `GAMEFORGE_CONFIG_FILE`
    /// (or `gameforge.yaml` if present), then environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = env::var(CONFIG_FILE_ENV).ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let base = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else if let Some(path) = explicit {
            return Err(ConfigError::FileReadError(path, "file does not exist".to_string()));
        } else {
            debug!("No config file found, using defaults");
            Self::default()
        };

        let config = base.with_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(path.display().to_string(), e.to_string()))?;

        let config: ForgeConfig = serde_yaml::from_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
        if let Some(zone) = lookup(TIME_ZONE_ENV) {
            if zone.trim().parse::<Tz>().is_err() {
                return Err(ConfigError::InvalidEnvVar(TIME_ZONE_ENV.to_string(), zone));
            }
            self.time_zone = zone.trim().to_string();
        }
        if let Some(raw) = lookup(TICK_SECS_ENV) {
            self.scheduler_tick_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar(TICK_SECS_ENV.to_string(), raw.clone()))?;
        }
        Ok(self)
    }

    /// The configured time zone
    pub fn zone(&self) -> Result<Tz> {
        self.time_zone
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown time zone: {}", self.time_zone)))
    }

    pub fn validate(&self) -> Result<()> {
        self.zone()?;
        if self.scheduler_tick_secs == 0 {
            return Err(ConfigError::Invalid("scheduler_tick_secs must be positive".to_string()));
        }
        if self.snapshot_key.trim().is_empty() {
            return Err(ConfigError::Invalid("snapshot_key must not be empty".to_string()));
        }
        Ok(())
    }
}
