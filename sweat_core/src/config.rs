//! Configuration file support for Sweat.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/sweat/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub limits: Limits,
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

/// Validation bounds for catalog entities and sessions
///
/// These are injected into the engine at construction; call sites never
/// hard-code them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_session_name_len")]
    pub max_session_name_len: usize,

    #[serde(default = "default_min_workout_minutes")]
    pub min_workout_minutes: u32,

    #[serde(default = "default_max_workout_minutes")]
    pub max_workout_minutes: u32,

    #[serde(default = "default_min_action_points")]
    pub min_action_points: u32,

    #[serde(default = "default_max_action_points")]
    pub max_action_points: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_session_name_len: default_max_session_name_len(),
            min_workout_minutes: default_min_workout_minutes(),
            max_workout_minutes: default_max_workout_minutes(),
            min_action_points: default_min_action_points(),
            max_action_points: default_max_action_points(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("sweat")
}

fn default_max_session_name_len() -> usize {
    100
}

fn default_min_workout_minutes() -> u32 {
    1
}

fn default_max_workout_minutes() -> u32 {
    480
}

fn default_min_action_points() -> u32 {
    1
}

fn default_max_action_points() -> u32 {
    1000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("sweat").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject bound configurations that no catalog entity could satisfy
    fn validate(&self) -> Result<()> {
        if self.limits.max_session_name_len == 0 {
            return Err(Error::Config(
                "limits.max_session_name_len must be positive".into(),
            ));
        }
        if self.limits.min_workout_minutes == 0
            || self.limits.min_workout_minutes > self.limits.max_workout_minutes
        {
            return Err(Error::Config(format!(
                "invalid workout duration bounds: {}..{}",
                self.limits.min_workout_minutes, self.limits.max_workout_minutes
            )));
        }
        if self.limits.min_action_points == 0
            || self.limits.min_action_points > self.limits.max_action_points
        {
            return Err(Error::Config(format!(
                "invalid action point bounds: {}..{}",
                self.limits.min_action_points, self.limits.max_action_points
            )));
        }
        Ok(())
    }
}
