//! Configuration file for the bongo cat daemon
//!
//! TOML stored at `~/.config/split-bongo/config.toml`. Timing values have no
//! built-in fallback: they must come from the file or the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bongo_engine::{ConfigError, EngineConfig, FrameTable, SplitBoundary};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key_info::KeyLayout;

/// Errors from loading or validating the config file
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid split.columns: must be greater than zero")]
    ZeroColumns,
    #[error(transparent)]
    Engine(#[from] ConfigError),
}

/// Physical layout of the split keyboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSettings {
    /// Number of positions on the left half. Omit for a non-split board:
    /// every key then counts as the left half.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_key_count: Option<u32>,
    /// Matrix columns per half (for row/column display)
    #[serde(default = "default_columns")]
    pub columns: u32,
}

fn default_columns() -> u32 {
    6
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            left_key_count: None,
            columns: default_columns(),
        }
    }
}

/// Animation timing, in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Idle time after the last release before the cat goes back to rest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
    /// How often idle decay is checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_ms: Option<u64>,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub left_key_count: Option<u32>,
    pub cooldown_ms: Option<u64>,
    pub tick_ms: Option<u64>,
}

/// Complete daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub frames: FrameTable,
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("split-bongo")
            .join("config.toml")
    }

    /// Starter config written by `config init` (Corne-style 3x6 halves)
    pub fn template() -> Self {
        Self {
            split: SplitSettings {
                left_key_count: Some(36),
                columns: 6,
            },
            timing: TimingSettings {
                cooldown_ms: Some(3000),
                tick_ms: Some(250),
            },
            frames: FrameTable::default(),
        }
    }

    /// Load config from a file, or return an empty config if not found
    pub fn load(path: &Path) -> Result<Self, AppConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using command line only", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| AppConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| AppConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, AppConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<(), AppConfigError> {
        let write_err = |source: std::io::Error| AppConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(write_err)?;
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(n) = overrides.left_key_count {
            self.split.left_key_count = Some(n);
        }
        if let Some(ms) = overrides.cooldown_ms {
            self.timing.cooldown_ms = Some(ms);
        }
        if let Some(ms) = overrides.tick_ms {
            self.timing.tick_ms = Some(ms);
        }
    }

    pub fn boundary(&self) -> Result<SplitBoundary, ConfigError> {
        SplitBoundary::from_setting(self.split.left_key_count)
    }

    /// Validate into the engine's configuration
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let cooldown = self
            .timing
            .cooldown_ms
            .ok_or(ConfigError::Missing("timing.cooldown_ms"))?;
        let tick = self
            .timing
            .tick_ms
            .ok_or(ConfigError::Missing("timing.tick_ms"))?;
        EngineConfig::new(
            self.boundary()?,
            Duration::from_millis(cooldown),
            Duration::from_millis(tick),
        )
    }

    pub fn key_layout(&self) -> Result<KeyLayout, AppConfigError> {
        if self.split.columns == 0 {
            return Err(AppConfigError::ZeroColumns);
        }
        Ok(KeyLayout::new(self.boundary()?, self.split.columns))
    }
}
