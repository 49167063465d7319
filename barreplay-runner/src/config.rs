//! Replay configuration loaded from TOML.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults of a standard A-share replay (1,000,000 cash, 100-share lots).

use barreplay_core::data::EligibilityPolicy;
use barreplay_core::session::{DEFAULT_INITIAL_CASH, DEFAULT_LOT_SIZE};
use barreplay_core::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level replay configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub session: SessionSection,
    pub selection: EligibilityPolicy,
    pub data: DataSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub initial_cash: f64,
    pub lot_size: u64,
    /// Order size used when a command omits the volume.
    pub default_volume: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            lot_size: DEFAULT_LOT_SIZE,
            default_volume: DEFAULT_LOT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory of `<ticker>.csv` files.
    pub dir: PathBuf,
    /// Seed for game selection. Unset means a fresh random game every time.
    pub seed: Option<u64>,
    /// Play on generated bars instead of the CSV directory.
    pub synthetic: bool,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("stockinfo"),
            seed: None,
            synthetic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Root directory for settlement artifacts.
    pub dir: PathBuf,
    /// JSONL file collecting one line per finished game.
    pub history_file: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            history_file: None,
        }
    }
}

impl OutputSection {
    /// `history_file`, or `history.jsonl` inside the artifact directory.
    pub fn history_path(&self) -> PathBuf {
        self.history_file
            .clone()
            .unwrap_or_else(|| self.dir.join("history.jsonl"))
    }
}

impl ReplayConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.session;
        if !(s.initial_cash.is_finite() && s.initial_cash > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "session.initial_cash must be positive, got {}",
                s.initial_cash
            )));
        }
        if s.lot_size == 0 {
            return Err(ConfigError::Invalid("session.lot_size must be at least 1".into()));
        }
        if s.default_volume == 0 || s.default_volume % s.lot_size != 0 {
            return Err(ConfigError::Invalid(format!(
                "session.default_volume {} is not a positive multiple of lot size {}",
                s.default_volume, s.lot_size
            )));
        }
        if self.selection.min_remaining == 0 {
            return Err(ConfigError::Invalid(
                "selection.min_remaining must be at least 1".into(),
            ));
        }
        if self.selection.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "selection.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            initial_cash: self.session.initial_cash,
            lot_size: self.session.lot_size,
        }
    }
}
