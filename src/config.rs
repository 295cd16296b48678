//! Application configuration, read from an optional `~/.eartrain/config.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::SoundSet;
use crate::generate::{IntervalSettings, MelodySettings};
use crate::preset::{default_preset_dir, DEFAULT_GLOBAL_CREDENTIAL};
use crate::rhythm::Tempo;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level settings. Every field has a default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tempo: Tempo,
    pub sound_set: SoundSet,
    /// Fixed seed for generators and noise voices; random when absent.
    pub seed: Option<u64>,
    pub interval: IntervalSettings,
    pub melody: MelodySettings,
    pub presets: PresetConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    pub dir: PathBuf,
    /// Base URL of the shared collection, if any.
    pub global_url: Option<String>,
    pub global_credential: String,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            dir: default_preset_dir(),
            global_url: None,
            global_credential: DEFAULT_GLOBAL_CREDENTIAL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Frames rendered per block.
    pub block_size: usize,
    pub lookahead_ms: u32,
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            lookahead_ms: 100,
            volume: 0.8,
        }
    }
}

impl AudioConfig {
    pub fn lookahead_seconds(&self) -> f64 {
        self.lookahead_ms as f64 / 1000.0
    }
}

/// `~/.eartrain/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".eartrain").join("config.yaml"))
}

impl AppConfig {
    /// Load from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default location, if there is a home directory.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}
