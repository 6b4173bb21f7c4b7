//! Hardware acceleration setting and where it comes from.
//!
//! The value is read once at startup from `<config_dir>/media-fetch/config.json`
//! and the `MEDIA_FETCH_HWACCEL` environment variable (which wins), then
//! validated by the environment probe. The resulting [`Config`] is passed to
//! whoever needs it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::downloader::errors::AppError;

pub const HWACCEL_ENV: &str = "MEDIA_FETCH_HWACCEL";
const CONFIG_DIR_NAME: &str = "media-fetch";
const CONFIG_FILE_NAME: &str = "config.json";

/// Which H.264 encoder implementation the transcoder should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HardwareAccel {
    /// Software encoding on the CPU
    #[default]
    None,
    /// NVENC
    Nvidia,
    /// AMF
    Amd,
}

impl fmt::Display for HardwareAccel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Nvidia => write!(f, "nvidia"),
            Self::Amd => write!(f, "amd"),
        }
    }
}

impl FromStr for HardwareAccel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "nvidia" => Ok(Self::Nvidia),
            "amd" => Ok(Self::Amd),
            other => Err(AppError::InvalidConfig(format!(
                "Unknown hardware acceleration method '{}' (expected none, nvidia or amd)",
                other
            ))),
        }
    }
}

/// Unvalidated settings as found in the config file / environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub hwaccel: Option<String>,
}

/// Validated settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub hwaccel: HardwareAccel,
}

impl RawConfig {
    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default file and the process environment.
    pub fn load() -> Result<Self, AppError> {
        let env_value = std::env::var(HWACCEL_ENV).ok();
        Self::from_sources(Self::default_path().as_deref(), env_value)
    }

    /// File first, then the environment value on top. A missing file is fine.
    pub fn from_sources(file: Option<&Path>, env_value: Option<String>) -> Result<Self, AppError> {
        let mut raw = match file {
            Some(path) if path.exists() => Self::read_file(path)?,
            _ => Self::default(),
        };

        if let Some(value) = env_value {
            debug!("{} overrides hwaccel with '{}'", HWACCEL_ENV, value);
            raw.hwaccel = Some(value);
        }

        Ok(raw)
    }

    fn read_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        let raw: Self = serde_json::from_str(&content).map_err(|e| {
            AppError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        debug!("loaded config from {}", path.display());
        Ok(raw)
    }

    pub fn validate(&self) -> Result<Config, AppError> {
        let hwaccel = match &self.hwaccel {
            Some(value) => value.parse()?,
            None => HardwareAccel::default(),
        };
        Ok(Config { hwaccel })
    }
}
