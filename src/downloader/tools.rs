use std::path::PathBuf;

use tracing::{debug, info};

use super::errors::AppError;
use super::models::{ToolAvailability, ToolPaths};
use crate::config::{Config, HardwareAccel, RawConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
    Ffprobe,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
            ToolType::Ffprobe => "ffprobe",
        }
    }
}

/// Resolves tool binaries. The lookup is injectable so tests can pretend a
/// tool is missing without touching PATH.
pub struct ToolManager<F = fn(&str) -> Option<PathBuf>>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    lookup: F,
}

fn which_lookup(binary: &str) -> Option<PathBuf> {
    which::which(binary).ok()
}

impl ToolManager {
    pub fn new() -> Self {
        Self {
            lookup: which_lookup,
        }
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> ToolManager<F>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    pub fn find(&self, tool: ToolType) -> Option<PathBuf> {
        let found = (self.lookup)(tool.as_str());
        debug!("lookup {} -> {:?}", tool.as_str(), found);
        found
    }

    pub fn availability(&self) -> ToolAvailability {
        ToolAvailability {
            downloader_present: self.find(ToolType::YtDlp).is_some(),
            transcoder_present: self.find(ToolType::Ffmpeg).is_some(),
            prober_present: self.find(ToolType::Ffprobe).is_some(),
        }
    }

    pub fn require(&self, tool: ToolType) -> Result<PathBuf, AppError> {
        self.find(tool).ok_or_else(|| AppError::MissingTool {
            tool: tool.as_str().to_string(),
        })
    }

    /// Resolve every tool, failing on the first one that is missing.
    pub fn require_all(&self) -> Result<ToolPaths, AppError> {
        Ok(ToolPaths {
            ytdlp: self.require(ToolType::YtDlp)?,
            ffmpeg: self.require(ToolType::Ffmpeg)?,
            ffprobe: self.require(ToolType::Ffprobe)?,
        })
    }
}

/// Everything the pipeline needs from the environment
#[derive(Debug, Clone)]
pub struct Environment {
    pub tools: ToolPaths,
    pub config: Config,
}

/// Check the tools, then load and validate the hardware acceleration value.
/// Runs before any other work so a broken setup never reaches the network.
pub fn probe_environment<F, L>(
    manager: &ToolManager<F>,
    load_config: L,
) -> Result<Environment, AppError>
where
    F: Fn(&str) -> Option<PathBuf>,
    L: FnOnce() -> Result<RawConfig, AppError>,
{
    let availability = manager.availability();
    if !availability.all_present() {
        debug!("tool availability: {:?}", availability);
    }
    let tools = manager.require_all()?;
    let config = load_config()?.validate()?;

    match config.hwaccel {
        HardwareAccel::Nvidia => {
            println!("[Info] Hardware accelerated encoding enabled: Nvidia NVENC")
        }
        HardwareAccel::Amd => println!("[Info] Hardware accelerated encoding enabled: AMD AMF"),
        HardwareAccel::None => {}
    }
    info!(
        "environment ok: yt-dlp={} ffmpeg={} hwaccel={}",
        tools.ytdlp.display(),
        tools.ffmpeg.display(),
        config.hwaccel
    );

    Ok(Environment { tools, config })
}
