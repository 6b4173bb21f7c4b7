// Error types for the download/transcode pipeline

use thiserror::Error;

use super::models::RunMode;

#[derive(Debug, Error)]
pub enum AppError {
    /// yt-dlp, ffmpeg or ffprobe not found on PATH
    #[error("{tool} not found. Please install {tool}.")]
    MissingTool { tool: String },

    /// Hardware acceleration value or config file is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Token on the command line that is not a known option
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// Command line is structurally wrong (no URL, folder flag without value)
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The downloader rejected the URL during the media check
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The downloader could not predict output filenames
    #[error("Could not get filename: {0}")]
    FilenameResolutionFailed(String),

    /// The downloader exited with a non-zero status
    #[error("Download failed (exit code {})", fmt_code(.code))]
    DownloadFailed { code: Option<i32> },

    /// No file on disk matches a predicted filename
    #[error("Could not find downloaded file for {0}.")]
    FileNotFoundAfterDownload(String),

    /// ffprobe or ffmpeg failed on a downloaded file
    #[error("Transcoding failed for {file}: {reason}")]
    TranscodeFailed { file: String, reason: String },

    /// An external program could not be started at all
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl AppError {
    /// Map error to a process exit code (sysexits.h where one fits).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownOption(_) | Self::InvalidArguments(_) => 2, // EX_USAGE
            Self::MissingTool { .. } => 69,                          // EX_UNAVAILABLE
            Self::InvalidConfig(_) => 78,                            // EX_CONFIG
            Self::Io(_) => 74,                                       // EX_IOERR
            Self::Spawn { .. } => 71,                                // EX_OSERR
            _ => 1,
        }
    }

    /// Text shown to the user. Interactive runs get a hint on what to do next
    /// since the window usually closes right after.
    pub fn user_message(&self, mode: RunMode) -> String {
        let interactive = mode == RunMode::Interactive;
        match self {
            Self::InvalidUrl(_) if interactive => {
                "[Error] Media check failed. Check your URL and try again.".to_string()
            }
            Self::InvalidUrl(_) => "[Error] Invalid URL.".to_string(),
            Self::FilenameResolutionFailed(_) if interactive => {
                "[Error] Could not get filename. Check your URL and try again.".to_string()
            }
            Self::FilenameResolutionFailed(_) => "[Error] Could not get filename.".to_string(),
            Self::DownloadFailed { .. } if interactive => {
                "[Error] Download failed. Restart the program and try again.".to_string()
            }
            Self::DownloadFailed { .. } => "[Error] Download failed.".to_string(),
            Self::TranscodeFailed { .. } if interactive => {
                "[Error] An error occurred during transcoding.".to_string()
            }
            Self::TranscodeFailed { .. } => "[Error] Transcoding failed.".to_string(),
            Self::UnknownOption(token) => format!("Unknown option: {}", token),
            other => format!("[Error] {}", other),
        }
    }
}
