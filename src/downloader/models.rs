// Common data models for the pipeline

use std::path::PathBuf;

/// Output naming pattern handed to yt-dlp when no folder is given.
pub const DEFAULT_FILEFORMAT: &str = "%(title)s";

/// Suffix appended in compatibility mode. The id lets the post-processor find
/// the pre-transcode file and strip the suffix again for the final name.
pub const COMPAT_MARKER: &str = "-download-";
pub const COMPAT_SUFFIX: &str = "-download-%(id)s";

/// How the request was gathered; decides how errors are presented and
/// whether the program waits before closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// URL and flags came from the command line
    Direct,
    /// URL and answers came from the prompt sequence
    Interactive,
}

/// Normalized request consumed by the rest of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub audio_only: bool,
    pub compatibility_mode: bool,
    /// Empty means the current directory
    pub folder: String,
    pub skip_check: bool,
    pub fileformat: String,
}

impl DownloadRequest {
    /// Build a request, applying URL truncation and the compatibility marker.
    pub fn new(
        url: &str,
        audio_only: bool,
        compatibility_mode: bool,
        folder: &str,
        skip_check: bool,
    ) -> Self {
        let mut fileformat = DEFAULT_FILEFORMAT.to_string();
        if compatibility_mode {
            fileformat.push_str(COMPAT_SUFFIX);
        }

        Self {
            url: truncate_url(url).to_string(),
            audio_only,
            compatibility_mode,
            folder: folder.to_string(),
            skip_check,
            fileformat,
        }
    }

    /// The `-o` value shared by filename prediction and the real download.
    pub fn output_template(&self) -> String {
        if self.folder.is_empty() {
            self.fileformat.clone()
        } else {
            format!("{}/{}", self.folder, self.fileformat)
        }
    }
}

/// Strip tracking and playlist suffixes: everything from the first `&` on.
pub fn truncate_url(url: &str) -> &str {
    url.split('&').next().unwrap_or(url)
}

/// Absolute locations of the external tools found on PATH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Result of the startup PATH check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    pub downloader_present: bool,
    pub transcoder_present: bool,
    pub prober_present: bool,
}

impl ToolAvailability {
    pub fn all_present(&self) -> bool {
        self.downloader_present && self.transcoder_present && self.prober_present
    }
}

/// Exit status of an external invocation. `code` is `None` when the process
/// was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    pub code: Option<i32>,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Captured output of an external invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub result: ProcessResult,
    pub stdout: String,
    pub stderr: String,
}

/// Predicted output path (as yt-dlp reported it) for one media item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilename(pub String);

impl ResolvedFilename {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stream classification of a downloaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// No video stream
    Audio,
    Video,
}

/// What happened to one item in the post-processing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: MediaKind,
    /// False when the source could not be removed (non-fatal)
    pub source_deleted: bool,
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub titles: Vec<String>,
    pub predicted: Vec<ResolvedFilename>,
    pub transcoded: Vec<TranscodeOutcome>,
}
