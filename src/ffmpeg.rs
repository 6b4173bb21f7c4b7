use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::config::HardwareAccel;
use crate::downloader::errors::AppError;
use crate::downloader::models::MediaKind;
use crate::downloader::traits::ToolRunner;
use crate::downloader::utils::first_error_line;

#[derive(Debug, Deserialize)]
pub struct FFProbeOutput {
    #[serde(default)]
    pub streams: Vec<FFProbeStream>,
}

#[derive(Debug, Deserialize)]
pub struct FFProbeStream {
    pub codec_type: Option<String>,
}

/// ffprobe arguments listing only the video streams of `file`.
pub fn probe_args(file: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        "v".to_string(),
        "-show_entries".to_string(),
        "stream=codec_type".to_string(),
        "-of".to_string(),
        "json".to_string(),
        file.display().to_string(),
    ]
}

/// A file is audio-only when ffprobe reports no video stream.
pub fn classify(probe_json: &str) -> Result<MediaKind, serde_json::Error> {
    let parsed: FFProbeOutput = serde_json::from_str(probe_json)?;
    let has_video = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"));
    Ok(if has_video {
        MediaKind::Video
    } else {
        MediaKind::Audio
    })
}

/// H.264 encoder for the configured acceleration mode
pub fn video_encoder(hwaccel: HardwareAccel) -> &'static str {
    match hwaccel {
        HardwareAccel::Nvidia => "h264_nvenc",
        HardwareAccel::Amd => "h264_amf",
        HardwareAccel::None => "libx264",
    }
}

/// What ffmpeg will be asked to do for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodePlan {
    pub output: PathBuf,
    pub args: Vec<String>,
    pub status: &'static str,
}

/// Build the encode for `source`, writing `<final_stem>.m4a` or `.mp4`.
pub fn plan_encode(
    source: &Path,
    final_stem: &Path,
    kind: MediaKind,
    hwaccel: HardwareAccel,
) -> EncodePlan {
    let mut args = vec!["-i".to_string(), source.display().to_string()];

    let (output, status) = match kind {
        MediaKind::Audio => {
            args.extend(["-vn", "-c:a", "aac"].map(String::from));
            (with_extension(final_stem, "m4a"), "Transcoding audio...")
        }
        MediaKind::Video => {
            args.push("-c:v".to_string());
            args.push(video_encoder(hwaccel).to_string());
            args.extend(["-c:a", "aac"].map(String::from));
            let status = match hwaccel {
                HardwareAccel::Nvidia => "Transcoding with NVENC...",
                HardwareAccel::Amd => "Transcoding with AMF...",
                HardwareAccel::None => "Transcoding...",
            };
            (with_extension(final_stem, "mp4"), status)
        }
    };

    args.push("-y".to_string());
    args.push(output.display().to_string());

    EncodePlan {
        output,
        args,
        status,
    }
}

// Path::with_extension would eat anything after a dot in the title.
fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

pub struct Ffmpeg<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    ffmpeg: &'a Path,
    ffprobe: &'a Path,
}

impl<'a, R: ToolRunner + ?Sized> Ffmpeg<'a, R> {
    pub fn new(runner: &'a R, ffmpeg: &'a Path, ffprobe: &'a Path) -> Self {
        Self {
            runner,
            ffmpeg,
            ffprobe,
        }
    }

    pub async fn probe(&self, file: &Path) -> Result<MediaKind, AppError> {
        let output = self.runner.capture(self.ffprobe, &probe_args(file)).await?;
        let failed = |reason: String| AppError::TranscodeFailed {
            file: file.display().to_string(),
            reason,
        };

        if !output.result.success() {
            return Err(failed(format!(
                "ffprobe: {}",
                first_error_line(&output.stderr)
            )));
        }
        let kind = classify(&output.stdout)
            .map_err(|e| failed(format!("unreadable ffprobe output: {}", e)))?;
        debug!("{} classified as {:?}", file.display(), kind);
        Ok(kind)
    }

    pub async fn encode(&self, source: &Path, plan: &EncodePlan) -> Result<(), AppError> {
        println!("{}", plan.status);
        let result = self.runner.run(self.ffmpeg, &plan.args).await?;
        if !result.success() {
            return Err(AppError::TranscodeFailed {
                file: source.display().to_string(),
                reason: format!("ffmpeg exited with {:?}", result.code),
            });
        }
        Ok(())
    }
}
