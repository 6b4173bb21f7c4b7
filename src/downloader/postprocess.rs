// Compatibility transcode: find each downloaded file, re-encode it to
// MPEG-4 under its final name, then remove the original.

use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::errors::AppError;
use super::models::{ResolvedFilename, TranscodeOutcome};
use super::traits::ToolRunner;
use crate::config::Config;
use crate::ffmpeg::{plan_encode, Ffmpeg};

lazy_static! {
    // Greedy prefix so the last marker wins if a title contains one too.
    static ref MARKER_RE: Regex = Regex::new(r"^(?P<stem>.*)-download-[^/\\]+$").unwrap();
    // yt-dlp leftovers that must never be picked as the downloaded file
    static ref PARTIAL_RE: Regex =
        Regex::new(r"(\.part|\.ytdl|\.temp|\.part-Frag\d+)$|\.(f\d+|temp)\.[^.]+$").unwrap();
}

/// Find the file yt-dlp wrote for `predicted`.
///
/// The exact path wins. Otherwise the sibling `<name>.<ext>` files are
/// considered, skipping partial/intermediate downloads, and the first one in
/// name order is taken.
pub fn locate_download(predicted: &str) -> Result<PathBuf, AppError> {
    let exact = Path::new(predicted);
    if exact.is_file() {
        return Ok(exact.to_path_buf());
    }

    let not_found = || AppError::FileNotFoundAfterDownload(predicted.to_string());

    let file_name = exact
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(not_found)?;
    let parent = match exact.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!("{}.", file_name);

    let entries = match fs::read_dir(&parent) {
        Ok(entries) => entries,
        Err(_) => return Err(not_found()),
    };

    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.len() > prefix.len() && name.starts_with(&prefix))
        .filter(|name| !PARTIAL_RE.is_match(name))
        .collect();
    candidates.sort();

    let chosen = candidates.first().ok_or_else(not_found)?;
    if candidates.len() > 1 {
        warn!(
            "several files match {}: using {}, ignoring {:?}",
            predicted,
            chosen,
            &candidates[1..]
        );
    }

    Ok(with_parent(exact, chosen))
}

fn with_parent(predicted: &Path, name: &str) -> PathBuf {
    match predicted.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.join(name),
        _ => PathBuf::from(name),
    }
}

/// Output path without extension: the predicted name minus the
/// `-download-<id>` marker.
pub fn final_stem(predicted: &str) -> Result<PathBuf, AppError> {
    let stem = MARKER_RE
        .captures(predicted)
        .and_then(|caps| caps.name("stem"))
        .map(|m| m.as_str())
        .filter(|stem| !stem.is_empty() && !stem.ends_with('/') && !stem.ends_with('\\'))
        .ok_or_else(|| {
            AppError::FilenameResolutionFailed(format!(
                "'{}' does not carry the download marker",
                predicted
            ))
        })?;
    Ok(PathBuf::from(stem))
}

/// Try to delete the pre-transcode file. Failure is only a warning.
fn remove_source(source: &Path) -> bool {
    match fs::remove_file(source) {
        Ok(()) => true,
        Err(e) => {
            warn!("could not delete {}: {}", source.display(), e);
            println!(
                "[Warn] Could not delete {}! Is it open in another program?",
                source.display()
            );
            false
        }
    }
}

pub struct PostProcessor<'a, R: ToolRunner + ?Sized> {
    ffmpeg: Ffmpeg<'a, R>,
    config: Config,
}

impl<'a, R: ToolRunner + ?Sized> PostProcessor<'a, R> {
    pub fn new(ffmpeg: Ffmpeg<'a, R>, config: Config) -> Self {
        Self { ffmpeg, config }
    }

    /// Locate, classify, re-encode and clean up one predicted file.
    pub async fn process(&self, predicted: &ResolvedFilename) -> Result<TranscodeOutcome, AppError> {
        let source = locate_download(predicted.as_str())?;
        let stem = final_stem(predicted.as_str())?;
        let kind = self.ffmpeg.probe(&source).await?;

        let plan = plan_encode(&source, &stem, kind, self.config.hwaccel);
        // a failed encode leaves the original in place
        self.ffmpeg.encode(&source, &plan).await?;

        let source_deleted = remove_source(&source);
        info!(
            "transcoded {} -> {}",
            source.display(),
            plan.output.display()
        );

        Ok(TranscodeOutcome {
            source,
            output: plan.output,
            kind,
            source_deleted,
        })
    }

    /// Process every item in order, stopping at the first failure.
    pub async fn process_all(
        &self,
        predicted: &[ResolvedFilename],
    ) -> Result<Vec<TranscodeOutcome>, AppError> {
        let mut outcomes = Vec::with_capacity(predicted.len());
        for name in predicted {
            outcomes.push(self.process(name).await?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareAccel;
    use crate::downloader::models::MediaKind;
    use crate::downloader::utils::testing::{FakeRunner, Reply};
    use std::fs;
    use tempfile::tempdir;

    const VIDEO_PROBE: &str = r#"{"streams": [{"codec_type": "video"}]}"#;
    const AUDIO_PROBE: &str = r#"{"streams": []}"#;

    fn touch(path: &Path) {
        fs::write(path, b"media").unwrap();
    }

    fn name(path: &Path) -> String {
        path.display().to_string()
    }

    #[test]
    fn test_locate_exact_file() {
        let dir = tempdir().unwrap();
        let exact = dir.path().join("clip-download-1");
        touch(&exact);
        assert_eq!(locate_download(&name(&exact)).unwrap(), exact);
    }

    #[test]
    fn test_locate_by_extension() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("clip-download-1.webm"));
        let predicted = dir.path().join("clip-download-1");
        assert_eq!(
            locate_download(&name(&predicted)).unwrap(),
            dir.path().join("clip-download-1.webm")
        );
    }

    #[test]
    fn test_locate_skips_partials_and_sorts() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("clip-download-1.webm.part"));
        touch(&dir.path().join("clip-download-1.f137.mp4"));
        touch(&dir.path().join("clip-download-1.temp.aac"));
        touch(&dir.path().join("clip-download-1.mp4"));
        touch(&dir.path().join("clip-download-1.mkv"));
        touch(&dir.path().join("clip-download-10.mp4"));
        let predicted = dir.path().join("clip-download-1");
        assert_eq!(
            locate_download(&name(&predicted)).unwrap(),
            dir.path().join("clip-download-1.mkv")
        );
    }

    #[test]
    fn test_locate_ignores_postprocessor_intermediate() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("song-download-7.temp.m4a"));
        let predicted = dir.path().join("song-download-7");
        assert!(matches!(
            locate_download(&name(&predicted)),
            Err(AppError::FileNotFoundAfterDownload(_))
        ));

        touch(&dir.path().join("song-download-7.opus"));
        assert_eq!(
            locate_download(&name(&predicted)).unwrap(),
            dir.path().join("song-download-7.opus")
        );
    }

    #[test]
    fn test_locate_missing() {
        let dir = tempdir().unwrap();
        let predicted = dir.path().join("nothing-download-9");
        assert!(matches!(
            locate_download(&name(&predicted)),
            Err(AppError::FileNotFoundAfterDownload(_))
        ));
    }

    #[test]
    fn test_locate_after_transcode_fails() {
        // rerunning on an already converted item must not pick the output
        let dir = tempdir().unwrap();
        touch(&dir.path().join("video.mp4"));
        let predicted = dir.path().join("video-download-42");
        assert!(matches!(
            locate_download(&name(&predicted)),
            Err(AppError::FileNotFoundAfterDownload(_))
        ));
    }

    #[test]
    fn test_final_stem() {
        assert_eq!(final_stem("video-download-42").unwrap(), PathBuf::from("video"));
        assert_eq!(
            final_stem("out/My_Song-download-dQw4w9WgXcQ").unwrap(),
            PathBuf::from("out/My_Song")
        );
        assert_eq!(
            final_stem("how-download-works-download-a-b_c").unwrap(),
            PathBuf::from("how-download-works")
        );
    }

    #[test]
    fn test_final_stem_requires_marker() {
        assert!(matches!(
            final_stem("plain_title"),
            Err(AppError::FilenameResolutionFailed(_))
        ));
        assert!(final_stem("-download-42").is_err());
        assert!(final_stem("out/-download-42").is_err());
    }

    #[tokio::test]
    async fn test_video_transcoded_with_hw_encoder_then_deleted() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("video-download-42.mp4");
        touch(&source);

        let runner = FakeRunner::new();
        runner.reply("ffprobe", Reply::ok(VIDEO_PROBE));
        let tools = FakeRunner::tools();
        let processor = PostProcessor::new(
            Ffmpeg::new(&runner, &tools.ffmpeg, &tools.ffprobe),
            Config {
                hwaccel: HardwareAccel::Amd,
            },
        );

        let predicted = ResolvedFilename(name(&dir.path().join("video-download-42")));
        let outcome = processor.process(&predicted).await.unwrap();

        assert_eq!(outcome.kind, MediaKind::Video);
        assert_eq!(outcome.output, dir.path().join("video.mp4"));
        assert!(outcome.source_deleted);
        assert!(!source.exists());

        let encode = &runner.calls_to("ffmpeg")[0];
        assert!(encode.args.contains(&"h264_amf".to_string()));
        assert_eq!(encode.args.last().unwrap(), &name(&dir.path().join("video.mp4")));
    }

    #[tokio::test]
    async fn test_audio_goes_to_m4a() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("song-download-7.opus"));

        let runner = FakeRunner::new();
        runner.reply("ffprobe", Reply::ok(AUDIO_PROBE));
        let tools = FakeRunner::tools();
        let processor = PostProcessor::new(
            Ffmpeg::new(&runner, &tools.ffmpeg, &tools.ffprobe),
            Config::default(),
        );

        let predicted = ResolvedFilename(name(&dir.path().join("song-download-7")));
        let outcome = processor.process(&predicted).await.unwrap();

        assert_eq!(outcome.kind, MediaKind::Audio);
        assert_eq!(outcome.output, dir.path().join("song.m4a"));
        let encode = &runner.calls_to("ffmpeg")[0];
        assert!(encode.args.contains(&"-vn".to_string()));
    }

    #[tokio::test]
    async fn test_failed_encode_keeps_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("clip-download-3.webm");
        touch(&source);

        let runner = FakeRunner::new();
        runner.reply("ffprobe", Reply::ok(VIDEO_PROBE));
        runner.reply("ffmpeg", Reply::fail(1));
        let tools = FakeRunner::tools();
        let processor = PostProcessor::new(
            Ffmpeg::new(&runner, &tools.ffmpeg, &tools.ffprobe),
            Config::default(),
        );

        let predicted = ResolvedFilename(name(&dir.path().join("clip-download-3")));
        let result = processor.process(&predicted).await;

        assert!(matches!(result, Err(AppError::TranscodeFailed { .. })));
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_process_all_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b-download-2.mp4"));

        let runner = FakeRunner::new();
        let tools = FakeRunner::tools();
        let processor = PostProcessor::new(
            Ffmpeg::new(&runner, &tools.ffmpeg, &tools.ffprobe),
            Config::default(),
        );

        let names = vec![
            ResolvedFilename(name(&dir.path().join("a-download-1"))),
            ResolvedFilename(name(&dir.path().join("b-download-2"))),
        ];
        let result = processor.process_all(&names).await;

        assert!(matches!(result, Err(AppError::FileNotFoundAfterDownload(_))));
        assert!(runner.calls().is_empty());
        assert!(dir.path().join("b-download-2.mp4").exists());
    }
}
