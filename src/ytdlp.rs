//! yt-dlp invocations: media check, filename prediction and the download.
//!
//! All three calls share the request's output template, so the names predicted
//! here are the names the download produces (modulo extension).

use std::path::Path;

use tracing::{debug, info};

use crate::downloader::errors::AppError;
use crate::downloader::models::{DownloadRequest, ResolvedFilename, RunMode};
use crate::downloader::traits::ToolRunner;
use crate::downloader::utils::{first_error_line, output_lines};

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// `--get-title` dry run used to reject bad URLs early.
pub fn check_args(url: &str) -> Vec<String> {
    let mut args = strings(&[
        "--no-playlist",
        "--flat-playlist",
        "--no-warnings",
        "--get-title",
        "--",
    ]);
    args.push(url.to_string());
    args
}

/// `--get-filename` dry run with the same template the download uses.
pub fn filename_args(request: &DownloadRequest) -> Vec<String> {
    let mut args = strings(&[
        "--no-playlist",
        "--flat-playlist",
        "--get-filename",
        "--restrict-filenames",
        "--no-warnings",
        "-o",
    ]);
    args.push(request.output_template());
    args.push("--".to_string());
    args.push(request.url.clone());
    args
}

/// The real download.
pub fn download_args(request: &DownloadRequest) -> Vec<String> {
    let mut args = vec!["--progress".to_string()];
    if request.audio_only {
        args.push("-x".to_string());
    }
    args.extend(strings(&["--restrict-filenames", "--no-playlist", "-o"]));
    args.push(request.output_template());
    args.push("--".to_string());
    args.push(request.url.clone());
    args
}

pub struct YtDlp<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    binary: &'a Path,
}

impl<'a, R: ToolRunner + ?Sized> YtDlp<'a, R> {
    pub fn new(runner: &'a R, binary: &'a Path) -> Self {
        Self { runner, binary }
    }

    /// Ask yt-dlp for the title(s) behind `url`. Prints them with a count.
    pub async fn check_url(&self, url: &str) -> Result<Vec<String>, AppError> {
        println!("Checking media...");
        let output = self.runner.capture(self.binary, &check_args(url)).await?;

        if !output.result.success() {
            let reason = first_error_line(&output.stderr);
            debug!("media check failed for {}: {}", url, reason);
            return Err(AppError::InvalidUrl(reason));
        }

        let titles = output_lines(&output.stdout);
        println!("Found media:");
        for title in &titles {
            println!("- {}", title);
        }
        println!("Total: {}", titles.len());
        Ok(titles)
    }

    /// Predict the output path of every item the download will produce.
    pub async fn predict_filenames(
        &self,
        request: &DownloadRequest,
        mode: RunMode,
    ) -> Result<Vec<ResolvedFilename>, AppError> {
        let output = self
            .runner
            .capture(self.binary, &filename_args(request))
            .await?;

        if !output.result.success() {
            let reason = first_error_line(&output.stderr);
            debug!("filename prediction failed: {}", reason);
            return Err(AppError::FilenameResolutionFailed(reason));
        }

        if mode == RunMode::Direct {
            println!("Filename(s): {}", output.stdout.trim());
        }

        let names: Vec<ResolvedFilename> = output_lines(&output.stdout)
            .into_iter()
            .map(ResolvedFilename)
            .collect();
        if names.is_empty() {
            return Err(AppError::FilenameResolutionFailed(
                "yt-dlp reported no filenames".to_string(),
            ));
        }
        info!("predicted {} filename(s)", names.len());
        Ok(names)
    }

    /// Run the download with the terminal attached so progress is visible.
    pub async fn download(&self, request: &DownloadRequest) -> Result<(), AppError> {
        println!("Downloading...");
        let result = self
            .runner
            .run(self.binary, &download_args(request))
            .await?;

        if !result.success() {
            return Err(AppError::DownloadFailed { code: result.code });
        }
        println!("Success!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::utils::testing::{FakeRunner, Reply};
    use std::path::PathBuf;

    fn request(flags: (bool, bool), folder: &str) -> DownloadRequest {
        DownloadRequest::new(
            "https://example.com/watch?v=abc&list=xyz",
            flags.0,
            flags.1,
            folder,
            false,
        )
    }

    #[test]
    fn test_download_args_default() {
        let args = download_args(&request((false, false), ""));
        assert_eq!(
            args,
            vec![
                "--progress",
                "--restrict-filenames",
                "--no-playlist",
                "-o",
                "%(title)s",
                "--",
                "https://example.com/watch?v=abc",
            ]
        );
    }

    #[test]
    fn test_download_args_audio_in_folder() {
        let args = download_args(&request((true, false), "myfolder"));
        assert_eq!(args[0], "--progress");
        assert_eq!(args[1], "-x");
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "myfolder/%(title)s");
        assert_eq!(args.last().unwrap(), "https://example.com/watch?v=abc");
    }

    #[test]
    fn test_prediction_and_download_share_template() {
        let req = request((false, true), "out");
        let predict = filename_args(&req);
        let download = download_args(&req);
        let template = |args: &[String]| {
            let o = args.iter().position(|a| a == "-o").unwrap();
            args[o + 1].clone()
        };
        assert_eq!(template(&predict), template(&download));
        assert_eq!(template(&predict), "out/%(title)s-download-%(id)s");
        assert!(predict.contains(&"--get-filename".to_string()));
    }

    #[test]
    fn test_check_args() {
        let args = check_args("https://example.com/x");
        assert!(args.contains(&"--get-title".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert_eq!(args[args.len() - 2], "--");
    }

    #[tokio::test]
    async fn test_check_url_lists_titles() {
        let runner = FakeRunner::new();
        runner.reply("yt-dlp", Reply::ok("Part one\nPart two\n"));
        let bin = PathBuf::from("yt-dlp");

        let titles = YtDlp::new(&runner, &bin).check_url("u").await.unwrap();
        assert_eq!(titles, vec!["Part one", "Part two"]);
        assert!(runner.calls()[0].captured);
    }

    #[tokio::test]
    async fn test_check_url_failure_is_invalid_url() {
        let runner = FakeRunner::new();
        runner.reply("yt-dlp", Reply::fail(1));
        let bin = PathBuf::from("yt-dlp");

        let result = YtDlp::new(&runner, &bin).check_url("u").await;
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_predict_failure_is_distinct() {
        let runner = FakeRunner::new();
        runner.reply("yt-dlp", Reply::fail(1));
        let bin = PathBuf::from("yt-dlp");

        let result = YtDlp::new(&runner, &bin)
            .predict_filenames(&request((false, true), ""), RunMode::Direct)
            .await;
        assert!(matches!(result, Err(AppError::FilenameResolutionFailed(_))));
    }

    #[tokio::test]
    async fn test_predict_splits_lines() {
        let runner = FakeRunner::new();
        runner.reply("yt-dlp", Reply::ok("a-download-1\nb-download-2\n"));
        let bin = PathBuf::from("yt-dlp");

        let names = YtDlp::new(&runner, &bin)
            .predict_filenames(&request((false, true), ""), RunMode::Interactive)
            .await
            .unwrap();
        assert_eq!(
            names,
            vec![
                ResolvedFilename("a-download-1".to_string()),
                ResolvedFilename("b-download-2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_download_failure_carries_code() {
        let runner = FakeRunner::new();
        runner.reply("yt-dlp", Reply::fail(2));
        let bin = PathBuf::from("yt-dlp");

        let result = YtDlp::new(&runner, &bin)
            .download(&request((false, false), ""))
            .await;
        assert!(matches!(
            result,
            Err(AppError::DownloadFailed { code: Some(2) })
        ));
        assert!(!runner.calls()[0].captured);
    }
}
