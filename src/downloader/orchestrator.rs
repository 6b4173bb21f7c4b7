// Pipeline: check -> predict names -> download -> transcode

use tracing::info;

use super::errors::AppError;
use super::models::{DownloadRequest, RunMode, RunReport};
use super::postprocess::PostProcessor;
use super::tools::Environment;
use super::traits::ToolRunner;
use crate::ffmpeg::Ffmpeg;
use crate::ytdlp::YtDlp;

pub struct Downloader<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    env: &'a Environment,
}

impl<'a, R: ToolRunner + ?Sized> Downloader<'a, R> {
    pub fn new(runner: &'a R, env: &'a Environment) -> Self {
        Self { runner, env }
    }

    /// Run one request to completion. Every step waits for the previous one;
    /// the first error ends the run.
    pub async fn run(&self, request: &DownloadRequest, mode: RunMode) -> Result<RunReport, AppError> {
        let ytdlp = YtDlp::new(self.runner, &self.env.tools.ytdlp);
        let mut report = RunReport::default();

        if request.skip_check {
            info!("media check skipped");
        } else {
            report.titles = ytdlp.check_url(&request.url).await?;
        }

        // names must be known before the download so the files can be found after it
        if request.compatibility_mode {
            report.predicted = ytdlp.predict_filenames(request, mode).await?;
        }

        ytdlp.download(request).await?;

        if request.compatibility_mode {
            let ffmpeg = Ffmpeg::new(
                self.runner,
                &self.env.tools.ffmpeg,
                &self.env.tools.ffprobe,
            );
            let processor = PostProcessor::new(ffmpeg, self.env.config);
            report.transcoded = processor.process_all(&report.predicted).await?;
        }

        info!(
            "run finished: {} title(s), {} transcoded",
            report.titles.len(),
            report.transcoded.len()
        );
        Ok(report)
    }
}
