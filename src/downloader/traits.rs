// Seams between the pipeline and the outside world

use std::path::Path;

use async_trait::async_trait;

use super::errors::AppError;
use super::models::{DownloadRequest, ProcessOutput, ProcessResult, RunMode};

/// Runs external programs with an argument vector, never through a shell.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run to completion with stdout/stderr captured.
    async fn capture(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, AppError>;

    /// Run to completion with the terminal attached (progress output visible).
    async fn run(&self, program: &Path, args: &[String]) -> Result<ProcessResult, AppError>;
}

/// Produces the normalized request, either from flags or from prompts.
pub trait RequestSource {
    fn mode(&self) -> RunMode;

    fn resolve(&mut self) -> Result<DownloadRequest, AppError>;
}
