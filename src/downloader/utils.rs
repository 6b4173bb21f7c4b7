// Helper functions shared by the pipeline stages

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use super::errors::AppError;
use super::models::{ProcessOutput, ProcessResult};
use super::traits::ToolRunner;

/// Runs real processes through tokio. Each call is awaited to completion
/// before the caller moves on; there is no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

fn command_line(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

fn spawn_error(program: &Path, source: std::io::Error) -> AppError {
    AppError::Spawn {
        program: program.display().to_string(),
        source,
    }
}

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn capture(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, AppError> {
        debug!("capture: {}", command_line(program, args));

        let output = TokioCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error(program, e))?;

        Ok(ProcessOutput {
            result: ProcessResult {
                code: output.status.code(),
            },
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn run(&self, program: &Path, args: &[String]) -> Result<ProcessResult, AppError> {
        debug!("run: {}", command_line(program, args));

        let status = TokioCommand::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| spawn_error(program, e))?;

        Ok(ProcessResult {
            code: status.code(),
        })
    }
}

/// Split tool output into trimmed, non-empty lines.
pub fn output_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// First non-empty stderr line, for error context in logs and messages.
pub fn first_error_line(stderr: &str) -> String {
    output_lines(stderr)
        .into_iter()
        .next()
        .unwrap_or_else(|| "no error output".to_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_lines_skips_blanks() {
        let lines = output_lines("First title\n\n  Second title  \r\n");
        assert_eq!(lines, vec!["First title", "Second title"]);
    }

    #[test]
    fn test_first_error_line() {
        assert_eq!(
            first_error_line("\nERROR: Unsupported URL\nmore\n"),
            "ERROR: Unsupported URL"
        );
        assert_eq!(first_error_line(""), "no error output");
    }

    #[test]
    fn test_command_line_joins_args() {
        let line = command_line(Path::new("yt-dlp"), &["--progress".into(), "url".into()]);
        assert_eq!(line, "yt-dlp --progress url");
    }
}
