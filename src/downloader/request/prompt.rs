// Interactive mode: ask for each setting in turn

use std::io::{BufRead, Write};

use super::finish;
use crate::downloader::errors::AppError;
use crate::downloader::models::{DownloadRequest, RunMode};
use crate::downloader::traits::RequestSource;

/// Prompt sequence over any line reader / writer pair (stdin/stdout in the
/// binary, in-memory buffers in tests).
pub struct PromptSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question`, then read one line. EOF reads as an empty answer.
    fn ask(&mut self, question: &str) -> Result<String, AppError> {
        write!(self.output, "{}\n> ", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&mut self, question: &str) -> Result<bool, AppError> {
        let answer = self.ask(question)?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }
}

impl<R: BufRead, W: Write> RequestSource for PromptSource<R, W> {
    fn mode(&self) -> RunMode {
        RunMode::Interactive
    }

    fn resolve(&mut self) -> Result<DownloadRequest, AppError> {
        let url = self.ask("Enter URL")?;
        let audio_only = self.confirm("Download audio only? (y/N)")?;
        let compatibility = self.confirm("Compatibility mode? (y/N)")?;
        let folder = self.ask("Enter folder name (leave blank for current directory)")?;

        // the media check is never skipped here
        finish(DownloadRequest::new(
            &url,
            audio_only,
            compatibility,
            &folder,
            false,
        ))
    }
}

/// Keep the console open until the user presses enter.
pub fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<(), AppError> {
    writeln!(output, "Press enter to close.")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}
