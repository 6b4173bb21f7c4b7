// Direct mode: URL and options from the command line

use std::ffi::OsString;

use clap::error::{ContextKind, ErrorKind};
use clap::{CommandFactory, Parser};

use super::finish;
use crate::downloader::errors::AppError;
use crate::downloader::models::{DownloadRequest, RunMode};
use crate::downloader::traits::RequestSource;

/// Download video or audio with yt-dlp, optionally transcoding to MPEG-4
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "media-fetch")]
#[command(override_usage = "media-fetch [url] [options]")]
#[command(after_help = "If no options are specified, the text user interface is launched.")]
#[command(args_override_self = true)]
pub struct DirectArgs {
    /// URL of the media to download
    pub url: String,

    /// Save audio only
    #[arg(short, long)]
    pub audio: bool,

    /// Transcode to mp4/m4a (MPEG-4) for maximum compatibility
    #[arg(short, long)]
    pub compatibility: bool,

    /// Folder to save the file(s) in
    #[arg(short, long, value_name = "name", allow_hyphen_values = true)]
    pub folder: Option<String>,

    /// Skip the URL check
    #[arg(short = 's', long = "no-check")]
    pub no_check: bool,
}

/// Every token direct mode understands after the URL
const KNOWN_OPTIONS: [&str; 10] = [
    "-a",
    "--audio",
    "-c",
    "--compatibility",
    "-f",
    "--folder",
    "-s",
    "--no-check",
    "-h",
    "--help",
];

fn is_folder_flag(token: &str) -> bool {
    token == "-f" || token == "--folder"
}

fn is_help_flag(token: &str) -> bool {
    token == "-h" || token == "--help"
}

/// Walk the options (everything after the URL). Any token outside
/// [`KNOWN_OPTIONS`] is rejected unless it is the folder value. Returns
/// whether help was asked for.
fn check_options(options: &[String]) -> Result<bool, AppError> {
    let mut help = false;
    let mut tokens = options.iter();
    while let Some(token) = tokens.next() {
        if !KNOWN_OPTIONS.contains(&token.as_str()) {
            return Err(AppError::UnknownOption(token.clone()));
        }
        if is_folder_flag(token) {
            if tokens.next().is_none() {
                return Err(AppError::InvalidArguments(format!(
                    "{} requires a folder name",
                    token
                )));
            }
        } else if is_help_flag(token) {
            help = true;
        }
    }
    Ok(help)
}

fn help_text() -> String {
    DirectArgs::command().render_help().to_string()
}

/// Outcome of parsing the command line
#[derive(Debug)]
pub enum ParsedArgs {
    /// `-h/--help` was given; the rendered help text
    Help(String),
    Run(FlagsSource),
}

#[derive(Debug, Clone)]
pub struct FlagsSource {
    args: DirectArgs,
}

impl FlagsSource {
    /// Parse a full argv (program name first). The first argument is always
    /// the URL, whatever it looks like.
    pub fn parse<I, T>(argv: I) -> Result<ParsedArgs, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<String> = argv
            .into_iter()
            .map(|arg| {
                let arg: OsString = arg.into();
                arg.to_string_lossy().into_owned()
            })
            .collect();
        let (program, url, options) = match argv.as_slice() {
            [program, url, options @ ..] => (program, url, options),
            _ => {
                return Err(AppError::InvalidArguments(
                    "a URL is required".to_string(),
                ))
            }
        };

        let help = check_options(options)?;
        if help || is_help_flag(url) {
            return Ok(ParsedArgs::Help(help_text()));
        }

        // clap sees the URL last, after `--`, so it can never be taken as a flag
        let mut reordered = Vec::with_capacity(argv.len() + 1);
        reordered.push(program.clone());
        reordered.extend(options.iter().cloned());
        reordered.push("--".to_string());
        reordered.push(url.clone());

        match DirectArgs::try_parse_from(reordered) {
            Ok(args) => Ok(ParsedArgs::Run(Self { args })),
            Err(err) => match err.kind() {
                ErrorKind::UnknownArgument => {
                    let token = err
                        .get(ContextKind::InvalidArg)
                        .map(|value| value.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    Err(AppError::UnknownOption(token))
                }
                _ => Err(AppError::InvalidArguments(
                    err.render().to_string().trim().to_string(),
                )),
            },
        }
    }
}

impl RequestSource for FlagsSource {
    fn mode(&self) -> RunMode {
        RunMode::Direct
    }

    fn resolve(&mut self) -> Result<DownloadRequest, AppError> {
        let args = &self.args;
        finish(DownloadRequest::new(
            &args.url,
            args.audio,
            args.compatibility,
            args.folder.as_deref().unwrap_or(""),
            args.no_check,
        ))
    }
}
