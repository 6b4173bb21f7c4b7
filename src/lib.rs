pub mod config;
pub mod downloader;
pub mod ffmpeg;
pub mod ytdlp;

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::debug;

use config::RawConfig;
use downloader::request::{wait_for_enter, FlagsSource, ParsedArgs, PromptSource};
use downloader::tools::{probe_environment, ToolManager};
use downloader::utils::SystemRunner;
use downloader::{AppError, Downloader, RequestSource, RunMode, ToolRunner};

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`), so the
/// user-facing lines on stdout stay readable.
pub fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .ok(); // Ignore error if already initialized
}

/// No arguments at all means the prompt sequence.
pub fn mode_for(argv: &[OsString]) -> RunMode {
    if argv.len() > 1 {
        RunMode::Direct
    } else {
        RunMode::Interactive
    }
}

/// Probe, resolve the request, then run the pipeline. The tool lookup,
/// config loader and process runner come from the caller.
pub async fn execute<F, L, R>(
    argv: Vec<OsString>,
    mode: RunMode,
    tools: &ToolManager<F>,
    load_config: L,
    runner: &R,
) -> Result<(), AppError>
where
    F: Fn(&str) -> Option<PathBuf>,
    L: FnOnce() -> Result<RawConfig, AppError>,
    R: ToolRunner + ?Sized,
{
    let env = probe_environment(tools, load_config)?;

    let mut source: Box<dyn RequestSource> = match mode {
        RunMode::Direct => match FlagsSource::parse(argv)? {
            ParsedArgs::Help(text) => {
                print!("{}", text);
                return Ok(());
            }
            ParsedArgs::Run(source) => Box::new(source),
        },
        RunMode::Interactive => Box::new(PromptSource::new(io::stdin().lock(), io::stdout())),
    };
    let request = source.resolve()?;
    let mode = source.mode();
    drop(source);
    debug!("resolved {:?} request: {:?}", mode, request);

    Downloader::new(runner, &env).run(&request, mode).await?;
    Ok(())
}

/// Print the failure the way `mode` presents it and pick the exit code.
pub fn exit_code(result: &Result<(), AppError>, mode: RunMode) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            debug!("run failed: {:?}", err);
            println!("{}", err.user_message(mode));
            err.exit_code()
        }
    }
}

/// Entry point used by the binary.
pub async fn run() -> ExitCode {
    init_logging();

    let argv: Vec<OsString> = std::env::args_os().collect();
    let mode = mode_for(&argv);

    let result = execute(
        argv,
        mode,
        &ToolManager::new(),
        RawConfig::load,
        &SystemRunner::new(),
    )
    .await;
    let code = exit_code(&result, mode);

    if mode == RunMode::Interactive {
        if let Err(e) = wait_for_enter(&mut io::stdin().lock(), &mut io::stdout()) {
            debug!("could not wait for enter: {}", e);
        }
    }

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
