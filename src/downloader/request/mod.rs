// Argument resolution: two ways to build the same DownloadRequest

pub mod flags;
pub mod prompt;

pub use flags::{FlagsSource, ParsedArgs};
pub use prompt::{wait_for_enter, PromptSource};

use super::errors::AppError;
use super::models::DownloadRequest;

/// Checks shared by both sources once the request is built.
fn finish(request: DownloadRequest) -> Result<DownloadRequest, AppError> {
    if request.url.trim().is_empty() {
        return Err(AppError::InvalidUrl("no URL given".to_string()));
    }
    Ok(request)
}
