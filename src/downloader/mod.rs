// Downloader module - request building, tool checks and the pipeline itself

pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod postprocess;
pub mod request;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::AppError;
pub use models::{DownloadRequest, RunMode, RunReport};
pub use orchestrator::Downloader;
pub use traits::{RequestSource, ToolRunner};
