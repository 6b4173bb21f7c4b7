use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    media_fetch::run().await
}
