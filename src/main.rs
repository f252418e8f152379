use anyhow::Result;
use std::process::ExitCode;

use cosmos_console::cli::CliApp;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    CliApp::run().await
}
