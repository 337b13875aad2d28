use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod shell;

/// Environment variable overriding the log filter
const LOG_ENV: &str = "INVENTOR_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args: Vec<_> = std::env::args_os().collect();

    let default_filter = if shell::wants_verbose(&args) { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(panic = %panic_info, "Panic");
    }));

    shell::run(args).await
}
