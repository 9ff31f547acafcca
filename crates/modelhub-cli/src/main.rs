//! modelhub - command-line client for the model management API.
//!
//! Logs in against the API, keeps the access token in the configured
//! token store, and lists or creates datasets, models and training runs.

mod app;
mod cli;
mod render;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modelhub_core::Config;

use app::App;
use cli::Cli;

/// Log file prefix inside `log_dir`
const LOG_FILE_PREFIX: &str = "modelhub.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(store) = cli.store {
        config.store = store;
    }

    let _guard = init_tracing(cli.verbose, config.log_dir.as_deref());
    info!(base_url = %config.base_url, store = ?config.store, "modelhub starting");

    let mut app = App::new(config, cli.json)?;
    app.run(cli.command).await
}
