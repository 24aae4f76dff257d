mod app;
mod input;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use lorekeeper_core::{
    config::{self, AppConfig},
    HttpSource, SessionController,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(
        cache_root = %config.cache_root.display(),
        victory_threshold = config.victory_threshold,
        "Configuration loaded"
    );

    let remote = HttpSource::from_config(&config)?;
    let (controller, repository_rx) = SessionController::new(&config, remote);
    let startup = controller.start();

    let mut app = app::LorekeeperApp::new(controller, repository_rx);
    app.run(startup).await
}

/// Log to `logs/lorekeeper.log` only; anything written to stdout would tear
/// the terminal UI.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("lorekeeper.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
