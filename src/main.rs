//! SnapQueue - persistent photo upload queue
//!
//! Main entry point for the SnapQueue CLI.

mod cli;
mod inbox;
mod reporter;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use snapqueue_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use snapqueue_processor::QueueProcessor;
use snapqueue_store::open_store;
use snapqueue_uploader::HttpUploader;

use crate::cli::{Cli, Commands};
use crate::inbox::InboxWatcher;
use crate::reporter::LogProgressReporter;

/// Initialize tracing with console and file output.
///
/// Log files are written to `logging.dir` with daily rotation.
fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let log_dir = ConfigLoader::expand_pathbuf(&config.dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("snapqueue")
        .filename_suffix("log")
        .max_log_files(config.max_log_files)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes pending lines on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_tracing(&config.logging)?;

    match cli.command {
        None => run(config, None).await,
        Some(Commands::Run { inbox }) => run(config, inbox).await,
        Some(Commands::Enqueue { files }) => enqueue_files(&config, &files).await,
        Some(Commands::Status) => status(&config).await,
    }
}

/// Upload everything pending and keep feeding the queue from the inbox until Ctrl-C.
async fn run(mut config: Config, inbox_override: Option<PathBuf>) -> Result<()> {
    if let Some(dir) = inbox_override {
        config.inbox.path = dir;
    }

    let result = ConfigValidator::validate(&config)?;
    for warning in &result.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if !result.is_valid() {
        for error in &result.errors {
            tracing::error!("Config {}: {}", error.path, error.message);
        }
        result.into_result()?;
    }

    info!("Starting SnapQueue v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config.store).await?;
    let uploader = HttpUploader::new(&config.uploader)?;
    let (queue, processor) = QueueProcessor::new(
        store,
        Arc::new(uploader),
        Arc::new(LogProgressReporter),
        &config.processor,
    )
    .spawn();

    let restored = queue.load_persisted().await?;
    info!("Resuming with {} pending photo(s)", restored);

    let inbox_dir = ConfigLoader::expand_pathbuf(&config.inbox.path);
    tokio::fs::create_dir_all(&inbox_dir)
        .await
        .with_context(|| format!("failed to create inbox {}", inbox_dir.display()))?;

    let watcher = InboxWatcher::new(&config.inbox, inbox_dir, queue.clone())?;
    let scanned = watcher.scan_existing().await?;
    if scanned > 0 {
        info!("Queued {} photo(s) already in the inbox", scanned);
    }
    let inbox = watcher.start()?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    inbox.task.abort();
    drop(inbox);
    queue.shutdown();
    processor.await?;

    Ok(())
}

/// Append files to the store without uploading them.
async fn enqueue_files(config: &Config, files: &[PathBuf]) -> Result<()> {
    let mut payloads = Vec::with_capacity(files.len());
    for file in files {
        payloads.push(read_photo(file).await?);
    }

    let store = open_store(&config.store).await?;
    for (file, payload) in files.iter().zip(payloads) {
        let key = store.append(payload).await?;
        println!("Queued {} as #{}", file.display(), key);
    }

    Ok(())
}

async fn read_photo(path: &Path) -> Result<Bytes> {
    if !path.is_file() {
        bail!("not a file: {}", path.display());
    }
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Bytes::from(content))
}

/// Print the number of pending photos.
async fn status(config: &Config) -> Result<()> {
    let store = open_store(&config.store).await?;
    let pending = store.len().await?;
    println!("{} photo(s) pending upload ({} store)", pending, store.id());
    Ok(())
}
