//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Shared default helper.
pub(crate) fn default_true() -> bool {
    true
}

/// Base directory for all SnapQueue state (`~/.snapqueue`).
pub fn snapqueue_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".snapqueue"))
        .unwrap_or_else(|| PathBuf::from(".snapqueue"))
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub uploader: UploaderConfig,

    #[serde(default)]
    pub processor: ProcessorConfig,

    #[serde(default)]
    pub inbox: InboxConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Durable queue store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Single SQLite database file.
    #[default]
    Sqlite,
    /// One file per queued payload.
    File,
    /// Process-local only; nothing survives a restart.
    Memory,
}

impl StoreBackend {
    /// Whether entries survive a process restart.
    pub fn is_durable(&self) -> bool {
        !matches!(self, StoreBackend::Memory)
    }
}

/// Durable queue store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file (sqlite) or directory (file).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    snapqueue_dir().join("queue.db")
}

/// Upload service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Public key sent with every upload.
    #[serde(default)]
    pub public_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base used to build the delivery URL of an uploaded file.
    #[serde(default = "default_cdn_base")]
    pub cdn_base: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            base_url: default_base_url(),
            cdn_base: default_cdn_base(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://upload.uploadcare.com".to_string()
}

fn default_cdn_base() -> String {
    "https://ucarecdn.com".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Queue processor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Fixed delay after a failed upload before the same payload is retried.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl ProcessorConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_retry_delay_ms() -> u64 {
    5000
}

/// Inbox directory watched for captured photos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxConfig {
    #[serde(default = "default_inbox_path")]
    pub path: PathBuf,

    /// Glob patterns a file name must match to be enqueued.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// Delete the inbox file once its payload is persisted. When false the
    /// file is moved to `.queued/` inside the inbox instead.
    #[serde(default = "default_true")]
    pub remove_after_enqueue: bool,

    /// Quiet period after the last file event before new files are read.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl InboxConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            path: default_inbox_path(),
            patterns: default_patterns(),
            remove_after_enqueue: default_true(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_inbox_path() -> PathBuf {
    snapqueue_dir().join("inbox")
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_patterns() -> Vec<String> {
    ["*.jpg", "*.jpeg", "*.png", "*.webp"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: default_log_dir(),
            max_log_files: default_max_log_files(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    snapqueue_dir().join("logs")
}

fn default_max_log_files() -> usize {
    30
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
