//! Inbox directory watcher.
//!
//! Files dropped into the inbox are treated as captured photos: each matching
//! file is read, handed to the queue, and then deleted or moved to `.queued/`
//! once the queue has persisted it.

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use snapqueue_config::InboxConfig;
use snapqueue_processor::QueueHandle;

/// Kept inbox files are moved here after they are queued.
const QUEUED_DIR: &str = ".queued";

/// Feeds files from the inbox directory into the upload queue.
pub(crate) struct InboxWatcher {
    dir: PathBuf,
    patterns: Vec<glob::Pattern>,
    remove_after_enqueue: bool,
    debounce: Duration,
    queue: QueueHandle,
}

/// Keeps the notify watcher alive while the ingest task runs.
pub(crate) struct RunningInbox {
    _watcher: RecommendedWatcher,
    pub(crate) task: JoinHandle<()>,
}

impl InboxWatcher {
    pub(crate) fn new(config: &InboxConfig, dir: PathBuf, queue: QueueHandle) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).with_context(|| format!("invalid inbox pattern '{}'", p))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dir,
            patterns,
            remove_after_enqueue: config.remove_after_enqueue,
            debounce: config.debounce(),
            queue,
        })
    }

    /// Whether the file name matches one of the configured patterns.
    /// An empty pattern list accepts every file.
    pub(crate) fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(name))
    }

    /// Enqueue one inbox file. Returns `false` if the file was skipped.
    pub(crate) async fn ingest(&self, path: &Path) -> Result<bool> {
        if !self.matches(path) || !path.is_file() {
            return Ok(false);
        }

        let payload = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.queue
            .enqueue(payload)
            .await
            .with_context(|| format!("failed to enqueue {}", path.display()))?;

        if self.remove_after_enqueue {
            tokio::fs::remove_file(path)
                .await
                .with_context(|| format!("failed to remove {}", path.display()))?;
        } else {
            self.mark_queued(path).await?;
        }

        info!("Queued {}", path.display());
        Ok(true)
    }

    /// Directory that keeps inbox files once they are queued.
    pub(crate) fn queued_dir(&self) -> PathBuf {
        self.dir.join(QUEUED_DIR)
    }

    /// Move a queued file out of the scanned directory.
    async fn mark_queued(&self, path: &Path) -> Result<()> {
        let queued_dir = self.queued_dir();
        tokio::fs::create_dir_all(&queued_dir)
            .await
            .with_context(|| format!("failed to create {}", queued_dir.display()))?;

        let Some(name) = path.file_name() else {
            return Ok(());
        };
        let target = queued_dir.join(name);
        tokio::fs::rename(path, &target).await.with_context(|| {
            format!("failed to move {} to {}", path.display(), target.display())
        })?;
        Ok(())
    }

    /// Enqueue files already in the inbox, in file name order.
    pub(crate) async fn scan_existing(&self) -> Result<usize> {
        let mut paths = BTreeSet::new();
        let mut read_dir = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("failed to read inbox {}", self.dir.display()))?;
        while let Some(entry) = read_dir.next_entry().await? {
            paths.insert(entry.path());
        }

        Ok(self.ingest_all(paths).await)
    }

    async fn ingest_all(&self, paths: BTreeSet<PathBuf>) -> usize {
        let mut queued = 0;
        for path in paths {
            match self.ingest(&path).await {
                Ok(true) => queued += 1,
                Ok(false) => {}
                Err(e) => warn!("Skipping inbox file: {:#}", e),
            }
        }
        queued
    }

    /// Watch the inbox for new files until the watcher is dropped.
    pub(crate) fn start(self) -> Result<RunningInbox> {
        let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(100);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )
        .context("failed to create inbox watcher")?;
        watcher
            .watch(&self.dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", self.dir.display()))?;
        info!("Watching inbox: {}", self.dir.display());

        let task = tokio::spawn(async move {
            let mut pending = BTreeSet::new();
            loop {
                let next = if pending.is_empty() {
                    event_rx.recv().await
                } else {
                    match tokio::time::timeout(self.debounce, event_rx.recv()).await {
                        Ok(next) => next,
                        Err(_) => {
                            self.ingest_all(std::mem::take(&mut pending)).await;
                            continue;
                        }
                    }
                };

                match next {
                    Some(Ok(event)) if is_arrival(&event.kind) => {
                        debug!("Inbox event {:?}: {:?}", event.kind, event.paths);
                        pending.extend(event.paths);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => warn!("Inbox watcher error: {}", e),
                    None => break,
                }
            }
        });

        Ok(RunningInbox {
            _watcher: watcher,
            task,
        })
    }
}

/// Events that can mean a new file is ready in the inbox.
fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}
