//! Queue processor.
//!
//! A single task owns the in-memory queue and consumes [`Event`]s one at a
//! time. Uploads run on their own task and report back through the same
//! channel, so queue state is never touched concurrently.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use snapqueue_config::ProcessorConfig;
use snapqueue_store::QueueStore;

use crate::error::{QueueError, UploadError};
use crate::progress::{Progress, ProgressReporter};
use crate::uploader::{UploadReceipt, Uploader};

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;

/// Messages consumed by the processor loop.
enum Event {
    Enqueue {
        payload: Bytes,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    LoadPersisted {
        reply: oneshot::Sender<Result<usize, QueueError>>,
    },
    Drain,
    UploadFinished {
        payload: Bytes,
        result: Result<UploadReceipt, UploadError>,
    },
    Shutdown,
}

/// Owns the pending queue and drives uploads one at a time.
pub struct QueueProcessor {
    store: Arc<dyn QueueStore>,
    uploader: Arc<dyn Uploader>,
    reporter: Arc<dyn ProgressReporter>,
    retry_delay: Duration,
    queue: VecDeque<Bytes>,
    uploading: bool,
    uploaded: u64,
    /// Uploaded entries still at the front of the store because removal failed.
    unremoved: usize,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    progress_tx: watch::Sender<Progress>,
}

impl QueueProcessor {
    /// Create a processor with an empty in-memory queue.
    ///
    /// Nothing is read from the store until [`QueueHandle::load_persisted`] is called.
    pub fn new(
        store: Arc<dyn QueueStore>,
        uploader: Arc<dyn Uploader>,
        reporter: Arc<dyn ProgressReporter>,
        config: &ProcessorConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (progress_tx, _) = watch::channel(Progress::default());

        Self {
            store,
            uploader,
            reporter,
            retry_delay: config.retry_delay(),
            queue: VecDeque::new(),
            uploading: false,
            uploaded: 0,
            unremoved: 0,
            tx,
            rx,
            progress_tx,
        }
    }

    /// Start the processor loop.
    pub fn spawn(self) -> (QueueHandle, JoinHandle<()>) {
        let handle = QueueHandle {
            tx: self.tx.clone(),
            progress_rx: self.progress_tx.subscribe(),
        };
        let join = tokio::spawn(self.run());
        (handle, join)
    }

    async fn run(mut self) {
        info!(
            "Queue processor started (store: {}, retry delay: {:?})",
            self.store.id(),
            self.retry_delay
        );

        while let Some(event) = self.rx.recv().await {
            match event {
                Event::Enqueue { payload, reply } => {
                    let result = self.handle_enqueue(payload).await;
                    let _ = reply.send(result);
                }
                Event::LoadPersisted { reply } => {
                    let result = self.handle_load_persisted().await;
                    let _ = reply.send(result);
                }
                Event::Drain => self.drain_step(),
                Event::UploadFinished { payload, result } => {
                    self.handle_upload_finished(payload, result).await;
                }
                Event::Shutdown => break,
            }
        }

        info!(
            "Queue processor stopped ({} pending in memory)",
            self.queue.len() + usize::from(self.uploading)
        );
    }

    async fn handle_enqueue(&mut self, payload: Bytes) -> Result<(), QueueError> {
        let key = self.store.append(payload.clone()).await?;
        debug!("Persisted payload {} ({} bytes)", key, payload.len());

        self.queue.push_back(payload);
        self.report();
        self.request_drain();
        Ok(())
    }

    async fn handle_load_persisted(&mut self) -> Result<usize, QueueError> {
        let mut pending: VecDeque<Bytes> = self.store.list_all().await?.into();

        // Already uploaded entries come first, then the in-flight payload.
        let skip = self.unremoved + usize::from(self.uploading);
        pending.drain(..skip.min(pending.len()));

        let count = pending.len();
        self.queue = pending;
        self.uploaded = 0;
        info!("Loaded {} persisted payload(s)", count);

        self.report();
        self.request_drain();
        Ok(count)
    }

    /// Start the next upload unless one is already running.
    fn drain_step(&mut self) {
        if self.uploading {
            return;
        }
        let Some(payload) = self.queue.pop_front() else {
            return;
        };

        self.uploading = true;
        self.report();

        let uploader = Arc::clone(&self.uploader);
        let tx = self.tx.clone();
        let retry_delay = self.retry_delay;

        tokio::spawn(async move {
            let attempt = {
                let uploader = Arc::clone(&uploader);
                let payload = payload.clone();
                tokio::spawn(async move { uploader.upload(payload).await })
            };

            let result = match attempt.await {
                Ok(result) => result,
                Err(e) => Err(UploadError::Cancelled(e.to_string())),
            };

            if let Err(e) = &result {
                warn!("Upload failed, retrying in {:?}: {}", retry_delay, e);
                tokio::time::sleep(retry_delay).await;
            }

            let _ = tx.send(Event::UploadFinished { payload, result });
        });
    }

    async fn handle_upload_finished(
        &mut self,
        payload: Bytes,
        result: Result<UploadReceipt, UploadError>,
    ) {
        match result {
            Ok(receipt) => {
                self.unremoved += 1;
                self.remove_uploaded(&receipt).await;
                self.uploaded += 1;
                info!("Uploaded {} to {}", receipt.file_id, receipt.url);
            }
            Err(_) => {
                self.queue.push_front(payload);
            }
        }

        self.uploading = false;
        self.report();
        self.request_drain();
    }

    /// Remove every uploaded entry from the front of the store. Entries whose
    /// removal fails stay counted and are retried after the next upload.
    async fn remove_uploaded(&mut self, receipt: &UploadReceipt) {
        while self.unremoved > 0 {
            match self.store.remove_oldest().await {
                Ok(()) => self.unremoved -= 1,
                Err(e) => {
                    error!(
                        "Uploaded {} but failed to remove {} entr(ies) from the store: {}",
                        receipt.file_id, self.unremoved, e
                    );
                    return;
                }
            }
        }
    }

    fn request_drain(&self) {
        let _ = self.tx.send(Event::Drain);
    }

    fn report(&self) {
        let total = self.uploaded + self.queue.len() as u64 + u64::from(self.uploading);
        let progress = Progress::new(self.uploaded, total);
        self.reporter.report(progress);
        self.progress_tx.send_replace(progress);
    }
}

/// Cloneable handle to a running [`QueueProcessor`].
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<Event>,
    progress_rx: watch::Receiver<Progress>,
}

impl QueueHandle {
    /// Persist a payload and queue it for upload.
    ///
    /// Returns once the payload is durable. On error nothing was queued.
    pub async fn enqueue(&self, payload: impl Into<Bytes>) -> Result<(), QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Event::Enqueue {
            payload: payload.into(),
            reply,
        })?;
        rx.await.map_err(|_| QueueError::Stopped)?
    }

    /// Replace the in-memory queue with the store contents and reset the
    /// uploaded counter. Returns the number of payloads loaded.
    pub async fn load_persisted(&self) -> Result<usize, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Event::LoadPersisted { reply })?;
        rx.await.map_err(|_| QueueError::Stopped)?
    }

    /// Latest progress snapshot.
    pub fn progress(&self) -> Progress {
        *self.progress_rx.borrow()
    }

    /// Watch progress changes.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress_rx.clone()
    }

    /// Stop the processor loop. An in-flight upload is abandoned and its
    /// payload stays in the store.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Event::Shutdown);
    }

    fn send(&self, event: Event) -> Result<(), QueueError> {
        self.tx.send(event).map_err(|_| QueueError::Stopped)
    }
}
