//! # SnapQueue Processor
//!
//! Upload queue processor for captured photos.
//!
//! ## Features
//!
//! - Strict FIFO delivery with at most one upload in flight
//! - Failed uploads retried from the head of the queue after a fixed delay
//! - Payloads removed from the durable store only after a confirmed upload
//! - Progress reporting after every state change

pub mod error;
pub mod processor;
pub mod progress;
pub mod uploader;

pub use error::{QueueError, UploadError};
pub use processor::{QueueHandle, QueueProcessor};
pub use progress::{NullProgressReporter, Progress, ProgressReporter};
pub use uploader::{UploadReceipt, Uploader};
