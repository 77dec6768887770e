//! Uploader collaborator.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::UploadError;

/// Where an uploaded photo ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Identifier assigned by the upload service.
    pub file_id: String,
    /// Public URL of the uploaded file.
    pub url: String,
}

impl UploadReceipt {
    pub fn new(file_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            url: url.into(),
        }
    }
}

/// Delivers one payload to the remote media service.
///
/// Implementations own their timeout behavior; a timeout is reported as an error
/// like any other failure.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload a payload.
    async fn upload(&self, payload: Bytes) -> Result<UploadReceipt, UploadError>;
}
