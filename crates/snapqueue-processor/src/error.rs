//! Processor errors.

use snapqueue_store::StoreError;
use thiserror::Error;

/// Errors surfaced to callers of the queue handle.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The durable store failed; the operation had no effect.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// The processor task is no longer running.
    #[error("Queue processor is not running")]
    Stopped,
}

/// Upload failures. The processor retries all of them the same way.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The upload service answered with an error status.
    #[error("Upload rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Timeout.
    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    /// The service answered successfully but the body was unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The attempt ended without a result.
    #[error("Upload cancelled: {0}")]
    Cancelled(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_error_from_store_error() {
        let err = QueueError::from(StoreError::Connection("gone".to_string()));
        assert!(matches!(err, QueueError::Storage(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_upload_error_rejected_display() {
        let err = UploadError::Rejected {
            status: 403,
            message: "public key is blocked".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("public key is blocked"));
    }

    #[test]
    fn test_upload_error_timeout_display() {
        assert_eq!(UploadError::Timeout(60).to_string(), "Timeout after 60 seconds");
    }
}
