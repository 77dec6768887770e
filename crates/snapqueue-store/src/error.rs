//! Store errors.

use thiserror::Error;

/// Durable queue store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying store could not be opened or is gone.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A read or write against the store failed.
    #[error("Query error: {0}")]
    Query(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data cannot be interpreted.
    #[error("Store is corrupted: {0}")]
    Corrupted(String),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::ConnectionClosed => {
                StoreError::Connection("connection closed".to_string())
            }
            tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, msg))
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::NotADatabase | rusqlite::ErrorCode::DatabaseCorrupt
                ) =>
            {
                StoreError::Corrupted(msg.unwrap_or_else(|| e.to_string()))
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Corrupted("bad header".to_string());
        assert!(err.to_string().contains("corrupted"));
        assert!(err.to_string().contains("bad header"));
    }

    #[test]
    fn test_from_connection_closed() {
        let err = StoreError::from(tokio_rusqlite::Error::ConnectionClosed);
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn test_from_not_a_database() {
        let failure = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_NOTADB),
            None,
        );
        let err = StoreError::from(tokio_rusqlite::Error::Rusqlite(failure));
        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[test]
    fn test_from_other_sqlite_error() {
        let err = StoreError::from(tokio_rusqlite::Error::Rusqlite(
            rusqlite::Error::QueryReturnedNoRows,
        ));
        assert!(matches!(err, StoreError::Query(_)));
    }
}
