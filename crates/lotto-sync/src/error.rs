//! # Sync Error Types
//!
//! Error types for background persistence.
//!
//! ## Operator-Facing Rule
//! Raw database errors never reach the operator or the info-level log. A
//! failed flush surfaces as the generic "Couldn't save your data" message;
//! the underlying error goes to the debug log and into the outbox entry's
//! `last_error` column for diagnostics.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// The generic operator-facing message for any failed save.
pub const GENERIC_SAVE_ERROR: &str = "Couldn't save your data. Please try again.";

/// Sync error type covering background persistence failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Database write or read failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Failed to serialize or deserialize an outbox payload.
    #[error("Payload serialization failed: {0}")]
    Serialization(String),

    /// An outbox entry carries an entity type this build doesn't know.
    #[error("Unknown outbox entity type: {0}")]
    UnknownEntityType(String),

    /// The worker's queue is gone (agent already shut down).
    #[error("Sync agent is shut down")]
    ChannelClosed,
}

impl From<lotto_db::DbError> for SyncError {
    fn from(err: lotto_db::DbError) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl SyncError {
    /// True if the operation may succeed on a later retry.
    ///
    /// Serialization failures and unknown entity types are deterministic;
    /// retrying them burns attempts for nothing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::Database("disk I/O error".into()).is_retryable());

        assert!(!SyncError::UnknownEntityType("WIDGET".into()).is_retryable());
        assert!(!SyncError::ChannelClosed.is_retryable());
    }
}
