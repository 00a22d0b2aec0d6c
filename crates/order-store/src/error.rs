use thiserror::Error;
use uuid::Uuid;

use common::{OrderId, RequestId};

use crate::record::Version;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A commit targeted a stale aggregate version.
    /// The caller is expected to re-fetch and retry the whole
    /// read-mutate-write cycle.
    #[error(
        "concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// The request ledger already holds an entry for this identifier.
    /// Raised when a concurrent delivery of the same command won the race.
    #[error("duplicate request: {0}")]
    DuplicateRequest(RequestId),

    /// An integration event record was not found for a publish-state mark.
    #[error("integration event not found: {0}")]
    EventNotFound(Uuid),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for environment conditions worth retrying with backoff,
    /// as opposed to business outcomes the caller must act on.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::Migration(_))
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
