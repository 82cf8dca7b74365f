//! Aggregate repository port.
//!
//! Per-aggregate-kind facade over the event store: saving drains the
//! aggregate's uncommitted changes, loading replays its history.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{
    Aggregate, AggregateError, AggregateId, ErrorCode, EventStoreError,
};

/// Errors raised by repositories and their construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// No events exist for the id, or the aggregate is logically deleted.
    #[error("{aggregate_type} not found: {id}")]
    NotFound {
        aggregate_type: &'static str,
        id: AggregateId,
    },

    #[error(transparent)]
    Store(#[from] EventStoreError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("failed to connect to storage: {0}")]
    Connection(String),

    #[error("failed to run migrations: {0}")]
    Migration(String),
}

impl RepositoryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RepositoryError::NotFound { .. } => ErrorCode::NotFound,
            RepositoryError::Store(e) => e.code(),
            RepositoryError::Aggregate(e) => e.code(),
            RepositoryError::Connection(_) | RepositoryError::Migration(_) => {
                ErrorCode::StorageError
            }
        }
    }
}

/// Repository port for one event-sourced aggregate kind.
#[async_trait]
pub trait AggregateRepository<A: Aggregate>: Send + Sync {
    /// Persists the aggregate's uncommitted changes. No-op if there are none.
    ///
    /// Changes are drained before the write and are not restored on failure;
    /// reload the aggregate before retrying.
    ///
    /// # Errors
    ///
    /// - `Store(DuplicateVersion)` if another writer saved the same version first
    /// - `Store(..)` for any other store failure
    async fn save(&self, aggregate: &mut A) -> Result<(), RepositoryError>;

    /// Loads an aggregate by replaying its events.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there are no events or the aggregate is deleted
    /// - `Aggregate(..)` if the history cannot be replayed
    async fn get_by_id(&self, id: AggregateId) -> Result<A, RepositoryError>;

    /// Loads every non-deleted aggregate of this kind.
    async fn get_all(&self) -> Result<Vec<A>, RepositoryError>;

    /// Checks whether any event exists for the id.
    async fn exists(&self, id: AggregateId) -> Result<bool, RepositoryError>;
}
