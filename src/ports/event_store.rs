//! Event store port.
//!
//! Append-only log of [`Event`]s. Implementations decode stored payloads
//! through a [`PayloadRegistry`](crate::domain::foundation::PayloadRegistry)
//! and enforce uniqueness of both the event id and the
//! `(aggregate_id, aggregate_version)` pair at write time.

use async_trait::async_trait;

use crate::domain::foundation::{AggregateId, Criteria, Event, EventStoreError};

/// Port for persisting and querying events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events atomically, in the given order.
    ///
    /// Either every event is persisted or none is. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// - `DuplicateEventId` if an event id already exists
    /// - `DuplicateVersion` if a version of an aggregate is already taken
    /// - `Serialization` if a payload cannot be encoded
    /// - `WriteFailure` / `Timeout` on storage faults
    async fn save(&self, events: &[Event]) -> Result<(), EventStoreError>;

    /// Returns every event matching the criteria.
    ///
    /// Ordered by version when the criteria is confined to one aggregate,
    /// otherwise by timestamp. No match is an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// - `UnknownEventType` / `Serialization` if a stored payload cannot be decoded
    /// - `ReadFailure` / `Timeout` on storage faults
    async fn get(&self, criteria: &Criteria) -> Result<Vec<Event>, EventStoreError>;

    /// Checks whether at least one event exists for the aggregate.
    ///
    /// Does not load payloads.
    async fn exists_by_aggregate_id(&self, id: AggregateId) -> Result<bool, EventStoreError>;
}
