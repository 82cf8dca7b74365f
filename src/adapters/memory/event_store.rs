//! In-memory event store.
//!
//! Keeps encoded [`EventRecord`]s in a vector guarded by a `tokio` RwLock.
//! Records go through the same JSON encoding as the Postgres store, so
//! payload decoding and registry lookups behave identically.
//!
//! Used for tests and for the `inmemory` engine.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    AggregateId, Criteria, Event, EventId, EventRecord, EventStoreError, PayloadRegistry,
};
use crate::ports::EventStore;

#[derive(Debug, Default)]
struct Log {
    records: Vec<EventRecord>,
    ids: HashSet<EventId>,
    versions: HashSet<(AggregateId, u64)>,
}

/// Event store backed by process memory.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryEventStore::new(Arc::new(asset_payload_registry()?));
/// store.save(&asset.drain_uncommitted_changes()).await?;
/// assert_eq!(store.len().await, 1);
/// ```
#[derive(Debug)]
pub struct InMemoryEventStore {
    registry: Arc<PayloadRegistry>,
    log: RwLock<Log>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    pub fn new(registry: Arc<PayloadRegistry>) -> Self {
        Self {
            registry,
            log: RwLock::new(Log::default()),
        }
    }

    // === Test Helpers ===

    /// Returns the number of stored events.
    pub async fn len(&self) -> usize {
        self.log.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the stored records in insertion order.
    pub async fn records(&self) -> Vec<EventRecord> {
        self.log.read().await.records.clone()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[tracing::instrument(skip(self, events), fields(count = events.len()))]
    async fn save(&self, events: &[Event]) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let batch = events
            .iter()
            .map(EventRecord::encode)
            .collect::<Result<Vec<_>, _>>()?;

        let mut log = self.log.write().await;

        let mut batch_ids = HashSet::with_capacity(batch.len());
        let mut batch_versions = HashSet::with_capacity(batch.len());
        for record in &batch {
            if log.ids.contains(&record.id) || !batch_ids.insert(record.id) {
                return Err(EventStoreError::DuplicateEventId(record.id));
            }
            let key = (record.aggregate_id, record.aggregate_version);
            if log.versions.contains(&key) || !batch_versions.insert(key) {
                return Err(EventStoreError::DuplicateVersion {
                    aggregate_id: record.aggregate_id,
                    version: record.aggregate_version,
                });
            }
        }

        log.ids.extend(batch_ids);
        log.versions.extend(batch_versions);
        log.records.extend(batch);

        tracing::debug!(total = log.records.len(), "events appended");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, criteria: &Criteria) -> Result<Vec<Event>, EventStoreError> {
        let mut matched: Vec<EventRecord> = {
            let log = self.log.read().await;
            log.records
                .iter()
                .filter(|record| criteria.matches(record))
                .cloned()
                .collect()
        };

        if criteria.single_aggregate().is_some() {
            matched.sort_by_key(|r| (r.aggregate_id, r.aggregate_version));
        } else {
            matched.sort_by_key(|r| (r.timestamp, r.aggregate_id, r.aggregate_version));
        }

        tracing::debug!(matched = matched.len(), "events loaded");
        matched
            .iter()
            .map(|record| record.decode(&self.registry))
            .collect()
    }

    async fn exists_by_aggregate_id(&self, id: AggregateId) -> Result<bool, EventStoreError> {
        let log = self.log.read().await;
        Ok(log.records.iter().any(|r| r.aggregate_id == id))
    }
}
