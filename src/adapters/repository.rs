//! Event-sourced repository.
//!
//! Implements [`AggregateRepository`] for any [`Aggregate`] on top of any
//! [`EventStore`]. The store and the payload registry it decodes with are
//! the only collaborators; nothing here knows about a concrete engine.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::foundation::{Aggregate, AggregateId, Criteria, Event};
use crate::ports::{AggregateRepository, EventStore, RepositoryError};

/// Generic repository that persists aggregates as event streams.
pub struct EventSourcedRepository<A> {
    store: Arc<dyn EventStore>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: Aggregate> EventSourcedRepository<A> {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    fn not_found(id: AggregateId) -> RepositoryError {
        RepositoryError::NotFound {
            aggregate_type: A::AGGREGATE_TYPE,
            id,
        }
    }
}

impl<A> Clone for EventSourcedRepository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _aggregate: PhantomData,
        }
    }
}

impl<A: Aggregate> fmt::Debug for EventSourcedRepository<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSourcedRepository")
            .field("aggregate_type", &A::AGGREGATE_TYPE)
            .finish()
    }
}

#[async_trait]
impl<A: Aggregate> AggregateRepository<A> for EventSourcedRepository<A> {
    #[tracing::instrument(skip_all, fields(aggregate_type = A::AGGREGATE_TYPE, aggregate_id = %aggregate.id()))]
    async fn save(&self, aggregate: &mut A) -> Result<(), RepositoryError> {
        let changes = aggregate.drain_uncommitted_changes();
        if changes.is_empty() {
            return Ok(());
        }

        self.store.save(&changes).await?;
        tracing::debug!(saved = changes.len(), version = aggregate.version(), "aggregate saved");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(aggregate_type = A::AGGREGATE_TYPE))]
    async fn get_by_id(&self, id: AggregateId) -> Result<A, RepositoryError> {
        let events = self.store.get(&Criteria::aggregate_id(id)).await?;
        if events.is_empty() {
            return Err(Self::not_found(id));
        }

        let aggregate = A::hydrate(id, events)?;
        if aggregate.is_deleted() {
            return Err(Self::not_found(id));
        }
        Ok(aggregate)
    }

    #[tracing::instrument(skip(self), fields(aggregate_type = A::AGGREGATE_TYPE))]
    async fn get_all(&self) -> Result<Vec<A>, RepositoryError> {
        let events = self
            .store
            .get(&Criteria::aggregate_type(A::AGGREGATE_TYPE))
            .await?;

        let mut order: Vec<AggregateId> = Vec::new();
        let mut streams: HashMap<AggregateId, Vec<Event>> = HashMap::new();
        for event in events {
            let stream = streams.entry(event.aggregate_id).or_insert_with(|| {
                order.push(event.aggregate_id);
                Vec::new()
            });
            stream.push(event);
        }

        let mut aggregates = Vec::with_capacity(order.len());
        for id in order {
            let mut stream = streams.remove(&id).unwrap_or_default();
            stream.sort_by_key(|e| e.aggregate_version);

            let aggregate = A::hydrate(id, stream)?;
            if !aggregate.is_deleted() {
                aggregates.push(aggregate);
            }
        }

        tracing::debug!(count = aggregates.len(), "aggregates loaded");
        Ok(aggregates)
    }

    async fn exists(&self, id: AggregateId) -> Result<bool, RepositoryError> {
        Ok(self.store.exists_by_aggregate_id(id).await?)
    }
}
