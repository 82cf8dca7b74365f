//! Event-sourced aggregate runtime.
//!
//! An aggregate never has its fields set from outside. Every state change is
//! an [`Event`]: new changes are recorded as uncommitted and applied
//! immediately, persisted changes are replayed in version order during
//! hydration. Both paths go through the same handler table.
//!
//! # Lifecycle
//!
//! ```text
//! New ──apply_new_change──▶ Dirty ──drain_uncommitted_changes + save──▶ Clean
//!                            ▲                                            │
//!                            └───────────────apply_new_change─────────────┘
//! hydrate(id, events) ──▶ Clean
//! ```
//!
//! # Example
//!
//! ```ignore
//! impl Aggregate for Asset {
//!     const AGGREGATE_TYPE: &'static str = "asset";
//!     const EVENT_TYPES: &'static [&'static str] = &["asset.created", "asset.deleted"];
//!     // ...
//! }
//!
//! fn handlers() -> Result<EventHandlers<Asset>, AggregateError> {
//!     EventHandlers::builder()
//!         .on::<AssetCreated>(Asset::on_created)
//!         .on::<AssetDeleted>(Asset::on_deleted)
//!         .build()
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{AggregateError, AggregateId, Event, PayloadType};

type BoxedHandler<A> = Box<dyn Fn(&mut A, &Event) -> Result<(), AggregateError> + Send + Sync>;

// ============================================
// Handler table
// ============================================

/// Mapping from event type tag to the mutator that applies it.
///
/// Meant to be built once per aggregate kind and shared by every instance
/// through an `Arc`. Construction fails unless every type in
/// `A::EVENT_TYPES` has exactly one handler.
pub struct EventHandlers<A> {
    handlers: HashMap<&'static str, BoxedHandler<A>>,
}

impl<A: Aggregate> EventHandlers<A> {
    /// Starts a new handler table.
    pub fn builder() -> EventHandlersBuilder<A> {
        EventHandlersBuilder {
            handlers: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Applies one event to the aggregate.
    ///
    /// # Errors
    ///
    /// - `UnhandledEventType` if no handler is registered for the event's tag
    /// - `PayloadMismatch` if the payload is not the handler's type
    /// - whatever the handler itself returns
    pub fn apply(&self, aggregate: &mut A, event: &Event) -> Result<(), AggregateError> {
        let handler = self.handlers.get(event.event_type.as_str()).ok_or_else(|| {
            AggregateError::UnhandledEventType {
                aggregate_type: A::AGGREGATE_TYPE,
                event_type: event.event_type.clone(),
            }
        })?;
        handler(aggregate, event)
    }

    /// Checks whether a handler exists for the tag.
    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }
}

impl<A> fmt::Debug for EventHandlers<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.handlers.keys().collect();
        tags.sort();
        f.debug_struct("EventHandlers").field("event_types", &tags).finish()
    }
}

/// Builder for [`EventHandlers`].
pub struct EventHandlersBuilder<A> {
    handlers: HashMap<&'static str, BoxedHandler<A>>,
    duplicates: Vec<&'static str>,
}

impl<A: Aggregate> EventHandlersBuilder<A> {
    /// Registers a typed mutator for `P::EVENT_TYPE`.
    pub fn on<P: PayloadType>(mut self, handler: fn(&mut A, &P) -> Result<(), AggregateError>) -> Self {
        if self.handlers.contains_key(P::EVENT_TYPE) {
            self.duplicates.push(P::EVENT_TYPE);
            return self;
        }

        let boxed: BoxedHandler<A> = Box::new(move |aggregate: &mut A, event: &Event| {
            let payload = event.payload_as::<P>().ok_or_else(|| AggregateError::PayloadMismatch {
                event_type: event.event_type.clone(),
            })?;
            handler(aggregate, payload)
        });
        self.handlers.insert(P::EVENT_TYPE, boxed);
        self
    }

    /// Finalizes the table, checking it against `A::EVENT_TYPES`.
    ///
    /// # Errors
    ///
    /// - `DuplicateHandler` if a tag was registered more than once
    /// - `UnhandledEventType` if a producible tag has no handler
    pub fn build(self) -> Result<EventHandlers<A>, AggregateError> {
        if let Some(tag) = self.duplicates.first() {
            return Err(AggregateError::DuplicateHandler(tag.to_string()));
        }

        if let Some(missing) = A::EVENT_TYPES
            .iter()
            .find(|tag| !self.handlers.contains_key(*tag))
        {
            return Err(AggregateError::UnhandledEventType {
                aggregate_type: A::AGGREGATE_TYPE,
                event_type: missing.to_string(),
            });
        }

        Ok(EventHandlers {
            handlers: self.handlers,
        })
    }
}

// ============================================
// Aggregate root state
// ============================================

/// Runtime state every event-sourced aggregate embeds.
pub struct AggregateRoot<A> {
    id: AggregateId,
    version: u64,
    changes: Vec<Event>,
    handlers: Arc<EventHandlers<A>>,
}

impl<A> AggregateRoot<A> {
    /// Creates root state at version 0 with no changes.
    pub fn new(id: AggregateId, handlers: Arc<EventHandlers<A>>) -> Self {
        Self {
            id,
            version: 0,
            changes: Vec::new(),
            handlers,
        }
    }

    pub fn id(&self) -> AggregateId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn changes(&self) -> &[Event] {
        &self.changes
    }

    /// Handler table shared with every other instance of the kind.
    pub fn handlers(&self) -> &Arc<EventHandlers<A>> {
        &self.handlers
    }
}

impl<A> Clone for AggregateRoot<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            version: self.version,
            changes: self.changes.clone(),
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<A> fmt::Debug for AggregateRoot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateRoot")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("uncommitted", &self.changes.len())
            .finish()
    }
}

// ============================================
// Aggregate trait
// ============================================

/// Contract every event-sourced entity satisfies.
///
/// Implementors provide the root accessors, a blank starting state, and
/// their invariants; the runtime operations are provided.
pub trait Aggregate: Sized + Send + Sync + 'static {
    /// Kind name stored with every event (e.g. "asset").
    const AGGREGATE_TYPE: &'static str;

    /// Every event type this aggregate can produce or replay.
    const EVENT_TYPES: &'static [&'static str];

    fn root(&self) -> &AggregateRoot<Self>;

    fn root_mut(&mut self) -> &mut AggregateRoot<Self>;

    /// Returns an empty instance at version 0, the starting point of replay.
    fn blank(id: AggregateId) -> Result<Self, AggregateError>;

    /// Entity-specific invariants, checked after hydration.
    fn check_invariants(&self) -> Result<(), AggregateError>;

    /// Whether the aggregate has been logically deleted.
    fn is_deleted(&self) -> bool {
        false
    }

    fn id(&self) -> AggregateId {
        self.root().id
    }

    /// Number of changes applied so far, persisted or not.
    fn version(&self) -> u64 {
        self.root().version
    }

    fn uncommitted_changes(&self) -> &[Event] {
        self.root().changes()
    }

    fn has_uncommitted_changes(&self) -> bool {
        !self.root().changes.is_empty()
    }

    /// Records a new change and applies it to in-memory state.
    ///
    /// The event gets a fresh id, this aggregate's id and type, version
    /// `version + 1`, and the current time.
    ///
    /// # Errors
    ///
    /// - `UnhandledEventType` if the payload's tag has no handler
    /// - any error the handler returns; the version and pending changes are
    ///   left untouched, but fields the handler already wrote stay written, so
    ///   handlers validate before mutating
    fn apply_new_change<P: PayloadType>(&mut self, payload: P) -> Result<(), AggregateError> {
        let root = self.root();
        let event = Event::new(root.id, Self::AGGREGATE_TYPE, root.version + 1, payload);
        let handlers = Arc::clone(&root.handlers);

        handlers.apply(self, &event)?;

        let root = self.root_mut();
        root.version = event.aggregate_version;
        root.changes.push(event);
        Ok(())
    }

    /// Takes the pending changes, leaving none behind.
    fn drain_uncommitted_changes(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.root_mut().changes)
    }

    /// Rebuilds an aggregate from its persisted, version-ordered history.
    ///
    /// Replay never records uncommitted changes.
    ///
    /// # Errors
    ///
    /// - `InvalidEventSequence` if versions are not exactly `1..=n`, or an
    ///   event belongs to another aggregate
    /// - `UnhandledEventType` / `PayloadMismatch` from the handler table
    /// - `InvariantViolation` if the rebuilt state is invalid
    fn hydrate(
        id: AggregateId,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<Self, AggregateError> {
        let mut aggregate = Self::blank(id)?;
        let handlers = Arc::clone(&aggregate.root().handlers);

        for event in events {
            if event.aggregate_id != id || event.aggregate_type != Self::AGGREGATE_TYPE {
                return Err(AggregateError::InvalidEventSequence(format!(
                    "event {} belongs to {} {}, expected {} {}",
                    event.id,
                    event.aggregate_type,
                    event.aggregate_id,
                    Self::AGGREGATE_TYPE,
                    id
                )));
            }

            let expected = aggregate.version() + 1;
            if event.aggregate_version != expected {
                return Err(AggregateError::InvalidEventSequence(format!(
                    "expected version {}, found {}",
                    expected, event.aggregate_version
                )));
            }

            handlers.apply(&mut aggregate, &event)?;
            aggregate.root_mut().version = event.aggregate_version;
        }

        aggregate.check_invariants()?;
        Ok(aggregate)
    }
}
