//! Event infrastructure for the append-only log.
//!
//! - `PayloadType` - Implemented by every concrete event payload struct
//! - `EventPayload` - Object-safe view of a payload, stored inside `Event`
//! - `Event` - An immutable, versioned fact about one aggregate
//! - `EventRecord` - The persisted shape of an event (JSON payload)

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use super::{AggregateId, EventId, EventStoreError, PayloadRegistry, Timestamp};

// ============================================
// Payload traits
// ============================================

/// Trait that all concrete event payloads implement.
///
/// The constant tag is what gets persisted in the `type` column and what the
/// aggregate's handler table and the payload registry are keyed on.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct AssetDeleted { pub asset_id: AggregateId }
///
/// impl PayloadType for AssetDeleted {
///     const EVENT_TYPE: &'static str = "asset.deleted";
/// }
/// ```
pub trait PayloadType: Any + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// Event type tag (e.g. "asset.created").
    const EVENT_TYPE: &'static str;
}

/// Object-safe payload carried by an [`Event`].
///
/// Blanket-implemented for every [`PayloadType`]; never implement by hand.
pub trait EventPayload: Any + Debug + Send + Sync {
    /// Returns the event type tag.
    fn event_type(&self) -> &'static str;

    /// Encodes the payload as JSON for storage.
    fn to_json(&self) -> Result<JsonValue, serde_json::Error>;

    /// Upcast used for downcasting to the concrete payload.
    fn as_any(&self) -> &dyn Any;
}

impl<T: PayloadType> EventPayload for T {
    fn event_type(&self) -> &'static str {
        T::EVENT_TYPE
    }

    fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================
// Event
// ============================================

/// An immutable fact describing one state change of one aggregate.
///
/// `aggregate_version` starts at 1 and is gapless per aggregate id.
#[derive(Debug, Clone)]
pub struct Event {
    /// Unique identity of this event.
    pub id: EventId,

    /// Payload tag, also the key of the handler that applies it.
    pub event_type: String,

    /// Aggregate whose stream this event belongs to.
    pub aggregate_id: AggregateId,

    /// Kind of the owning aggregate (e.g. "asset").
    pub aggregate_type: String,

    /// Position of this event in the aggregate's stream.
    pub aggregate_version: u64,

    /// Typed payload.
    pub payload: Arc<dyn EventPayload>,

    /// When the event was created.
    pub timestamp: Timestamp,
}

impl Event {
    /// Creates a fresh event with a new identity and the current time.
    pub fn new<P: PayloadType>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        aggregate_version: u64,
        payload: P,
    ) -> Self {
        Self::from_parts(
            EventId::new(),
            aggregate_id,
            aggregate_type,
            aggregate_version,
            Arc::new(payload),
            Timestamp::now().truncated_to_micros(),
        )
    }

    /// Reassembles an event from already-known parts (used when decoding).
    pub fn from_parts(
        id: EventId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        aggregate_version: u64,
        payload: Arc<dyn EventPayload>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            event_type: payload.event_type().to_string(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            aggregate_version,
            payload,
            timestamp,
        }
    }

    /// Overrides the creation time.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Overrides the event identity.
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    /// Downcasts the payload to a concrete type.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }
}

// ============================================
// EventRecord
// ============================================

/// Storage form of an [`Event`]: the payload is encoded as JSON.
///
/// Field names match the persisted record layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,

    #[serde(rename = "type")]
    pub event_type: String,

    pub aggregate_id: AggregateId,

    pub aggregate_type: String,

    pub aggregate_version: u64,

    pub data: JsonValue,

    pub timestamp: Timestamp,
}

impl EventRecord {
    /// Encodes an event for storage.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the payload cannot be encoded or the version is 0
    pub fn encode(event: &Event) -> Result<Self, EventStoreError> {
        if event.aggregate_version == 0 {
            return Err(EventStoreError::Serialization(format!(
                "event {} has version 0; versions start at 1",
                event.id
            )));
        }

        let data = event
            .payload
            .to_json()
            .map_err(|e| EventStoreError::Serialization(e.to_string()))?;

        Ok(Self {
            id: event.id,
            event_type: event.event_type.clone(),
            aggregate_id: event.aggregate_id,
            aggregate_type: event.aggregate_type.clone(),
            aggregate_version: event.aggregate_version,
            data,
            timestamp: event.timestamp,
        })
    }

    /// Decodes the record back into an event using the registry.
    ///
    /// # Errors
    ///
    /// - `UnknownEventType` if no decoder is registered for the tag
    /// - `Serialization` if the stored payload does not match the registered shape
    pub fn decode(&self, registry: &PayloadRegistry) -> Result<Event, EventStoreError> {
        let payload = registry.decode(&self.event_type, self.data.clone())?;

        Ok(Event::from_parts(
            self.id,
            self.aggregate_id,
            self.aggregate_type.clone(),
            self.aggregate_version,
            payload,
            self.timestamp,
        ))
    }
}
