//! Payload registry for event deserialization.
//!
//! Maps an event type tag to the decoder for that payload shape. Stored
//! events carry only the tag and a JSON document; the registry is the one
//! place that knows which Rust type a tag decodes into.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = PayloadRegistry::new();
//! registry.register::<AssetCreated>()?;
//! registry.register::<AssetDeleted>()?;
//!
//! // Wiring is done; share it read-only from here on.
//! let registry = Arc::new(registry);
//! ```

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

use super::{EventPayload, EventStoreError, PayloadType, RegistryError};

/// Decoder that rebuilds a typed payload from its JSON form.
pub type PayloadDecoder = fn(JsonValue) -> Result<Arc<dyn EventPayload>, serde_json::Error>;

fn decode_payload<T: PayloadType>(data: JsonValue) -> Result<Arc<dyn EventPayload>, serde_json::Error> {
    let payload: T = serde_json::from_value(data)?;
    Ok(Arc::new(payload))
}

/// Registry of payload decoders keyed by event type tag.
///
/// Populated once during wiring, then shared as `Arc<PayloadRegistry>`.
/// It has no interior mutability, so concurrent readers need no locking.
#[derive(Default, Clone)]
pub struct PayloadRegistry {
    decoders: HashMap<&'static str, PayloadDecoder>,
}

impl PayloadRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registers the decoder for `T::EVENT_TYPE`.
    ///
    /// # Errors
    ///
    /// - `DuplicateEventType` if the tag is already registered
    pub fn register<T: PayloadType>(&mut self) -> Result<(), RegistryError> {
        if self.decoders.contains_key(T::EVENT_TYPE) {
            return Err(RegistryError::DuplicateEventType(T::EVENT_TYPE.to_string()));
        }
        self.decoders.insert(T::EVENT_TYPE, decode_payload::<T>);
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with<T: PayloadType>(mut self) -> Result<Self, RegistryError> {
        self.register::<T>()?;
        Ok(self)
    }

    /// Returns the decoder registered for `event_type`.
    ///
    /// # Errors
    ///
    /// - `UnknownEventType` if nothing is registered for the tag
    pub fn resolve(&self, event_type: &str) -> Result<PayloadDecoder, RegistryError> {
        self.decoders
            .get(event_type)
            .copied()
            .ok_or_else(|| RegistryError::UnknownEventType(event_type.to_string()))
    }

    /// Decodes a stored payload.
    ///
    /// # Errors
    ///
    /// - `UnknownEventType` if nothing is registered for the tag
    /// - `Serialization` if the JSON does not match the registered shape
    pub fn decode(
        &self,
        event_type: &str,
        data: JsonValue,
    ) -> Result<Arc<dyn EventPayload>, EventStoreError> {
        let decoder = self.resolve(event_type)?;
        decoder(data).map_err(|e| {
            EventStoreError::Serialization(format!("failed to decode {}: {}", event_type, e))
        })
    }

    /// Checks whether a tag is registered.
    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Returns the registered tags, sorted.
    pub fn event_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.decoders.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for PayloadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadRegistry")
            .field("event_types", &self.event_types())
            .finish()
    }
}
