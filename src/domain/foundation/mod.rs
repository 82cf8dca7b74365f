//! Foundation module - Event-sourcing primitives.
//!
//! Contains identifiers, the event model, the payload registry, query
//! criteria and the aggregate runtime that every bounded context builds on.

mod aggregate;
mod criteria;
mod errors;
mod events;
mod ids;
mod registry;
mod timestamp;

pub use aggregate::{Aggregate, AggregateRoot, EventHandlers, EventHandlersBuilder};
pub use criteria::{Criteria, SqlFilter, SqlParam};
pub use errors::{AggregateError, ErrorCode, EventStoreError, RegistryError};
pub use events::{Event, EventPayload, EventRecord, PayloadType};
pub use ids::{AggregateId, EventId};
pub use registry::{PayloadDecoder, PayloadRegistry};
pub use timestamp::Timestamp;
