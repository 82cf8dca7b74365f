//! In-memory adapters.

mod event_store;

pub use event_store::InMemoryEventStore;
