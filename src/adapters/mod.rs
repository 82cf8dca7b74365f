//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-process event store for tests and the `inmemory` engine
//! - `postgres` - Event store over a PostgreSQL pool
//! - `repository` - Generic event-sourced repository over any event store

pub mod memory;
pub mod postgres;
mod repository;

pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use repository::EventSourcedRepository;
