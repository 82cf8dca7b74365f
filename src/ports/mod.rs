//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `EventStore` - Append-only event log with criteria queries
//! - `AggregateRepository` - Save/load facade for one aggregate kind

mod aggregate_repository;
mod event_store;

pub use aggregate_repository::{AggregateRepository, RepositoryError};
pub use event_store::EventStore;
