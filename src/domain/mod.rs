//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Event-sourcing primitives (ids, events, criteria, aggregate runtime, errors)
//! - `asset` - Asset aggregate, its events and value objects

pub mod asset;
pub mod foundation;
