//! Error types for the event-sourcing core.
//!
//! Each component owns a `thiserror` enum. Wrapping errors use `#[from]`, so
//! the originating variant is never lost on its way up to the caller, and every
//! enum reports an [`ErrorCode`] the transport layer can map to a status.

use std::fmt;
use thiserror::Error;

use super::{AggregateId, EventId};

/// Stable error categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    NotFound,
    Conflict,
    StorageError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised while registering or resolving event payload decoders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("event type already registered: {0}")]
    DuplicateEventType(String),
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::UnknownEventType(_) => ErrorCode::InternalError,
            RegistryError::DuplicateEventType(_) => ErrorCode::Conflict,
        }
    }
}

/// Errors raised by event store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventStoreError {
    /// An event with this identity is already persisted.
    #[error("duplicate event id: {0}")]
    DuplicateEventId(EventId),

    /// Another writer already persisted this version of the aggregate.
    #[error("version {version} of aggregate {aggregate_id} already exists")]
    DuplicateVersion {
        aggregate_id: AggregateId,
        version: u64,
    },

    #[error("failed to write events: {0}")]
    WriteFailure(String),

    #[error("failed to read events: {0}")]
    ReadFailure(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("event store operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl EventStoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EventStoreError::DuplicateEventId(_) | EventStoreError::DuplicateVersion { .. } => {
                ErrorCode::Conflict
            }
            EventStoreError::WriteFailure(_)
            | EventStoreError::ReadFailure(_)
            | EventStoreError::Timeout(_) => ErrorCode::StorageError,
            EventStoreError::Serialization(_) | EventStoreError::UnknownEventType(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// True for the optimistic-concurrency signal callers may retry on after reloading.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EventStoreError::DuplicateVersion { .. })
    }
}

impl From<RegistryError> for EventStoreError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownEventType(tag) => EventStoreError::UnknownEventType(tag),
            other => EventStoreError::Serialization(other.to_string()),
        }
    }
}

/// Errors raised by the aggregate runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("aggregate {aggregate_type} has no handler for event type {event_type}")]
    UnhandledEventType {
        aggregate_type: &'static str,
        event_type: String,
    },

    #[error("handler for event type {0} registered twice")]
    DuplicateHandler(String),

    #[error("invalid event sequence: {0}")]
    InvalidEventSequence(String),

    #[error("event {event_type} carries an unexpected payload type")]
    PayloadMismatch { event_type: String },

    #[error("aggregate invariant violated: {0}")]
    InvariantViolation(String),
}

impl AggregateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AggregateError::InvariantViolation(_) => ErrorCode::ValidationFailed,
            _ => ErrorCode::InternalError,
        }
    }
}
