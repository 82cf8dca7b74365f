//! Asset-specific error types.

use thiserror::Error;

use crate::domain::foundation::{AggregateError, AggregateId, ErrorCode};
use crate::ports::RepositoryError;

/// Errors raised by the asset aggregate and its command handlers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("asset name is required")]
    NameRequired,

    #[error("invalid asset type: {0}")]
    InvalidAssetType(String),

    #[error("money amount must be a non-negative number, got {0}")]
    InvalidAmount(f64),

    #[error("currency not supported, please use USD or EUR: {0}")]
    UnsupportedCurrency(String),

    #[error("invalid asset id: {0}")]
    InvalidId(String),

    #[error("asset already exists with id {0}")]
    AlreadyExists(AggregateId),

    #[error("asset not found: {0}")]
    NotFound(AggregateId),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl AssetError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AssetError::NameRequired
            | AssetError::InvalidAssetType(_)
            | AssetError::InvalidAmount(_)
            | AssetError::UnsupportedCurrency(_)
            | AssetError::InvalidId(_) => ErrorCode::ValidationFailed,
            AssetError::AlreadyExists(_) => ErrorCode::Conflict,
            AssetError::NotFound(_) => ErrorCode::NotFound,
            AssetError::Aggregate(e) => e.code(),
            AssetError::Repository(e) => e.code(),
        }
    }
}

impl From<RepositoryError> for AssetError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { id, .. } => AssetError::NotFound(id),
            other => AssetError::Repository(other),
        }
    }
}
