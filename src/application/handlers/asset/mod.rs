//! Asset command handlers.

mod create_asset;
mod delete_asset;
mod modify_asset;

pub use create_asset::{CreateAsset, CreateAssetHandler};
pub use delete_asset::{DeleteAsset, DeleteAssetHandler};
pub use modify_asset::{ModifyAsset, ModifyAssetHandler};

use std::sync::Arc;
use thiserror::Error;

use crate::application::CommandBusError;
use crate::domain::asset::{Asset, AssetError};
use crate::domain::foundation::{AggregateId, ErrorCode};
use crate::ports::AggregateRepository;

/// Shared repository handle the asset handlers work against.
pub type AssetRepository = Arc<dyn AggregateRepository<Asset>>;

/// Failure of an asset command dispatched through the bus.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetCommandError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Bus(#[from] CommandBusError),
}

impl AssetCommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AssetCommandError::Asset(e) => e.code(),
            AssetCommandError::Bus(e) => e.code(),
        }
    }
}

fn parse_asset_id(raw: &str) -> Result<AggregateId, AssetError> {
    raw.parse()
        .map_err(|_| AssetError::InvalidId(raw.to_string()))
}
