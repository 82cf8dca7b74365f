//! DeleteAssetHandler - Command handler for logically deleting assets.

use crate::application::Command;
use crate::domain::asset::AssetError;
use crate::domain::foundation::Aggregate;

use super::{parse_asset_id, AssetRepository};

/// Command to delete an asset.
#[derive(Debug, Clone)]
pub struct DeleteAsset {
    pub id: String,
}

impl Command for DeleteAsset {
    const COMMAND_NAME: &'static str = "DeleteAsset";
    type Output = u64;
}

/// Handler for deleting assets.
///
/// Deletion appends `asset.deleted`; prior events are kept.
pub struct DeleteAssetHandler {
    repository: AssetRepository,
}

impl DeleteAssetHandler {
    pub fn new(repository: AssetRepository) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: DeleteAsset) -> Result<u64, AssetError> {
        let id = parse_asset_id(&cmd.id)?;

        let mut asset = self.repository.get_by_id(id).await?;
        asset.mark_as_deleted()?;
        self.repository.save(&mut asset).await?;

        tracing::info!(asset_id = %id, "asset deleted");
        Ok(asset.version())
    }
}
