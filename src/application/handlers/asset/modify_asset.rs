//! ModifyAssetHandler - Command handler for changing an asset's attributes.

use crate::application::Command;
use crate::domain::asset::{AssetError, AssetType, Money};
use crate::domain::foundation::Aggregate;

use super::{parse_asset_id, AssetRepository};

/// Command to replace an asset's name, type and money.
#[derive(Debug, Clone)]
pub struct ModifyAsset {
    pub id: String,
    pub name: String,
    pub asset_type: String,
    pub amount: f64,
    pub currency: String,
}

impl Command for ModifyAsset {
    const COMMAND_NAME: &'static str = "ModifyAsset";
    type Output = u64;
}

/// Handler for modifying assets.
pub struct ModifyAssetHandler {
    repository: AssetRepository,
}

impl ModifyAssetHandler {
    pub fn new(repository: AssetRepository) -> Self {
        Self { repository }
    }

    /// Returns the asset's version after the change.
    ///
    /// Nothing is written when every value is unchanged.
    pub async fn handle(&self, cmd: ModifyAsset) -> Result<u64, AssetError> {
        let id = parse_asset_id(&cmd.id)?;
        let asset_type: AssetType = cmd.asset_type.parse()?;
        let money = Money::parse(cmd.amount, &cmd.currency)?;

        let mut asset = self.repository.get_by_id(id).await?;
        if asset.modify(cmd.name, asset_type, money)? {
            self.repository.save(&mut asset).await?;
            tracing::info!(asset_id = %id, version = asset.version(), "asset modified");
        }

        Ok(asset.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{EventSourcedRepository, InMemoryEventStore};
    use crate::application::wiring::asset_payload_registry;
    use crate::domain::asset::{Asset, Currency};
    use crate::domain::foundation::AggregateId;
    use crate::ports::EventStore;
    use std::sync::Arc;

    async fn seeded() -> (Arc<InMemoryEventStore>, AssetRepository, AggregateId) {
        let store = Arc::new(InMemoryEventStore::new(Arc::new(
            asset_payload_registry().unwrap(),
        )));
        let repo: AssetRepository = Arc::new(EventSourcedRepository::<Asset>::new(
            store.clone() as Arc<dyn EventStore>,
        ));
        let id = AggregateId::new();
        let money = Money::new(100.0, Currency::Usd).unwrap();
        let mut asset = Asset::create(id, "Savings", AssetType::Bank, money).unwrap();
        repo.save(&mut asset).await.unwrap();
        (store, repo, id)
    }

    fn command(id: AggregateId, name: &str, amount: f64) -> ModifyAsset {
        ModifyAsset {
            id: id.to_string(),
            name: name.to_string(),
            asset_type: "bank".to_string(),
            amount,
            currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn modifies_and_persists() {
        let (_, repo, id) = seeded().await;
        let handler = ModifyAssetHandler::new(repo.clone());

        let version = handler.handle(command(id, "Emergency fund", 250.0)).await.unwrap();

        assert_eq!(version, 2);
        let loaded = repo.get_by_id(id).await.unwrap();
        assert_eq!(loaded.name(), "Emergency fund");
        assert_eq!(loaded.money().amount(), 250.0);
    }

    #[tokio::test]
    async fn unchanged_values_write_nothing() {
        let (store, repo, id) = seeded().await;
        let handler = ModifyAssetHandler::new(repo);

        let version = handler.handle(command(id, "Savings", 100.0)).await.unwrap();

        assert_eq!(version, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_asset_is_not_found() {
        let (_, repo, _) = seeded().await;
        let handler = ModifyAssetHandler::new(repo);
        let missing = AggregateId::new();

        let err = handler.handle(command(missing, "X", 1.0)).await.unwrap_err();

        assert_eq!(err, AssetError::NotFound(missing));
    }
}
