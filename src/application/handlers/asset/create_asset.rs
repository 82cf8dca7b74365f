//! CreateAssetHandler - Command handler for registering new assets.

use crate::application::Command;
use crate::domain::asset::{Asset, AssetError, AssetType, Money};
use crate::domain::foundation::Aggregate;
use crate::ports::RepositoryError;

use super::{parse_asset_id, AssetRepository};

/// Command to create a new asset under a caller-chosen id.
#[derive(Debug, Clone)]
pub struct CreateAsset {
    pub id: String,
    pub name: String,
    pub asset_type: String,
    pub amount: f64,
    pub currency: String,
}

impl Command for CreateAsset {
    const COMMAND_NAME: &'static str = "CreateAsset";
    type Output = u64;
}

/// Handler for creating assets.
pub struct CreateAssetHandler {
    repository: AssetRepository,
}

impl CreateAssetHandler {
    pub fn new(repository: AssetRepository) -> Self {
        Self { repository }
    }

    /// Returns the new asset's version.
    pub async fn handle(&self, cmd: CreateAsset) -> Result<u64, AssetError> {
        let id = parse_asset_id(&cmd.id)?;
        let asset_type: AssetType = cmd.asset_type.parse()?;
        let money = Money::parse(cmd.amount, &cmd.currency)?;

        // Fast path only; the store's version constraint settles races below.
        if self.repository.exists(id).await? {
            return Err(AssetError::AlreadyExists(id));
        }

        let mut asset = Asset::create(id, cmd.name, asset_type, money)?;
        self.repository
            .save(&mut asset)
            .await
            .map_err(|err| match err {
                RepositoryError::Store(store) if store.is_conflict() => {
                    AssetError::AlreadyExists(id)
                }
                other => other.into(),
            })?;

        tracing::info!(asset_id = %id, "asset created");
        Ok(asset.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AggregateId, EventStoreError};
    use crate::ports::AggregateRepository;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Repository double that records saves and can simulate races or faults.
    struct MockAssetRepository {
        saved: Mutex<Vec<Asset>>,
        exists: bool,
        save_error: Option<RepositoryError>,
    }

    impl MockAssetRepository {
        fn new() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                exists: false,
                save_error: None,
            }
        }

        fn existing() -> Self {
            Self {
                exists: true,
                ..Self::new()
            }
        }

        fn failing(err: RepositoryError) -> Self {
            Self {
                save_error: Some(err),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl AggregateRepository<Asset> for MockAssetRepository {
        async fn save(&self, aggregate: &mut Asset) -> Result<(), RepositoryError> {
            let _ = aggregate.drain_uncommitted_changes();
            if let Some(err) = &self.save_error {
                return Err(err.clone());
            }
            self.saved.lock().unwrap().push(aggregate.clone());
            Ok(())
        }

        async fn get_by_id(&self, id: AggregateId) -> Result<Asset, RepositoryError> {
            Err(RepositoryError::NotFound {
                aggregate_type: "asset",
                id,
            })
        }

        async fn get_all(&self) -> Result<Vec<Asset>, RepositoryError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn exists(&self, _id: AggregateId) -> Result<bool, RepositoryError> {
            Ok(self.exists)
        }
    }

    fn command(id: AggregateId) -> CreateAsset {
        CreateAsset {
            id: id.to_string(),
            name: "Savings".to_string(),
            asset_type: "bank".to_string(),
            amount: 1500.0,
            currency: "EUR".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_and_saves_asset() {
        let repo = Arc::new(MockAssetRepository::new());
        let handler = CreateAssetHandler::new(repo.clone());
        let id = AggregateId::new();

        let version = handler.handle(command(id)).await.unwrap();

        assert_eq!(version, 1);
        let saved = repo.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id(), id);
        assert_eq!(saved[0].name(), "Savings");
    }

    #[tokio::test]
    async fn rejects_existing_id() {
        let handler = CreateAssetHandler::new(Arc::new(MockAssetRepository::existing()));
        let id = AggregateId::new();

        let err = handler.handle(command(id)).await.unwrap_err();

        assert_eq!(err, AssetError::AlreadyExists(id));
    }

    #[tokio::test]
    async fn lost_race_is_reported_as_already_exists() {
        let id = AggregateId::new();
        let repo = MockAssetRepository::failing(RepositoryError::Store(
            EventStoreError::DuplicateVersion {
                aggregate_id: id,
                version: 1,
            },
        ));
        let handler = CreateAssetHandler::new(Arc::new(repo));

        let err = handler.handle(command(id)).await.unwrap_err();

        assert_eq!(err, AssetError::AlreadyExists(id));
    }

    #[tokio::test]
    async fn write_failure_is_propagated() {
        let repo = MockAssetRepository::failing(RepositoryError::Store(
            EventStoreError::WriteFailure("disk full".into()),
        ));
        let handler = CreateAssetHandler::new(Arc::new(repo));

        let err = handler.handle(command(AggregateId::new())).await.unwrap_err();

        assert!(matches!(
            err,
            AssetError::Repository(RepositoryError::Store(EventStoreError::WriteFailure(_)))
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_input_before_touching_storage() {
        let repo = Arc::new(MockAssetRepository::new());
        let handler = CreateAssetHandler::new(repo.clone());
        let id = AggregateId::new();

        let bad_id = CreateAsset {
            id: "not-a-uuid".into(),
            ..command(id)
        };
        let bad_type = CreateAsset {
            asset_type: "crypto".into(),
            ..command(id)
        };
        let bad_currency = CreateAsset {
            currency: "GBP".into(),
            ..command(id)
        };
        let negative = CreateAsset {
            amount: -1.0,
            ..command(id)
        };
        let no_name = CreateAsset {
            name: String::new(),
            ..command(id)
        };

        assert_eq!(
            handler.handle(bad_id).await.unwrap_err(),
            AssetError::InvalidId("not-a-uuid".into())
        );
        assert_eq!(
            handler.handle(bad_type).await.unwrap_err(),
            AssetError::InvalidAssetType("crypto".into())
        );
        assert_eq!(
            handler.handle(bad_currency).await.unwrap_err(),
            AssetError::UnsupportedCurrency("GBP".into())
        );
        assert!(matches!(
            handler.handle(negative).await.unwrap_err(),
            AssetError::InvalidAmount(_)
        ));
        assert_eq!(handler.handle(no_name).await.unwrap_err(), AssetError::NameRequired);
        assert!(repo.saved.lock().unwrap().is_empty());
    }
}
