//! Startup wiring for the asset context.
//!
//! Builds the payload registry, registers one repository constructor per
//! storage engine, and routes the asset commands onto a command bus.

use std::sync::Arc;

use crate::adapters::postgres::{self, PostgresEventStore};
use crate::adapters::{EventSourcedRepository, InMemoryEventStore};
use crate::config::{DatabaseConfig, DatabaseEngine};
use crate::domain::asset::{Asset, AssetCreated, AssetDeleted, AssetModified};
use crate::domain::foundation::{PayloadRegistry, RegistryError};
use crate::ports::{EventStore, RepositoryError};

use super::command_bus::{CommandBus, CommandBusError, TracingMiddleware};
use super::handlers::{
    AssetCommandError, AssetRepository, CreateAsset, CreateAssetHandler, DeleteAsset, DeleteAssetHandler,
    ModifyAsset, ModifyAssetHandler,
};
use super::repository_factory::{FactoryError, ReleaseHandle, RepositoryFactory};

/// Registry holding every asset event payload.
pub fn asset_payload_registry() -> Result<PayloadRegistry, RegistryError> {
    PayloadRegistry::new()
        .with::<AssetCreated>()?
        .with::<AssetModified>()?
        .with::<AssetDeleted>()
}

/// Factory with a constructor registered for every supported engine.
pub fn asset_repository_factory(
    config: &DatabaseConfig,
    registry: Arc<PayloadRegistry>,
) -> Result<RepositoryFactory<AssetRepository>, FactoryError> {
    let mut factory = RepositoryFactory::new();

    let memory_registry = Arc::clone(&registry);
    factory.register_repository(DatabaseEngine::InMemory, move || {
        in_memory_repository(Arc::clone(&memory_registry))
    })?;

    let postgres_config = config.clone();
    factory.register_repository(DatabaseEngine::Postgres, move || {
        postgres_repository(postgres_config.clone(), Arc::clone(&registry))
    })?;

    Ok(factory)
}

async fn in_memory_repository(
    registry: Arc<PayloadRegistry>,
) -> Result<(AssetRepository, ReleaseHandle), RepositoryError> {
    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new(registry));
    let repository: AssetRepository = Arc::new(EventSourcedRepository::<Asset>::new(store));
    Ok((repository, ReleaseHandle::noop()))
}

async fn postgres_repository(
    config: DatabaseConfig,
    registry: Arc<PayloadRegistry>,
) -> Result<(AssetRepository, ReleaseHandle), RepositoryError> {
    let pool = postgres::connect(&config).await?;
    if config.run_migrations {
        postgres::run_migrations(&pool).await?;
    }

    let store = PostgresEventStore::new(pool.clone(), registry, config.operation_timeout()).await?;
    let repository: AssetRepository =
        Arc::new(EventSourcedRepository::<Asset>::new(Arc::new(store)));

    let release = ReleaseHandle::new(move || async move {
        pool.close().await;
        tracing::info!("postgres pool closed");
    });
    Ok((repository, release))
}

/// Bus with the create, modify and delete handlers behind tracing middleware.
pub fn asset_command_bus(
    repository: AssetRepository,
    service: &str,
) -> Result<CommandBus<AssetCommandError>, CommandBusError> {
    let mut bus: CommandBus<AssetCommandError> = CommandBus::new();
    bus.use_middleware(TracingMiddleware::new(service));

    let create = Arc::new(CreateAssetHandler::new(Arc::clone(&repository)));
    bus.register_handler(move |cmd: CreateAsset| {
        let handler = Arc::clone(&create);
        async move { handler.handle(cmd).await.map_err(AssetCommandError::from) }
    })?;

    let modify = Arc::new(ModifyAssetHandler::new(Arc::clone(&repository)));
    bus.register_handler(move |cmd: ModifyAsset| {
        let handler = Arc::clone(&modify);
        async move { handler.handle(cmd).await.map_err(AssetCommandError::from) }
    })?;

    let delete = Arc::new(DeleteAssetHandler::new(repository));
    bus.register_handler(move |cmd: DeleteAsset| {
        let handler = Arc::clone(&delete);
        async move { handler.handle(cmd).await.map_err(AssetCommandError::from) }
    })?;

    Ok(bus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_holds_every_asset_event() {
        let registry = asset_payload_registry().unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("asset.created"));
        assert!(registry.contains("asset.modified"));
        assert!(registry.contains("asset.deleted"));
    }

    #[test]
    fn factory_registers_both_engines() {
        let registry = Arc::new(asset_payload_registry().unwrap());
        let factory = asset_repository_factory(&DatabaseConfig::default(), registry).unwrap();

        assert_eq!(
            factory.registered_engines(),
            vec![DatabaseEngine::InMemory, DatabaseEngine::Postgres]
        );
    }

    #[tokio::test]
    async fn in_memory_engine_builds_a_working_repository() {
        let registry = Arc::new(asset_payload_registry().unwrap());
        let factory = asset_repository_factory(&DatabaseConfig::default(), registry).unwrap();

        let created = factory
            .create_repository(DatabaseEngine::InMemory)
            .await
            .unwrap();

        assert!(created.repository.get_all().await.unwrap().is_empty());
        created.release.release().await;
    }

    #[test]
    fn bus_routes_all_asset_commands() {
        let registry = Arc::new(asset_payload_registry().unwrap());
        let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new(registry));
        let repository: AssetRepository = Arc::new(EventSourcedRepository::<Asset>::new(store));

        let bus = asset_command_bus(repository, "assets").unwrap();

        assert!(bus.has_handler::<CreateAsset>());
        assert!(bus.has_handler::<ModifyAsset>());
        assert!(bus.has_handler::<DeleteAsset>());
    }
}
