use std::sync::Arc;

use assetflow::application::{
    asset_command_bus, asset_payload_registry, asset_repository_factory,
};
use assetflow::config::AppConfig;
use assetflow::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.service);
    tracing::info!(
        service = %config.service.name,
        environment = config.service.environment.as_str(),
        engine = %config.database.engine,
        "configuration loaded"
    );

    let registry = Arc::new(asset_payload_registry()?);
    let factory = asset_repository_factory(&config.database, registry)?;
    let created = factory.create_repository(config.database.engine).await?;

    let bus = asset_command_bus(created.repository, &config.service.name)?;
    tracing::info!(?bus, "asset service ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    created.release.release().await;
    tracing::info!("asset service stopped");
    Ok(())
}
