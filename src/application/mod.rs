//! Application layer - Commands, Handlers, and wiring.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Commands reach their handlers through the [`CommandBus`]; storage is chosen
//! at startup through the [`RepositoryFactory`].

pub mod command_bus;
pub mod handlers;
pub mod repository_factory;
pub mod wiring;

pub use command_bus::{
    Command, CommandBus, CommandBusError, CommandOutput, DispatchedCommand, Middleware, Next,
    TracingMiddleware,
};
pub use handlers::{
    AssetCommandError, AssetRepository, CreateAsset, CreateAssetHandler, DeleteAsset, DeleteAssetHandler,
    ModifyAsset, ModifyAssetHandler,
};
pub use repository_factory::{CreatedRepository, FactoryError, ReleaseHandle, RepositoryFactory};
pub use wiring::{asset_command_bus, asset_payload_registry, asset_repository_factory};
