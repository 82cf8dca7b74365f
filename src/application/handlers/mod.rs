//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod asset;

pub use asset::{
    AssetCommandError, AssetRepository, CreateAsset, CreateAssetHandler, DeleteAsset, DeleteAssetHandler,
    ModifyAsset, ModifyAssetHandler,
};
