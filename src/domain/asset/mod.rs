//! Asset domain module.
//!
//! Holdings (cash, bank accounts, investments) tracked as event-sourced
//! aggregates.
//!
//! # Events
//!
//! - `AssetCreated` - Recorded when a new asset is registered
//! - `AssetModified` - Recorded when name, type or money change
//! - `AssetDeleted` - Recorded when an asset is logically deleted

mod aggregate;
mod asset_type;
mod errors;
mod events;
mod money;

pub use aggregate::Asset;
pub use asset_type::AssetType;
pub use errors::AssetError;
pub use events::{AssetCreated, AssetDeleted, AssetModified};
pub use money::{Currency, Money};
