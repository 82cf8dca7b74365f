//! Asset domain events.
//!
//! - `AssetCreated` - A new asset was registered
//! - `AssetModified` - Name, type or money changed
//! - `AssetDeleted` - The asset was logically deleted

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AggregateId, PayloadType};

use super::{AssetType, Currency};

// ════════════════════════════════════════════════════════════════════════════
// AssetCreated
// ════════════════════════════════════════════════════════════════════════════

/// Recorded when an asset is created. Carries the full initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCreated {
    pub asset_id: AggregateId,
    pub name: String,
    pub asset_type: AssetType,
    pub amount: f64,
    pub currency: Currency,
}

impl PayloadType for AssetCreated {
    const EVENT_TYPE: &'static str = "asset.created";
}

// ════════════════════════════════════════════════════════════════════════════
// AssetModified
// ════════════════════════════════════════════════════════════════════════════

/// Recorded when any of an asset's attributes change.
///
/// Holds the values after the change, not a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetModified {
    pub asset_id: AggregateId,
    pub name: String,
    pub asset_type: AssetType,
    pub amount: f64,
    pub currency: Currency,
}

impl PayloadType for AssetModified {
    const EVENT_TYPE: &'static str = "asset.modified";
}

// ════════════════════════════════════════════════════════════════════════════
// AssetDeleted
// ════════════════════════════════════════════════════════════════════════════

/// Recorded when an asset is deleted. History is kept; the asset is only flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDeleted {
    pub asset_id: AggregateId,
}

impl PayloadType for AssetDeleted {
    const EVENT_TYPE: &'static str = "asset.deleted";
}
