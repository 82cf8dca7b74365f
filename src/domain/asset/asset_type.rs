//! Asset type value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AssetError;

/// Category of holding an asset represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Cash,
    Bank,
    Investment,
    Other,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Cash => "cash",
            AssetType::Bank => "bank",
            AssetType::Investment => "investment",
            AssetType::Other => "other",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(AssetType::Cash),
            "bank" => Ok(AssetType::Bank),
            "investment" => Ok(AssetType::Investment),
            "other" => Ok(AssetType::Other),
            other => Err(AssetError::InvalidAssetType(other.to_string())),
        }
    }
}
