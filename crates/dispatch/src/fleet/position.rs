//! Asset identity and position samples

use chrono::{DateTime, Utc};
use fleetwatch_core::GeoCoordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Telematics provider identifier for a vehicle's tracking device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

/// Rejected external asset reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed asset id: {0:?}")]
pub struct AssetIdError(pub String);

impl AssetId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for AssetId {
    type Err = AssetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(AssetIdError(s.to_string())),
            Ok(id) => Ok(Self(id)),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One position sample for an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPosition {
    pub asset_id: AssetId,
    pub coordinate: GeoCoordinate,
    pub timestamp: DateTime<Utc>,
}

impl AssetPosition {
    pub fn new(asset_id: AssetId, coordinate: GeoCoordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            asset_id,
            coordinate,
            timestamp,
        }
    }

    /// Same instant and same place as `other`.
    ///
    /// Timestamps are compared at millisecond precision since that is what
    /// the position log stores.
    pub fn is_same_sample(&self, other: &AssetPosition) -> bool {
        self.asset_id == other.asset_id
            && self.timestamp.timestamp_millis() == other.timestamp.timestamp_millis()
            && self.coordinate == other.coordinate
    }
}
