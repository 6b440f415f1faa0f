//! Geofence audit events
//!
//! One [`GeofenceEvent`] is written per detected crossing per load, whether
//! or not the crossing advanced the load's status.

use crate::fleet::position::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a boundary crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceEventType {
    /// Previously outside, now inside
    Entry,
    /// Previously inside, now outside
    Exit,
}

impl GeofenceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeofenceEventType::Entry => "entry",
            GeofenceEventType::Exit => "exit",
        }
    }
}

impl fmt::Display for GeofenceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeofenceEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(GeofenceEventType::Entry),
            "exit" => Ok(GeofenceEventType::Exit),
            other => Err(format!("Unknown geofence event type: {}", other)),
        }
    }
}

/// Append-only audit record of a geofence crossing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceEvent {
    /// Row id of the load the crossing was attributed to
    pub load_id: String,

    /// Asset that crossed
    pub asset_id: AssetId,

    /// Provider geofence identifier
    pub geofence_id: String,

    /// Geofence name at detection time
    pub geofence_name: String,

    /// Entry or exit
    pub event_type: GeofenceEventType,

    /// Timestamp of the sample that revealed the crossing
    pub timestamp: DateTime<Utc>,

    /// Distances, radius and status outcome
    pub metadata: serde_json::Value,
}
