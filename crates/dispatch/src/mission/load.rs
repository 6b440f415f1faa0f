//! Loads and their dispatch status

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Dispatch lifecycle states
///
/// Statuses outside the known lifecycle are carried through untouched as
/// [`LoadStatus::Other`] so rows owned by the wider dispatch system are
/// never rewritten by accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    /// Created, not yet scheduled
    Pending,
    /// Scheduled for collection
    Scheduled,
    /// At origin, being loaded
    Loading,
    /// Departed origin
    InTransit,
    /// At destination, being offloaded
    Offloading,
    /// Delivered
    Completed,
    /// Any status this subsystem does not manage
    Other(String),
}

impl LoadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LoadStatus::Pending => "pending",
            LoadStatus::Scheduled => "scheduled",
            LoadStatus::Loading => "loading",
            LoadStatus::InTransit => "in-transit",
            LoadStatus::Offloading => "offloading",
            LoadStatus::Completed => "completed",
            LoadStatus::Other(s) => s,
        }
    }

    /// Position in the forward lifecycle, `None` for unmanaged statuses
    pub fn rank(&self) -> Option<u8> {
        match self {
            LoadStatus::Pending => Some(0),
            LoadStatus::Scheduled => Some(1),
            LoadStatus::Loading => Some(2),
            LoadStatus::InTransit => Some(3),
            LoadStatus::Offloading => Some(4),
            LoadStatus::Completed => Some(5),
            LoadStatus::Other(_) => None,
        }
    }

    /// Check if state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadStatus::Completed)
    }

    /// True when moving to `next` advances the lifecycle.
    pub fn can_advance_to(&self, next: &LoadStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl From<&str> for LoadStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => LoadStatus::Pending,
            "scheduled" => LoadStatus::Scheduled,
            "loading" => LoadStatus::Loading,
            "in-transit" => LoadStatus::InTransit,
            "offloading" => LoadStatus::Offloading,
            "completed" => LoadStatus::Completed,
            other => LoadStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LoadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LoadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LoadStatus::from(raw.as_str()))
    }
}

/// A trackable load joined to its vehicle's external asset reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedLoad {
    /// Row identifier
    pub id: String,

    /// Human-facing load number
    pub load_id: String,

    /// Origin location name
    pub origin: String,

    /// Destination location name
    pub destination: String,

    /// Current status
    pub status: LoadStatus,

    /// Vehicle row identifier
    pub vehicle_id: String,

    /// Vehicle's external asset id exactly as stored; may be malformed
    pub asset_ref: String,
}
