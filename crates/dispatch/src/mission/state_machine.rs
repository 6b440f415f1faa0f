//! Geofence-driven load status advancement
//!
//! Lifecycle: `pending -> scheduled -> loading -> in-transit -> offloading -> completed`.
//!
//! Rules:
//! - entry into a geofence matching the origin advances to `loading`
//! - entry into a geofence matching the destination advances to `offloading`
//! - exit from the configured depot geofence, for a load whose origin is that
//!   depot and which is `loading`, advances to `in-transit`
//!
//! The machine is forward-only. If a truck physically returns to its origin
//! after departing, the load stays where it is. Departure detection is only
//! wired for the single depot marker; other origins reach `in-transit` only
//! through manual dispatch updates.

use crate::events::GeofenceEventType;
use crate::mission::load::{LoadStatus, TrackedLoad};
use crate::mission::matching::{LocationMatcher, SubstringMatcher};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// An approved status advance for one load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub from: LoadStatus,
    pub to: LoadStatus,
}

pub struct LoadStateMachine {
    matcher: Arc<dyn LocationMatcher>,
    depot_marker: Option<String>,
}

impl Default for LoadStateMachine {
    fn default() -> Self {
        Self::new(Arc::new(SubstringMatcher), None)
    }
}

impl LoadStateMachine {
    pub fn new(matcher: Arc<dyn LocationMatcher>, depot_marker: Option<String>) -> Self {
        let depot_marker = depot_marker.filter(|m| !m.trim().is_empty());
        Self {
            matcher,
            depot_marker,
        }
    }

    pub fn depot_marker(&self) -> Option<&str> {
        self.depot_marker.as_deref()
    }

    /// Decide whether a crossing advances `load`. Returns `None` when the
    /// status stays put; the crossing is still recorded by the caller.
    pub fn apply(
        &self,
        load: &TrackedLoad,
        geofence_name: &str,
        event_type: GeofenceEventType,
    ) -> Option<StatusChange> {
        let candidates: Vec<LoadStatus> = match event_type {
            GeofenceEventType::Entry => {
                let mut c = Vec::with_capacity(2);
                if self.matcher.matches(geofence_name, &load.origin) {
                    c.push(LoadStatus::Loading);
                }
                if self.matcher.matches(geofence_name, &load.destination) {
                    c.push(LoadStatus::Offloading);
                }
                c
            }
            GeofenceEventType::Exit => match &self.depot_marker {
                Some(marker)
                    if load.status == LoadStatus::Loading
                        && self.matcher.matches(geofence_name, marker)
                        && self.matcher.matches(&load.origin, marker) =>
                {
                    vec![LoadStatus::InTransit]
                }
                _ => Vec::new(),
            },
        };

        let next = candidates
            .into_iter()
            .find(|candidate| load.status.can_advance_to(candidate))?;

        debug!(
            load_id = %load.load_id,
            geofence = %geofence_name,
            %event_type,
            from = %load.status,
            to = %next,
            "Load status advance"
        );

        Some(StatusChange {
            from: load.status.clone(),
            to: next,
        })
    }
}
