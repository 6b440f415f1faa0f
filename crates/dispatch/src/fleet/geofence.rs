//! Geofence definitions and boundary-crossing detection
//!
//! The evaluator is stateless: it compares the newest sample against the
//! previous stored sample and reports every geofence whose boundary lies
//! between them. History lives entirely in the position store.

use crate::events::GeofenceEventType;
use crate::fleet::position::AssetPosition;
use fleetwatch_core::GeoCoordinate;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Radius applied when a geofence does not specify one
pub const DEFAULT_RADIUS_METERS: f64 = 500.0;

/// Named circular region from the provider's catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceDefinition {
    /// Provider identifier
    pub id: String,

    /// Display name, correlated against load origin/destination
    pub name: String,

    /// Centre point; geofences without one are never evaluated
    pub center: Option<GeoCoordinate>,

    /// Radius in metres, if the provider supplied one
    pub radius_meters: Option<f64>,
}

impl GeofenceDefinition {
    /// Create a geofence with a known centre
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        center: GeoCoordinate,
        radius_meters: Option<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center: Some(center),
            radius_meters,
        }
    }

    /// Radius to use for containment, falling back to `default` for absent,
    /// non-finite or non-positive values.
    pub fn effective_radius(&self, default: f64) -> f64 {
        match self.radius_meters {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => default,
        }
    }
}

/// A detected crossing of one geofence boundary
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceTransition {
    pub geofence: GeofenceDefinition,
    pub event_type: GeofenceEventType,
    pub current_distance_m: f64,
    pub previous_distance_m: f64,
    pub radius_m: f64,
}

/// Stateless entry/exit detector
#[derive(Debug, Clone, Copy)]
pub struct GeofenceEvaluator {
    default_radius_m: f64,
}

impl Default for GeofenceEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS_METERS)
    }
}

impl GeofenceEvaluator {
    pub fn new(default_radius_m: f64) -> Self {
        Self { default_radius_m }
    }

    /// Compare `current` against `previous` for every geofence.
    ///
    /// Without a previous sample nothing is emitted; the current sample only
    /// establishes a baseline.
    pub fn evaluate(
        &self,
        current: &AssetPosition,
        previous: Option<&AssetPosition>,
        geofences: &[GeofenceDefinition],
    ) -> Vec<GeofenceTransition> {
        let Some(previous) = previous else {
            return Vec::new();
        };

        geofences
            .iter()
            .filter_map(|geofence| {
                let center = geofence.center?;
                let radius_m = geofence.effective_radius(self.default_radius_m);
                let current_distance_m = current.coordinate.distance_m(&center);
                let previous_distance_m = previous.coordinate.distance_m(&center);

                let was_inside = previous_distance_m <= radius_m;
                let is_inside = current_distance_m <= radius_m;

                let event_type = match (was_inside, is_inside) {
                    (false, true) => GeofenceEventType::Entry,
                    (true, false) => GeofenceEventType::Exit,
                    _ => return None,
                };

                trace!(
                    asset_id = %current.asset_id,
                    geofence = %geofence.name,
                    ?event_type,
                    previous_distance_m,
                    current_distance_m,
                    radius_m,
                    "Geofence boundary crossed"
                );

                Some(GeofenceTransition {
                    geofence: geofence.clone(),
                    event_type,
                    current_distance_m,
                    previous_distance_m,
                    radius_m,
                })
            })
            .collect()
    }
}
