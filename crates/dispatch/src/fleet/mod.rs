//! Fleet domain models
//!
//! Asset positions and geofence definitions, plus the evaluator that turns two
//! consecutive positions into boundary crossings.

pub mod geofence;
pub mod position;

pub use geofence::{GeofenceDefinition, GeofenceEvaluator, GeofenceTransition, DEFAULT_RADIUS_METERS};
pub use position::{AssetId, AssetIdError, AssetPosition};
