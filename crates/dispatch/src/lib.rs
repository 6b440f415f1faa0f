//! FleetWatch dispatch domain
//!
//! This crate provides:
//! - Asset positions and geofence definitions
//! - Stateless geofence entry/exit evaluation
//! - The forward-only load status machine and its location matching strategy
//! - Geofence audit events
//! - Storage contracts for positions, events and loads

pub mod events;
pub mod fleet;
pub mod mission;
pub mod repository;

pub use events::{GeofenceEvent, GeofenceEventType};
pub use fleet::{
    AssetId, AssetIdError, AssetPosition, GeofenceDefinition, GeofenceEvaluator,
    GeofenceTransition, DEFAULT_RADIUS_METERS,
};
pub use mission::{LoadStateMachine, LoadStatus, LocationMatcher, StatusChange, SubstringMatcher, TrackedLoad};
pub use repository::{EventRecorder, LoadRepository, PositionStore, StoreError, StoreResult};
