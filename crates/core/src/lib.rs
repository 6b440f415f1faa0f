//! Core functionality for FleetWatch geofence monitoring.
//!
//! This crate provides the shared configuration, logging, clock and geodesy
//! used across the FleetWatch workspace.

pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, LogFormat, MonitorConfig, TelematicsConfig};
pub use error::{CoreError, Result};
pub use geo::{distance_km, distance_m, GeoCoordinate, EARTH_RADIUS_KM};
