//! Great-circle geometry for geofence checks.
//!
//! Distances use the haversine formula on a sphere of radius 6371 km. This is
//! adequate for geofence radii from tens of metres to a few kilometres; it is
//! not survey-grade.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic coordinates (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a new geographic coordinate
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    ///
    /// # Returns
    /// * `Ok(GeoCoordinate)` - Valid coordinate
    /// * `Err(CoreError::InvalidCoordinate)` - Out of range or not finite
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidCoordinate(format!(
                "Latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidCoordinate(format!(
                "Longitude must be between -180 and 180, got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to another coordinate in kilometres
    pub fn distance_km(&self, other: &GeoCoordinate) -> f64 {
        distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Great-circle distance to another coordinate in metres
    pub fn distance_m(&self, other: &GeoCoordinate) -> f64 {
        self.distance_km(other) * 1000.0
    }
}

/// Haversine distance between two points, in kilometres.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair past 1.0 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().atan2((1.0 - a).max(0.0).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance between two points, in metres.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    distance_km(lat1, lon1, lat2, lon2) * 1000.0
}
