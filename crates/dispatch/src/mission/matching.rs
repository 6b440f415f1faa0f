//! Correlation between geofence names and load locations
//!
//! Loads refer to places by free-text name while the provider's geofences
//! carry their own names. The matcher is a trait so the heuristic can later be
//! replaced by an explicit geofence-to-location mapping.

/// Decides whether a geofence corresponds to a named location
pub trait LocationMatcher: Send + Sync {
    fn matches(&self, geofence_name: &str, location: &str) -> bool;
}

/// Case-insensitive substring match in either direction.
///
/// Blank names never match; otherwise an empty origin would match every
/// geofence.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl LocationMatcher for SubstringMatcher {
    fn matches(&self, geofence_name: &str, location: &str) -> bool {
        let geofence_name = geofence_name.trim().to_lowercase();
        let location = location.trim().to_lowercase();
        if geofence_name.is_empty() || location.is_empty() {
            return false;
        }
        geofence_name.contains(&location) || location.contains(&geofence_name)
    }
}
