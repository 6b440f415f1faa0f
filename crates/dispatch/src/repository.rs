//! Persistence contracts used by the monitor
//!
//! Implementations must be cheap to share across tasks; every method takes
//! `&self`.

use crate::events::GeofenceEvent;
use crate::fleet::position::{AssetId, AssetPosition};
use crate::mission::load::{LoadStatus, TrackedLoad};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),

    /// Metadata could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be mapped to a domain value
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only log of asset positions
pub trait PositionStore: Send + Sync {
    /// Most recent sample for `asset_id` by timestamp, if any
    fn last_position(&self, asset_id: AssetId) -> StoreResult<Option<AssetPosition>>;

    /// Append a sample unconditionally
    fn record_position(&self, position: &AssetPosition) -> StoreResult<()>;
}

/// Append-only audit log of geofence crossings
pub trait EventRecorder: Send + Sync {
    fn record(&self, event: &GeofenceEvent) -> StoreResult<()>;
}

/// Read/advance access to loads owned by the dispatch system
pub trait LoadRepository: Send + Sync {
    /// Loads whose status is in `statuses` and whose vehicle carries a
    /// non-null external asset id
    fn list_trackable(&self, statuses: &[LoadStatus]) -> StoreResult<Vec<TrackedLoad>>;

    /// Set `status`/`updated_at` if the load is still in `expected`.
    ///
    /// Returns `false` when the row was changed by someone else in between.
    fn advance_status(
        &self,
        id: &str,
        expected: &LoadStatus,
        next: &LoadStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;
}
