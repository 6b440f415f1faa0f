//! Cycle-level errors
//!
//! Only these abort a cycle. Everything per-asset or per-write is logged and
//! skipped inside the orchestrator.

use fleetwatch_dispatch::StoreError;
use fleetwatch_telematics::TelematicsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CycleError {
    /// Trackable loads could not be read
    #[error("Failed to list trackable loads: {0}")]
    LoadListing(#[source] StoreError),

    /// No system token could be obtained from the provider
    #[error("Telematics service unavailable: {0}")]
    TokenUnavailable(#[source] TelematicsError),
}
