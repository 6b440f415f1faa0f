//! FleetWatch geofence monitor
//!
//! Drives the monitoring cycle: samples tracked assets through the telematics
//! provider, evaluates geofence crossings and advances load status.

pub mod error;
pub mod orchestrator;

pub use error::CycleError;
pub use orchestrator::{CycleSummary, MonitorOrchestrator, MonitorStores};

use fleetwatch_telematics::{CredentialExchange, TelematicsApi};
use futures_util::future::BoxFuture;

/// Object-safe entry point for callers that trigger cycles (HTTP, scheduler).
pub trait CycleRunner: Send + Sync {
    fn run_cycle(&self) -> BoxFuture<'_, Result<CycleSummary, CycleError>>;
}

impl<A, E> CycleRunner for MonitorOrchestrator<A, E>
where
    A: TelematicsApi + 'static,
    E: CredentialExchange + 'static,
{
    fn run_cycle(&self) -> BoxFuture<'_, Result<CycleSummary, CycleError>> {
        Box::pin(self.run())
    }
}
