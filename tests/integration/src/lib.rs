//! End-to-end tests for the geofence monitor
//!
//! This test suite validates:
//! - Token exchange, position and geofence reads against a fake provider
//! - Geofence entry/exit detection and load status advancement
//! - Degraded paths: provider outages, malformed asset ids, repeated samples
//! - The HTTP trigger's status mapping over a real orchestrator

pub mod test_utils;

#[cfg(test)]
mod monitor_scenarios;

#[cfg(test)]
mod node_http_tests;
