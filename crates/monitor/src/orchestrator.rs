//! Monitoring cycle
//!
//! One cycle:
//! 1. list trackable loads (none: stop, nothing else is touched)
//! 2. obtain a system token (failure aborts the cycle)
//! 3. fetch the geofence catalogue (failure degrades to an empty catalogue)
//! 4. per asset: fetch, compare with the last stored sample, append, evaluate
//! 5. per crossing and load on that asset: advance status, record the event
//!
//! Loads sharing a vehicle are grouped so each asset is sampled and recorded
//! once per cycle. Per-asset failures and individual write failures are
//! logged and skipped.

use crate::error::CycleError;
use fleetwatch_core::{Clock, MonitorConfig};
use fleetwatch_dispatch::{
    AssetId, AssetPosition, EventRecorder, GeofenceDefinition, GeofenceEvaluator, GeofenceEvent,
    GeofenceTransition, LoadRepository, LoadStateMachine, LoadStatus, PositionStore,
    StatusChange, SubstringMatcher, TrackedLoad,
};
use fleetwatch_telematics::{CredentialExchange, SystemToken, TelematicsApi, TokenCache};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Storage handles used by the orchestrator
#[derive(Clone)]
pub struct MonitorStores {
    pub loads: Arc<dyn LoadRepository>,
    pub positions: Arc<dyn PositionStore>,
    pub events: Arc<dyn EventRecorder>,
}

/// Outcome of one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    /// Trackable loads listed at the start of the cycle
    pub loads_checked: usize,
    /// Crossings evaluated against loads (one per crossing per load)
    pub events_detected: usize,
    /// Loads whose status was advanced
    pub status_changes: usize,
    /// Assets sampled and evaluated
    pub assets_processed: usize,
    /// Assets skipped (position unavailable)
    pub assets_skipped: usize,
    /// Loads skipped because their asset id is malformed
    pub loads_skipped: usize,
}

impl CycleSummary {
    /// True when there was nothing to track.
    pub fn is_idle(&self) -> bool {
        self.loads_checked == 0
    }
}

#[derive(Debug, Default)]
struct AssetOutcome {
    processed: bool,
    events_detected: usize,
    status_changes: usize,
}

pub struct MonitorOrchestrator<A, E> {
    api: A,
    tokens: TokenCache<E>,
    stores: MonitorStores,
    evaluator: GeofenceEvaluator,
    machine: LoadStateMachine,
    trackable: Vec<LoadStatus>,
    max_concurrent_assets: usize,
    clock: Arc<dyn Clock>,
}

impl<A, E> MonitorOrchestrator<A, E>
where
    A: TelematicsApi,
    E: CredentialExchange,
{
    pub fn new(
        api: A,
        tokens: TokenCache<E>,
        stores: MonitorStores,
        settings: &MonitorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let trackable = settings
            .trackable_statuses
            .iter()
            .map(|s| LoadStatus::from(s.as_str()))
            .collect();

        Self {
            api,
            tokens,
            stores,
            evaluator: GeofenceEvaluator::new(settings.default_radius_meters),
            machine: LoadStateMachine::new(
                Arc::new(SubstringMatcher),
                settings.depot_marker.clone(),
            ),
            trackable,
            max_concurrent_assets: settings.max_concurrent_assets.max(1),
            clock,
        }
    }

    /// Replace the default location matcher/depot rule.
    pub fn with_state_machine(mut self, machine: LoadStateMachine) -> Self {
        self.machine = machine;
        self
    }

    pub fn tokens(&self) -> &TokenCache<E> {
        &self.tokens
    }

    /// Run one monitoring cycle.
    pub async fn run(&self) -> Result<CycleSummary, CycleError> {
        let started = Instant::now();

        let loads = self
            .stores
            .loads
            .list_trackable(&self.trackable)
            .map_err(CycleError::LoadListing)?;

        if loads.is_empty() {
            info!("No trackable loads");
            return Ok(CycleSummary::default());
        }

        let token = self
            .tokens
            .get_token()
            .await
            .map_err(CycleError::TokenUnavailable)?;

        let geofences = match self.api.list_geofences(&token).await {
            Ok(geofences) => geofences,
            Err(e) => {
                warn!(error = %e, "Geofence catalogue unavailable, positions will still be recorded");
                Vec::new()
            }
        };

        let mut summary = CycleSummary {
            loads_checked: loads.len(),
            ..CycleSummary::default()
        };

        let mut by_asset: BTreeMap<AssetId, Vec<TrackedLoad>> = BTreeMap::new();
        for load in loads {
            match load.asset_ref.parse::<AssetId>() {
                Ok(asset_id) => by_asset.entry(asset_id).or_default().push(load),
                Err(e) => {
                    warn!(load = %load.load_id, error = %e, "Skipping load with malformed asset id");
                    summary.loads_skipped += 1;
                }
            }
        }

        let tasks: Vec<_> = by_asset
            .into_iter()
            .map(|(asset_id, loads)| self.process_asset(&token, &geofences, asset_id, loads))
            .collect();

        let outcomes: Vec<AssetOutcome> = stream::iter(tasks)
            .buffer_unordered(self.max_concurrent_assets)
            .collect()
            .await;

        for outcome in outcomes {
            if outcome.processed {
                summary.assets_processed += 1;
            } else {
                summary.assets_skipped += 1;
            }
            summary.events_detected += outcome.events_detected;
            summary.status_changes += outcome.status_changes;
        }

        info!(
            loads_checked = summary.loads_checked,
            events_detected = summary.events_detected,
            status_changes = summary.status_changes,
            assets_processed = summary.assets_processed,
            assets_skipped = summary.assets_skipped,
            loads_skipped = summary.loads_skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Monitoring cycle complete"
        );

        Ok(summary)
    }

    async fn process_asset(
        &self,
        token: &SystemToken,
        geofences: &[GeofenceDefinition],
        asset_id: AssetId,
        mut loads: Vec<TrackedLoad>,
    ) -> AssetOutcome {
        let mut outcome = AssetOutcome::default();

        let current = match self.api.fetch_position(token, asset_id).await {
            Ok(position) => position,
            Err(e) => {
                warn!(asset_id = %asset_id, error = %e, "Position unavailable, skipping asset");
                return outcome;
            }
        };
        outcome.processed = true;

        let previous = match self.stores.positions.last_position(asset_id) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(asset_id = %asset_id, error = %e, "Could not read last position, treating sample as baseline");
                None
            }
        };

        if let Some(prev) = &previous {
            if current.is_same_sample(prev) {
                debug!(asset_id = %asset_id, "Provider returned the stored sample again");
                return outcome;
            }
        }

        if let Err(e) = self.stores.positions.record_position(&current) {
            warn!(asset_id = %asset_id, error = %e, "Failed to record position");
        }

        let transitions = self
            .evaluator
            .evaluate(&current, previous.as_ref(), geofences);

        for transition in &transitions {
            for load in loads.iter_mut() {
                outcome.events_detected += 1;
                let applied = self.advance(load, transition);
                if applied.is_some() {
                    outcome.status_changes += 1;
                }
                self.record_event(load, &current, previous.as_ref(), transition, applied);
            }
        }

        outcome
    }

    /// Apply one crossing to one load, updating `load.status` on success.
    fn advance(
        &self,
        load: &mut TrackedLoad,
        transition: &GeofenceTransition,
    ) -> Option<(LoadStatus, LoadStatus)> {
        // An earlier crossing this cycle may have moved the load out of tracking.
        if !self.trackable.contains(&load.status) {
            return None;
        }

        let StatusChange { from, to } =
            self.machine
                .apply(load, &transition.geofence.name, transition.event_type)?;

        match self
            .stores
            .loads
            .advance_status(&load.id, &from, &to, self.clock.now())
        {
            Ok(true) => {
                info!(
                    load = %load.load_id,
                    geofence = %transition.geofence.name,
                    event = %transition.event_type,
                    from = %from,
                    to = %to,
                    "Load status advanced"
                );
                load.status = to.clone();
                Some((from, to))
            }
            Ok(false) => {
                info!(load = %load.load_id, expected = %from, "Load changed concurrently, status left as is");
                None
            }
            Err(e) => {
                warn!(load = %load.load_id, error = %e, "Failed to advance load status");
                None
            }
        }
    }

    fn record_event(
        &self,
        load: &TrackedLoad,
        current: &AssetPosition,
        previous: Option<&AssetPosition>,
        transition: &GeofenceTransition,
        applied: Option<(LoadStatus, LoadStatus)>,
    ) {
        let status_before = applied
            .as_ref()
            .map(|(from, _)| from.as_str().to_string())
            .unwrap_or_else(|| load.status.as_str().to_string());
        let status_after = applied.as_ref().map(|(_, to)| to.as_str().to_string());

        let event = GeofenceEvent {
            load_id: load.id.clone(),
            asset_id: current.asset_id,
            geofence_id: transition.geofence.id.clone(),
            geofence_name: transition.geofence.name.clone(),
            event_type: transition.event_type,
            timestamp: current.timestamp,
            metadata: json!({
                "load_number": load.load_id,
                "vehicle_id": load.vehicle_id,
                "latitude": current.coordinate.latitude,
                "longitude": current.coordinate.longitude,
                "previous_latitude": previous.map(|p| p.coordinate.latitude),
                "previous_longitude": previous.map(|p| p.coordinate.longitude),
                "distance_m": transition.current_distance_m,
                "previous_distance_m": transition.previous_distance_m,
                "radius_m": transition.radius_m,
                "status_before": status_before,
                "status_after": status_after,
                "status_changed": applied.is_some(),
                "detected_at": self.clock.now(),
            }),
        };

        if let Err(e) = self.stores.events.record(&event) {
            warn!(
                load = %load.load_id,
                geofence = %event.geofence_name,
                error = %e,
                "Failed to record geofence event"
            );
        }
    }
}
