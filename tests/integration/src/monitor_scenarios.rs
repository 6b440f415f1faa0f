//! Monitoring cycles against the fake provider
//!
//! Each test drives the real HTTP client, token cache, orchestrator and
//! SQLite ledger; only the provider is simulated.

use crate::test_utils::*;
use chrono::Duration;
use fleetwatch_dispatch::{AssetId, LoadStatus};
use fleetwatch_ledger::FleetLedger;
use fleetwatch_monitor::CycleError;

#[tokio::test]
async fn test_entry_into_origin_geofence() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-1", LoadStatus::Scheduled, Some("501"));

    provider.set_position(501, north_of(DEPOT, 600.0), base_time());
    let baseline = deployment.orchestrator.run().await.unwrap();
    assert_eq!(baseline.loads_checked, 1);
    assert_eq!(baseline.events_detected, 0);

    provider.set_position(501, north_of(DEPOT, 200.0), base_time() + Duration::minutes(2));
    let summary = deployment.orchestrator.run().await.unwrap();

    assert_eq!(summary.events_detected, 1);
    assert_eq!(deployment.status("l-1"), LoadStatus::Loading);

    let events = deployment.ledger.events().for_load("l-1").unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].geofence_id, "17");
    assert_eq!(events[0].geofence_name, "Main Depot Yard");
    assert_eq!(events[0].asset_id, AssetId::new(501));
    assert_eq!(events[0].timestamp, base_time() + Duration::minutes(2));
    assert_eq!(deployment.ledger.events().count().unwrap(), 1);
}

#[tokio::test]
async fn test_full_journey_depot_to_port() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-1", LoadStatus::Scheduled, Some("501"));

    let legs = [
        (north_of(DEPOT, 600.0), LoadStatus::Scheduled),
        (north_of(DEPOT, 200.0), LoadStatus::Loading),
        (north_of(DEPOT, 900.0), LoadStatus::InTransit),
        (north_of(PORT, 800.0), LoadStatus::InTransit),
        (north_of(PORT, 100.0), LoadStatus::Offloading),
    ];

    for (i, (coordinate, expected)) in legs.into_iter().enumerate() {
        provider.set_position(501, coordinate, base_time() + Duration::minutes(10 * i as i64));
        deployment.orchestrator.run().await.unwrap();
        assert_eq!(deployment.status("l-1"), expected, "after leg {}", i);
    }

    let events = deployment.ledger.events().for_load("l-1").unwrap();
    let kinds: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e.geofence_name.as_str(), e.event_type.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("Main Depot Yard", "entry"),
            ("Main Depot Yard", "exit"),
            ("Durban Port", "entry"),
        ]
    );
    assert_eq!(deployment.ledger.positions().count(AssetId::new(501)).unwrap(), 5);
}

#[tokio::test]
async fn test_token_rejection_aborts_without_writes() {
    init_tracing();
    let provider = FakeProvider::start().await;
    provider.fail_token(401);
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-1", LoadStatus::Scheduled, Some("501"));
    provider.set_position(501, north_of(DEPOT, 200.0), base_time());

    let result = deployment.orchestrator.run().await;

    assert!(matches!(result, Err(CycleError::TokenUnavailable(_))));
    assert_eq!(provider.token_calls(), 1);
    assert_eq!(provider.position_calls(), 0);
    assert_eq!(deployment.ledger.positions().count(AssetId::new(501)).unwrap(), 0);
    assert_eq!(deployment.ledger.events().count().unwrap(), 0);
    assert_eq!(deployment.status("l-1"), LoadStatus::Scheduled);
}

#[tokio::test]
async fn test_geofence_outage_still_records_positions() {
    init_tracing();
    let provider = FakeProvider::start().await;
    provider.set_geofences(None);
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-1", LoadStatus::Scheduled, Some("501"));

    provider.set_position(501, north_of(DEPOT, 600.0), base_time());
    deployment.orchestrator.run().await.unwrap();
    provider.set_position(501, north_of(DEPOT, 200.0), base_time() + Duration::minutes(1));
    let summary = deployment.orchestrator.run().await.unwrap();

    assert_eq!(summary.events_detected, 0);
    assert_eq!(deployment.ledger.positions().count(AssetId::new(501)).unwrap(), 2);
    assert_eq!(deployment.status("l-1"), LoadStatus::Scheduled);
}

#[tokio::test]
async fn test_bad_asset_ids_do_not_block_others() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-bad", LoadStatus::Scheduled, Some("TRUCK-7"));
    deployment.seed_load("l-gone", LoadStatus::Scheduled, Some("999"));
    deployment.seed_load("l-good", LoadStatus::Scheduled, Some("502"));
    deployment.seed_load("l-none", LoadStatus::Scheduled, None);

    provider.set_position(502, north_of(DEPOT, 600.0), base_time());
    let summary = deployment.orchestrator.run().await.unwrap();

    // l-none is never listed: its vehicle has no asset id
    assert_eq!(summary.loads_checked, 3);
    assert_eq!(summary.loads_skipped, 1);
    assert_eq!(summary.assets_skipped, 1);
    assert_eq!(summary.assets_processed, 1);
    assert_eq!(deployment.ledger.positions().count(AssetId::new(502)).unwrap(), 1);
}

#[tokio::test]
async fn test_completed_load_is_never_touched() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-done", LoadStatus::Completed, Some("501"));
    deployment.seed_load("l-live", LoadStatus::Scheduled, Some("501"));

    provider.set_position(501, north_of(DEPOT, 600.0), base_time());
    deployment.orchestrator.run().await.unwrap();
    provider.set_position(501, north_of(DEPOT, 200.0), base_time() + Duration::minutes(1));
    deployment.orchestrator.run().await.unwrap();

    assert_eq!(deployment.status("l-done"), LoadStatus::Completed);
    assert_eq!(deployment.status("l-live"), LoadStatus::Loading);
    assert!(deployment.ledger.events().for_load("l-done").unwrap().is_empty());
}

#[tokio::test]
async fn test_token_is_cached_across_cycles() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-1", LoadStatus::Scheduled, Some("501"));
    provider.set_position(501, north_of(DEPOT, 600.0), base_time());

    for _ in 0..3 {
        deployment.orchestrator.run().await.unwrap();
    }

    assert_eq!(provider.token_calls(), 1);
    assert_eq!(provider.position_calls(), 3);
    // Same sample every time: stored once
    assert_eq!(deployment.ledger.positions().count(AssetId::new(501)).unwrap(), 1);
}

#[tokio::test]
async fn test_detection_survives_restart() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let db_path = std::env::temp_dir().join(format!(
        "fleetwatch_restart_{}_{}.db",
        std::process::id(),
        chrono::Utc::now().timestamp_micros()
    ));

    {
        let first = Deployment::new(&provider, FleetLedger::open(&db_path).unwrap());
        first.seed_load("l-1", LoadStatus::Scheduled, Some("501"));
        provider.set_position(501, north_of(DEPOT, 600.0), base_time());
        first.orchestrator.run().await.unwrap();
    }

    let second = Deployment::new(&provider, FleetLedger::open(&db_path).unwrap());
    provider.set_position(501, north_of(DEPOT, 200.0), base_time() + Duration::minutes(3));
    let summary = second.orchestrator.run().await.unwrap();

    assert_eq!(summary.events_detected, 1);
    assert_eq!(second.status("l-1"), LoadStatus::Loading);

    drop(second);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path.display(), suffix));
    }
}
