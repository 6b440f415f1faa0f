use anyhow::Context;
use chrono::Duration;
use fleetwatch_core::{logging, Clock, Config, SystemClock};
use fleetwatch_ledger::FleetLedger;
use fleetwatch_monitor::{MonitorOrchestrator, MonitorStores};
use fleetwatch_node::{app, AppState};
use fleetwatch_telematics::{HttpTelematicsClient, TokenCache};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    logging::init_with(config.logging.format);

    let ledger = FleetLedger::open(&config.database.path)
        .with_context(|| format!("opening database at {}", config.database.path))?;
    let stores = MonitorStores {
        loads: Arc::new(ledger.loads()),
        positions: Arc::new(ledger.positions()),
        events: Arc::new(ledger.events()),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = HttpTelematicsClient::new(config.telematics.clone(), clock.clone())
        .context("building telematics client")?;
    let tokens = TokenCache::with_safety_margin(
        client.clone(),
        clock.clone(),
        Duration::seconds(config.telematics.token_safety_margin_secs),
    );

    let orchestrator = MonitorOrchestrator::new(client, tokens, stores, &config.monitor, clock);
    let state = Arc::new(AppState::new(Arc::new(orchestrator)));

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!(
        bind_addr = %bind_addr,
        database = %config.database.path,
        provider = %config.telematics.base_url,
        "Geofence monitor listening"
    );

    axum::serve(listener, app(state)).await?;
    Ok(())
}
