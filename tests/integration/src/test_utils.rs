//! Fixtures for end-to-end monitor tests
//!
//! `FakeProvider` is an in-process axum server on an ephemeral loopback port
//! that mimics the telematics provider closely enough for the real
//! `HttpTelematicsClient` to talk to it, including its inconsistent field
//! capitalisation.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use fleetwatch_core::{Clock, GeoCoordinate, MonitorConfig, SystemClock, TelematicsConfig};
use fleetwatch_dispatch::LoadStatus;
use fleetwatch_ledger::FleetLedger;
use fleetwatch_monitor::{MonitorOrchestrator, MonitorStores};
use fleetwatch_telematics::{HttpTelematicsClient, TokenCache};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const ORGANISATION: &str = "org-42";
pub const USERNAME: &str = "svc-monitor";
pub const PASSWORD: &str = "hunter2";

pub const DEPOT: (f64, f64) = (-26.2000, 28.0000);
pub const PORT: (f64, f64) = (-29.8600, 31.0200);

pub type HttpOrchestrator = MonitorOrchestrator<HttpTelematicsClient, HttpTelematicsClient>;

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 7, 30, 0).unwrap()
}

/// Point `metres` due north of `origin`.
pub fn north_of(origin: (f64, f64), metres: f64) -> GeoCoordinate {
    GeoCoordinate::new(origin.0 + metres / 111_195.0, origin.1).unwrap()
}

/// Provider-shaped position payload
pub fn position_body(coordinate: GeoCoordinate, at: DateTime<Utc>) -> Value {
    json!({
        "Data": {
            "Latitude": coordinate.latitude,
            "Longitude": coordinate.longitude,
            "GpsTime": at.to_rfc3339()
        }
    })
}

/// Provider-shaped geofence listing: depot, port, and one fence with no centre
pub fn geofence_catalogue() -> Value {
    json!([
        {
            "GeofenceId": 17,
            "Name": "Main Depot Yard",
            "Latitude": DEPOT.0,
            "Longitude": DEPOT.1,
            "Radius": 500
        },
        {
            "id": "port-durban",
            "name": "Durban Port",
            "center": { "lat": PORT.0, "lng": PORT.1 }
        },
        {
            "id": "echo-mine",
            "name": "Echo Mine"
        }
    ])
}

#[derive(Default)]
struct ProviderState {
    token_status: Mutex<Option<u16>>,
    geofences: Mutex<Option<Value>>,
    positions: Mutex<HashMap<u64, Value>>,
    token_calls: AtomicUsize,
    position_calls: AtomicUsize,
    issued: Mutex<Vec<String>>,
}

impl ProviderState {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };
        let issued = self.issued.lock().unwrap();
        value
            .strip_prefix("Bearer ")
            .is_some_and(|token| issued.iter().any(|t| t == token))
    }
}

pub struct FakeProvider {
    pub base_url: String,
    state: Arc<ProviderState>,
}

impl FakeProvider {
    pub async fn start() -> Self {
        let state = Arc::new(ProviderState::default());
        *state.geofences.lock().unwrap() = Some(geofence_catalogue());

        let router = Router::new()
            .route("/token", post(issue_token))
            .route("/api/assets/:asset_id/position", get(asset_position))
            .route("/api/organisations/:organisation_id/geofences", get(geofences))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_position(&self, asset: u64, coordinate: GeoCoordinate, at: DateTime<Utc>) {
        self.state
            .positions
            .lock()
            .unwrap()
            .insert(asset, position_body(coordinate, at));
    }

    /// `None` makes the geofence endpoint fail with 502.
    pub fn set_geofences(&self, body: Option<Value>) {
        *self.state.geofences.lock().unwrap() = body;
    }

    /// Make the token endpoint answer with `status` instead of a token.
    pub fn fail_token(&self, status: u16) {
        *self.state.token_status.lock().unwrap() = Some(status);
    }

    pub fn token_calls(&self) -> usize {
        self.state.token_calls.load(Ordering::SeqCst)
    }

    pub fn position_calls(&self) -> usize {
        self.state.position_calls.load(Ordering::SeqCst)
    }

    pub fn telematics_config(&self) -> TelematicsConfig {
        TelematicsConfig {
            base_url: self.base_url.clone(),
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            organisation_id: ORGANISATION.to_string(),
            request_timeout_secs: 5,
            ..TelematicsConfig::default()
        }
    }
}

async fn issue_token(
    State(state): State<Arc<ProviderState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let n = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;

    if let Some(status) = *state.token_status.lock().unwrap() {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (code, Json(json!({"error": "invalid_grant"}))).into_response();
    }

    let valid = form.get("grant_type").map(String::as_str) == Some("password")
        && form.get("username").map(String::as_str) == Some(USERNAME)
        && form.get("password").map(String::as_str) == Some(PASSWORD);
    if !valid {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"}))).into_response();
    }

    let token = format!("fake-token-{}", n);
    state.issued.lock().unwrap().push(token.clone());
    Json(json!({
        "AccessToken": token,
        "TokenType": "bearer",
        "ExpiresIn": 3600
    }))
    .into_response()
}

async fn asset_position(
    State(state): State<Arc<ProviderState>>,
    Path(asset_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    state.position_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.positions.lock().unwrap().get(&asset_id) {
        Some(body) => Json(body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "unknown asset"}))).into_response(),
    }
}

async fn geofences(
    State(state): State<Arc<ProviderState>>,
    Path(organisation_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if organisation_id != ORGANISATION {
        return StatusCode::FORBIDDEN.into_response();
    }
    match state.geofences.lock().unwrap().clone() {
        Some(body) => Json(json!({ "items": body })).into_response(),
        None => StatusCode::BAD_GATEWAY.into_response(),
    }
}

/// A monitor wired to a fake provider and a ledger.
pub struct Deployment {
    pub ledger: FleetLedger,
    pub orchestrator: Arc<HttpOrchestrator>,
}

impl Deployment {
    pub fn new(provider: &FakeProvider, ledger: FleetLedger) -> Self {
        let mut settings = MonitorConfig::default();
        settings.depot_marker = Some("Main Depot".to_string());

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let client = HttpTelematicsClient::new(provider.telematics_config(), clock.clone()).unwrap();
        let tokens = TokenCache::new(client.clone(), clock.clone());
        let stores = MonitorStores {
            loads: Arc::new(ledger.loads()),
            positions: Arc::new(ledger.positions()),
            events: Arc::new(ledger.events()),
        };

        Self {
            orchestrator: Arc::new(MonitorOrchestrator::new(client, tokens, stores, &settings, clock)),
            ledger,
        }
    }

    pub fn in_memory(provider: &FakeProvider) -> Self {
        Self::new(provider, FleetLedger::open_in_memory().unwrap())
    }

    /// Add a load travelling Main Depot -> Durban Port on its own vehicle.
    pub fn seed_load(&self, id: &str, status: LoadStatus, asset: Option<&str>) {
        let vehicle = format!("veh-{}", id);
        let loads = self.ledger.loads();
        loads.upsert_vehicle(&vehicle, asset).unwrap();
        loads
            .upsert_load(id, &format!("LD-{}", id), "Main Depot", "Durban Port", &status, &vehicle)
            .unwrap();
    }

    pub fn status(&self, id: &str) -> LoadStatus {
        self.ledger.loads().status_of(id).unwrap().unwrap()
    }
}
