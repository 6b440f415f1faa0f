use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use fleetwatch_monitor::CycleError;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::state::AppState;

pub async fn run_monitor(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.runner.run_cycle().await {
        Ok(summary) if summary.is_idle() => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "loads_checked": 0,
                "events_detected": 0,
                "message": "No trackable loads"
            })),
        ),
        Ok(summary) => {
            info!(
                loads_checked = summary.loads_checked,
                events_detected = summary.events_detected,
                "Monitor run served"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "loads_checked": summary.loads_checked,
                    "events_detected": summary.events_detected,
                    "status_changes": summary.status_changes
                })),
            )
        }
        Err(e @ CycleError::LoadListing(_)) => {
            error!(error = %e, "Monitoring cycle failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
        Err(e @ CycleError::TokenUnavailable(_)) => {
            error!(error = %e, "Monitoring cycle failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.service,
        "timestamp": Utc::now().to_rfc3339()
    }))
}
