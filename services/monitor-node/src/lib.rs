//! FleetWatch monitor node
//!
//! HTTP surface over one monitoring cycle. Any `GET`/`POST` on `/` or
//! `/monitor/run` runs a cycle; an external scheduler provides the cadence.

pub mod handlers;
pub mod state;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/",
            get(handlers::run_monitor)
                .post(handlers::run_monitor)
                .options(handlers::preflight),
        )
        .route(
            "/monitor/run",
            get(handlers::run_monitor)
                .post(handlers::run_monitor)
                .options(handlers::preflight),
        )
        .with_state(state)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}
