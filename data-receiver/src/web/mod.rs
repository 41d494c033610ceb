//! Web server module for receiving signed payloads.
//!
//! Two endpoints:
//! - `GET /health`: always 200
//! - `POST /data/:service`: runs the ingestion pipeline for `service`

pub mod handlers;

use std::time::Duration;

use axum::{
    middleware::map_response,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use handlers::{health, ingest_data, json_timeout, AppState, HealthResponse};

/// Build the router with request tracing and a per-request timeout.
///
/// Timed-out requests get 408 with the same `{"Error": ..}` body as every
/// other failure.
pub fn router(state: AppState) -> Router {
    let timeout: Duration = state.config.request_timeout;

    Router::new()
        .route("/health", get(health))
        .route("/data/:service", post(ingest_data))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(map_response(json_timeout))
        .with_state(state)
}
