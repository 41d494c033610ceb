//! HTTP endpoint handlers.
//!
//! The handlers only adapt HTTP to the ingestion pipeline; status mapping
//! lives on [`ReceiverError`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ReceiverError;
use crate::pipeline::{ingest, log_rejection};
use crate::registry::ServiceRegistry;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: ServiceRegistry,
}

impl AppState {
    pub fn new(config: Config, registry: ServiceRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Data Ingestion
// =============================================================================

/// Data ingestion endpoint for `POST /data/:service`.
///
/// Responds 200 with an empty body on success, otherwise with the status code
/// of the failing step and `{"Error": <message>}`.
pub async fn ingest_data(
    State(state): State<AppState>,
    service: Result<Path<String>, PathRejection>,
    request: Request<Body>,
) -> Response {
    // A segment that does not decode to UTF-8 cannot name a service.
    let service = match service {
        Ok(Path(service)) => service,
        Err(rejection) => {
            let raw = raw_service_segment(request.uri().path());
            debug!(service = %raw, rejection = %rejection, "service_path_rejected");
            return reject(&raw, ReceiverError::NotFound(raw.clone()));
        }
    };

    match ingest(
        &state.registry,
        &service,
        request,
        state.config.max_body_bytes,
    )
    .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => reject(&service, e),
    }
}

/// Map a timeout layer's bare 408 onto the JSON error body.
pub async fn json_timeout(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        warn!("request_timed_out");
        return ReceiverError::Timeout.into_response();
    }
    response
}

fn raw_service_segment(path: &str) -> String {
    path.strip_prefix("/data/").unwrap_or(path).to_string()
}

fn reject(service: &str, err: ReceiverError) -> Response {
    log_rejection(service, &err);
    err.into_response()
}
