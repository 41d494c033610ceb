//! Per-request ingestion sequence.
//!
//! ```text
//! lookup → extract → validate → read body → authenticate → write
//! ```
//!
//! Steps run cheapest first and stop at the first failure, so malformed or
//! unauthenticated traffic never reaches a writer.

use axum::body::{to_bytes, Body};
use axum::http::Request;
use tracing::{error, info, warn};

use crate::error::ReceiverError;
use crate::extract::SIGNATURE_FIELD;
use crate::registry::ServiceRegistry;

/// Run the pipeline for `service` against one request.
///
/// Bodies larger than `max_body_bytes` fail the body read.
pub async fn ingest(
    registry: &ServiceRegistry,
    service: &str,
    request: Request<Body>,
    max_body_bytes: usize,
) -> Result<(), ReceiverError> {
    let binding = registry.lookup(service).await?;
    let (parts, body) = request.into_parts();

    let fields = binding.extractor.extract(&parts);
    binding.extractor.validate(&fields)?;

    let body = to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| ReceiverError::Body(e.to_string()))?;

    let signature = fields
        .get(SIGNATURE_FIELD)
        .map(String::as_str)
        .unwrap_or_default();
    binding.authenticator.authenticate(&body, signature)?;

    let content = String::from_utf8_lossy(&body).into_owned();
    let body_length = content.len();
    binding.writer.write(content).await?;

    info!(service = %service, body_length = body_length, "ingest_accepted");
    Ok(())
}

/// Log a pipeline failure at the appropriate level.
pub fn log_rejection(service: &str, err: &ReceiverError) {
    match err {
        ReceiverError::Io(_) | ReceiverError::WriterClosed | ReceiverError::Config(_) => {
            error!(service = %service, error = %err, "ingest_failed")
        }
        _ => warn!(
            service = %service,
            status = err.status_code().as_u16(),
            error = %err,
            "ingest_rejected"
        ),
    }
}
