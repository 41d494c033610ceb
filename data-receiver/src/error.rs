//! Error taxonomy for the ingestion pipeline and its plugins.
//!
//! Every pipeline failure maps to exactly one HTTP status code. The JSON body
//! returned to the caller never carries key material, expected signatures or
//! file system paths.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors raised while building plugins or running the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// Bad, missing or unsupported plugin parameter.
    #[error("configuration error: {0}")]
    Config(String),

    /// An extracted field was empty.
    #[error("'{field}' is empty")]
    Validation { field: String },

    /// The computed signature did not match the one supplied by the caller.
    #[error("signatures don't match")]
    Authentication { received: String, expected: String },

    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The writer was closed before the message could be handed off.
    #[error("writer is closed")]
    WriterClosed,

    /// No service is registered under the requested name.
    #[error("service {0:?} not found")]
    NotFound(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,
}

impl ReceiverError {
    /// HTTP status code the pipeline responds with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReceiverError::NotFound(_) => StatusCode::NOT_FOUND,
            ReceiverError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ReceiverError::Validation { .. } => StatusCode::BAD_REQUEST,
            ReceiverError::Body(_) | ReceiverError::Authentication { .. } => {
                StatusCode::UNAUTHORIZED
            }
            ReceiverError::Config(_) | ReceiverError::Io(_) | ReceiverError::WriterClosed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ReceiverError::Io(_) => "failed to persist message".to_string(),
            ReceiverError::Config(_) => "service is misconfigured".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ReceiverError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({ "Error": self.public_message() })),
        )
            .into_response()
    }
}
