//! End-to-end tests for the ingestion endpoint.
//!
//! Drives the full router with `oneshot` requests and checks the status code,
//! the JSON error body and what reached the writer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use receiver::auth::{EmptyAuthenticator, HashAlgorithm, SignatureEncoding, Signer};
use receiver::extract::{EmptyExtractor, HeaderExtractor, QueryExtractor};
use receiver::writer::{MemoryWriter, Writer};
use receiver::{router, AppState, Config, Parameters, ReceiverError, ServiceRegistry};
use serde_json::Value;
use tower::ServiceExt;

/// base64-URL(HMAC-SHA256("magicKey", "test message"))
const SIGNATURE: &str = "GXjQXzGexUuSH444qEyMI-b9Lif_Uq39gElhs_7PMVY=";

async fn test_app() -> (Router, Arc<MemoryWriter>) {
    let writer = Arc::new(MemoryWriter::new());
    let registry = ServiceRegistry::new();

    let extractor = HeaderExtractor::new(&Parameters::from([(
        "signature".to_string(),
        "x-signature".to_string(),
    )]))
    .expect("header extractor");
    let signer = Signer::new("magicKey", HashAlgorithm::Sha256, SignatureEncoding::Base64Url);

    registry
        .register("test", Arc::new(extractor), Arc::new(signer), writer.clone())
        .await;

    let app = router(AppState::new(Config::default(), registry));
    (app, writer)
}

fn post(uri: &str, signature: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(signature) = signature {
        builder = builder.header("x-signature", signature);
    }
    builder.body(Body::from(body)).expect("request")
}

async fn error_message(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json: Value = serde_json::from_slice(&body).expect("error body should be JSON");
    json["Error"].as_str().expect("Error should be a string").to_string()
}

#[tokio::test]
async fn signed_request_is_accepted_and_written() {
    let (app, writer) = test_app().await;

    let response = app
        .oneshot(post("/data/test", Some(SIGNATURE), "test message"))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(writer.messages().await, vec!["test message".to_string()]);
}

#[tokio::test]
async fn missing_signature_header_is_bad_request() {
    let (app, writer) = test_app().await;

    let response = app
        .oneshot(post("/data/test", None, "test message"))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "'signature' is empty");
    assert!(writer.messages().await.is_empty());
}

#[tokio::test]
async fn wrong_signature_is_unauthorized_without_leaking_expected() {
    let (app, writer) = test_app().await;

    let response = app
        .oneshot(post("/data/test", Some("bm90LWEtc2lnbmF0dXJl"), "test message"))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let message = error_message(response).await;
    assert!(!message.contains(SIGNATURE));
    assert!(writer.messages().await.is_empty());
}

#[tokio::test]
async fn unknown_service_is_not_found() {
    let (app, writer) = test_app().await;

    let response = app
        .oneshot(post("/data/unknown", Some(SIGNATURE), "test message"))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(error_message(response).await.contains("unknown"));
    assert!(writer.messages().await.is_empty());
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _writer) = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn query_extractor_service() {
    let writer = Arc::new(MemoryWriter::new());
    let registry = ServiceRegistry::new();
    let extractor = QueryExtractor::new(&Parameters::from([(
        "signature".to_string(),
        "sig".to_string(),
    )]))
    .expect("query extractor");
    let signer = Signer::new("magicKey", HashAlgorithm::Sha256, SignatureEncoding::Base64Url);
    registry
        .register("query", Arc::new(extractor), Arc::new(signer), writer.clone())
        .await;
    let app = router(AppState::new(Config::default(), registry));

    // '=' is percent-encoded in the query string.
    let uri = "/data/query?sig=GXjQXzGexUuSH444qEyMI-b9Lif_Uq39gElhs_7PMVY%3D";
    let response = app
        .oneshot(post(uri, None, "test message"))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(writer.messages().await, vec!["test message".to_string()]);
}

#[tokio::test]
async fn non_utf8_service_segment_is_json_not_found() {
    let (app, writer) = test_app().await;

    let response = app
        .oneshot(post("/data/%FF", Some(SIGNATURE), "test message"))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(error_message(response).await.contains("%FF"));
    assert!(writer.messages().await.is_empty());
}

/// Writer that never finishes within the request timeout.
struct StalledWriter;

#[async_trait]
impl Writer for StalledWriter {
    async fn write(&self, _content: String) -> Result<(), ReceiverError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    async fn close(&self) {}
}

#[tokio::test]
async fn timed_out_request_is_json_request_timeout() {
    let registry = ServiceRegistry::new();
    registry
        .register(
            "slow",
            Arc::new(EmptyExtractor),
            Arc::new(EmptyAuthenticator),
            Arc::new(StalledWriter),
        )
        .await;
    let config = Config {
        request_timeout: Duration::from_millis(20),
        ..Config::default()
    };
    let app = router(AppState::new(config, registry));

    let response = app
        .oneshot(post("/data/slow", None, "test message"))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(error_message(response).await, "request timed out");
}
