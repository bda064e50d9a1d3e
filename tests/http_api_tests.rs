//! HTTP surface tests using the router directly
//!
//! These tests verify:
//! - `GET /` serves the dictionary as camelCase JSON with explicit nulls
//! - Rebuild failures become a bare 500
//! - Liveness, readiness and component health
//! - Prometheus metrics exposition
//! - Graceful shutdown of a bound server

mod support;

use axum::http::StatusCode;
use metadata_dictionary_server::{ShutdownConfig, ShutdownCoordinator, build_router, serve};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use support::*;

#[tokio::test]
async fn dictionary_is_served_as_json_array() {
    // Arrange
    let source = Arc::new(CountingSource::new(fixture_document()));
    let router = build_router(fixture_state(source.clone()));

    // Act
    let (status, body) = get_json(&router, "/").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().expect("top-level array");
    assert_eq!(entries.len(), 9);
    assert_eq!(
        entries[0],
        json!({
            "variableCode": "authorship",
            "variableLabel": "authorship",
            "variableDefinition": "Person or people who described the taxon",
            "variableValueCode": null,
            "variableValueLabel": null,
            "variableValueDefinition": null,
        })
    );
    assert_eq!(entries[3]["variableCode"], "foo");
    assert_eq!(entries[3]["variableValueCode"], "a");
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn repeated_requests_hit_the_cache() {
    let source = Arc::new(CountingSource::new(fixture_document()));
    let router = build_router(fixture_state(source.clone()));

    let (_, first) = get(&router, "/").await;
    let (_, second) = get(&router, "/").await;

    assert_eq!(first, second);
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn rebuild_failure_is_internal_server_error() {
    let source = Arc::new(CountingSource::new(fixture_document()).failing_first(1));
    let router = build_router(fixture_state(source));

    let (status, body) = get_json(&router, "/").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": 500, "msg": "Internal Server Error"}));

    // Nothing about the failure leaks, and the next request recovers.
    let (status, _) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn liveness_is_always_healthy() {
    let router = build_router(fixture_state(Arc::new(CountingSource::new(
        fixture_document(),
    ))));

    let (status, body) = get_json(&router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn readiness_follows_rebuild_outcomes() {
    let source = Arc::new(CountingSource::new(fixture_document()));
    let router = build_router(fixture_state(source.clone()));

    let (status, body) = get_json(&router, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
    assert_eq!(body["reason"], "dictionary has not been built yet");

    get(&router, "/").await;
    let (status, body) = get_json(&router, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn failed_rebuild_marks_cache_unhealthy() {
    let source = Arc::new(CountingSource::new(fixture_document()).failing_first(1));
    let router = build_router(fixture_state(source));

    get(&router, "/").await;

    let (status, body) = get_json(&router, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(
        body["reason"]
            .as_str()
            .unwrap()
            .starts_with("last dictionary rebuild failed")
    );

    let (status, body) = get_json(&router, "/health/components").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let cache = &body["components"]["dictionary_cache"];
    assert_eq!(cache["status"], "unhealthy");
    assert_eq!(cache["details"]["failures"], 1);
    assert_eq!(body["components"]["source"]["status"], "healthy");
}

#[tokio::test]
async fn components_report_cache_details() {
    let source = Arc::new(CountingSource::new(fixture_document()));
    let router = build_router(fixture_state(source));
    get(&router, "/").await;
    get(&router, "/").await;

    let (status, body) = get_json(&router, "/health/components").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    let details = &body["components"]["dictionary_cache"]["details"];
    assert_eq!(details["entries"], 9);
    assert_eq!(details["warnings"], 2);
    assert_eq!(details["hits"], 1);
    assert_eq!(details["misses"], 1);
    assert_eq!(details["fresh"], true);
}

#[tokio::test]
async fn metrics_are_exposed_in_prometheus_format() {
    let source = Arc::new(CountingSource::new(fixture_document()));
    let router = build_router(fixture_state(source));
    get(&router, "/").await;

    let (status, body) = get(&router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("dictionary_rebuilds_total{outcome=\"success\"}"));
    assert!(text.contains("dictionary_cache_misses_total"));
    assert!(text.contains("dictionary_warnings_total{kind=\"unmapped_variable\"}"));
    assert!(text.contains("dictionary_entries"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let router = build_router(fixture_state(Arc::new(CountingSource::new(
        fixture_document(),
    ))));

    let (status, _) = get(&router, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn server_stops_on_shutdown_signal() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let state = fixture_state(Arc::new(CountingSource::new(fixture_document())));
    let coordinator = ShutdownCoordinator::new(ShutdownConfig::default().with_drain_timeout(1));

    let server = tokio::spawn(serve(listener, state, coordinator.clone()));
    coordinator.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after shutdown is triggered")
        .unwrap();
    assert!(result.is_ok());
}
