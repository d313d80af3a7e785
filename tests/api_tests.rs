//! Integration tests for the REST API endpoints
//!
//! Drives the real router with a mock route fetcher using axum's test
//! utilities.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use routemark::api::{create_router, AppState};
use routemark::geo::{ArrowPlanner, Coordinate};
use routemark::refresh::{Endpoint, Endpoints, RefreshService, RouteStore};
use routemark::routing::MockRouteFetcher;

// ============================================================================
// Test Helpers
// ============================================================================

fn endpoints() -> Endpoints {
    Endpoints::new(
        Endpoint::new(Coordinate::new(28.6139, 77.2090), "Start: New Delhi"),
        Endpoint::new(Coordinate::new(28.4595, 77.0266), "End: Gurugram"),
    )
}

fn test_service() -> RefreshService {
    RefreshService::new(
        Arc::new(MockRouteFetcher::new()),
        ArrowPlanner::default(),
        Arc::new(RouteStore::new(endpoints())),
        Duration::from_secs(600),
    )
}

fn test_router(service: &RefreshService) -> Router {
    create_router(AppState::new(service.handle(), ArrowPlanner::default(), 8088))
}

async fn make_request(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
        None => Body::empty(),
    };

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, body_json)
}

fn sample_route() -> Value {
    json!([
        {"latitude": 28.60, "longitude": 77.20},
        {"latitude": 28.61, "longitude": 77.21},
        {"latitude": 28.62, "longitude": 77.22}
    ])
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let service = test_service();

    let (status, body) = make_request(test_router(&service), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert!(!body["data"]["version"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["revision"], 0);
}

// ============================================================================
// Route Snapshot Tests
// ============================================================================

#[tokio::test]
async fn test_route_not_found_before_first_refresh() {
    let service = test_service();

    let (status, body) = make_request(test_router(&service), Method::GET, "/route", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_route_returns_latest_snapshot() {
    let service = test_service();
    service.refresh_once().await.unwrap();

    let (status, body) = make_request(test_router(&service), Method::GET, "/route", None).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["revision"], 1);
    assert_eq!(data["route"].as_array().unwrap().len(), 10);
    assert!(!data["arrows"].as_array().unwrap().is_empty());
    assert_eq!(data["endpoints"]["start"]["label"], "Start: New Delhi");

    let delta = data["region"]["latitude_delta"].as_f64().unwrap();
    assert!((delta - 0.2544).abs() < 1e-9);
}

// ============================================================================
// Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_get_endpoints() {
    let service = test_service();

    let (status, body) =
        make_request(test_router(&service), Method::GET, "/endpoints", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["start"]["position"]["latitude"], 28.6139);
    assert_eq!(body["data"]["end"]["label"], "End: Gurugram");
}

#[tokio::test]
async fn test_put_endpoints_replaces_and_keeps_labels() {
    let service = test_service();
    let mut events = service.subscribe();

    let (status, body) = make_request(
        test_router(&service),
        Method::PUT,
        "/endpoints",
        Some(json!({
            "start": {"latitude": 19.0760, "longitude": 72.8777, "label": "Start: Mumbai"},
            "end": {"latitude": 18.5204, "longitude": 73.8567}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["start"]["label"], "Start: Mumbai");
    assert_eq!(body["data"]["end"]["label"], "End: Gurugram");

    let store = service.store();
    assert_eq!(store.endpoints().start.position, Coordinate::new(19.0760, 72.8777));
    assert_eq!(store.base_endpoints().end.position, Coordinate::new(18.5204, 73.8567));

    let event = events.try_recv().unwrap();
    assert_eq!(event.type_name(), "EndpointsChanged");
}

#[tokio::test]
async fn test_put_endpoints_rejects_invalid_coordinate() {
    let service = test_service();

    let (status, body) = make_request(
        test_router(&service),
        Method::PUT,
        "/endpoints",
        Some(json!({
            "start": {"latitude": 91.0, "longitude": 72.8777},
            "end": {"latitude": 18.5204, "longitude": 73.8567}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(service.store().endpoints(), endpoints());
}

// ============================================================================
// Refresh Tests
// ============================================================================

#[tokio::test]
async fn test_refresh_is_accepted() {
    let service = test_service();

    let (status, body) = make_request(test_router(&service), Method::POST, "/refresh", None).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["queued"], true);
}

// ============================================================================
// Arrow Planning Tests
// ============================================================================

#[tokio::test]
async fn test_plan_arrows_huge_spacing_gets_final_arrow_only() {
    let service = test_service();

    let (status, body) = make_request(
        test_router(&service),
        Method::POST,
        "/arrows",
        Some(json!({ "route": sample_route(), "spacing_meters": 1.0e9 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let arrow = &body["data"]["arrows"][0];
    let lat = arrow["position"]["latitude"].as_f64().unwrap();
    let lon = arrow["position"]["longitude"].as_f64().unwrap();
    assert!((lat - 28.6201).abs() < 1e-9);
    assert!((lon - 77.22).abs() < 1e-9);
    assert!((arrow["heading_degrees"].as_f64().unwrap() - 45.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_plan_arrows_with_spacing_override() {
    let service = test_service();

    let (status, body) = make_request(
        test_router(&service),
        Method::POST,
        "/arrows",
        Some(json!({ "route": sample_route(), "spacing_meters": 1000.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 3);
    assert_eq!(body["data"]["spacing_meters"], 1000.0);
}

#[tokio::test]
async fn test_plan_arrows_empty_route() {
    let service = test_service();

    let (status, body) = make_request(
        test_router(&service),
        Method::POST,
        "/arrows",
        Some(json!({ "route": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 0);
    assert_eq!(body["data"]["distance_meters"], 0.0);
}

#[tokio::test]
async fn test_plan_arrows_rejects_non_positive_spacing() {
    let service = test_service();

    let (status, body) = make_request(
        test_router(&service),
        Method::POST,
        "/arrows",
        Some(json!({ "route": sample_route(), "spacing_meters": 0.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Status Tests
// ============================================================================

#[tokio::test]
async fn test_api_status() {
    let service = test_service();

    let (status, body) =
        make_request(test_router(&service), Method::GET, "/api/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["port"], 8088);
    assert_eq!(body["data"]["connected_clients"], 0);
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let service = test_service();

    let (status, _) = make_request(test_router(&service), Method::GET, "/ws", None).await;

    assert!(!status.is_success());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let service = test_service();

    let (status, _) = make_request(test_router(&service), Method::GET, "/tabs", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
