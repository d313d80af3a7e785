//! REST API routes and handlers
//!
//! Defines the HTTP endpoints for reading the current route and steering
//! the refresh service.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::server::AppState;
use crate::api::websocket::ws_handler;
use crate::geo::{ArrowMarker, Coordinate, Route};
use crate::refresh::{Endpoint, Endpoints};

// ============================================================================
// Request/Response Structs
// ============================================================================

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub revision: u64,
}

/// One endpoint in a `PUT /endpoints` body
#[derive(Debug, Deserialize)]
pub struct EndpointInput {
    pub latitude: f64,
    pub longitude: f64,
    /// Keeps the current label when omitted
    #[serde(default)]
    pub label: Option<String>,
}

impl EndpointInput {
    fn into_endpoint(self, current: &Endpoint) -> Result<Endpoint, String> {
        let position = Coordinate::new(self.latitude, self.longitude);
        position.validate().map_err(|e| e.to_string())?;
        let label = self.label.unwrap_or_else(|| current.label.clone());
        Ok(Endpoint::new(position, label))
    }
}

/// Replace endpoints request
#[derive(Debug, Deserialize)]
pub struct EndpointsRequest {
    pub start: EndpointInput,
    pub end: EndpointInput,
}

/// Refresh request response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub queued: bool,
    pub revision: u64,
}

/// Plan arrows request
#[derive(Debug, Deserialize)]
pub struct ArrowsRequest {
    pub route: Vec<Coordinate>,
    #[serde(default)]
    pub spacing_meters: Option<f64>,
}

/// Plan arrows response
#[derive(Debug, Serialize)]
pub struct ArrowsResponse {
    pub arrows: Vec<ArrowMarker>,
    pub count: usize,
    pub distance_meters: f64,
    pub spacing_meters: f64,
}

/// API status response
#[derive(Debug, Serialize)]
pub struct ApiStatusResponse {
    pub port: u16,
    pub connected_clients: usize,
    pub revision: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        revision: state.store.revision(),
    }))
}

/// GET /route - Latest route snapshot
async fn get_route(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.snapshot() {
        Some(snapshot) => (
            StatusCode::OK,
            Json(ApiResponse::success(snapshot.as_ref().clone())),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error("No route available yet")),
        )
            .into_response(),
    }
}

/// GET /endpoints - Endpoints used for the next fetch
async fn get_endpoints(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.store.endpoints()))
}

/// PUT /endpoints - Replace both endpoints and refresh
async fn put_endpoints(
    State(state): State<AppState>,
    Json(request): Json<EndpointsRequest>,
) -> impl IntoResponse {
    let current = state.store.base_endpoints();

    let parsed = request
        .start
        .into_endpoint(&current.start)
        .and_then(|start| Ok(Endpoints::new(start, request.end.into_endpoint(&current.end)?)));

    match parsed {
        Ok(endpoints) => {
            info!(
                "Endpoints set via API: {} -> {}",
                endpoints.start.position, endpoints.end.position
            );
            state.refresh.set_endpoints(endpoints.clone());
            (StatusCode::OK, Json(ApiResponse::success(endpoints))).into_response()
        }
        Err(message) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(message)),
        )
            .into_response(),
    }
}

/// POST /refresh - Request an immediate refresh
async fn request_refresh(State(state): State<AppState>) -> impl IntoResponse {
    let queued = state.refresh.request_refresh();
    let response = RefreshResponse {
        queued,
        revision: state.store.revision(),
    };

    if queued {
        (StatusCode::ACCEPTED, Json(ApiResponse::success(response))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::error("Refresh queue is full")),
        )
            .into_response()
    }
}

/// POST /arrows - Plan arrows for an arbitrary route
async fn plan_arrows(
    State(state): State<AppState>,
    Json(request): Json<ArrowsRequest>,
) -> impl IntoResponse {
    let mut planner = state.planner;

    if let Some(spacing) = request.spacing_meters {
        if !spacing.is_finite() || spacing <= 0.0 {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error("spacing_meters must be a positive number")),
            )
                .into_response();
        }
        planner.spacing_meters = spacing;
    }

    if let Some(err) = request.route.iter().find_map(|p| p.validate().err()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(err.to_string())),
        )
            .into_response();
    }

    let route = Route::new(request.route);
    let arrows = planner.plan(&route);

    (
        StatusCode::OK,
        Json(ApiResponse::success(ArrowsResponse {
            count: arrows.len(),
            arrows,
            distance_meters: route.total_distance_meters(),
            spacing_meters: planner.spacing_meters,
        })),
    )
        .into_response()
}

/// GET /api/status - API server status
async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(ApiStatusResponse {
        port: state.port,
        connected_clients: state.ws_handler.client_count().await,
        revision: state.store.revision(),
    }))
}

// ============================================================================
// Router
// ============================================================================

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Route snapshot
        .route("/route", get(get_route))
        .route("/endpoints", get(get_endpoints).put(put_endpoints))
        .route("/refresh", post(request_refresh))
        // Stateless planning
        .route("/arrows", post(plan_arrows))
        // Live events
        .route("/ws", get(ws_handler))
        // API management
        .route("/api/status", get(api_status))
        .with_state(state)
}
