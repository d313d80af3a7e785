//! HTTP server implementation using axum
//!
//! Provides the main API server with CORS support, graceful shutdown,
//! and tracing middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::routes::create_router;
use crate::api::websocket::WebSocketHandler;
use crate::geo::ArrowPlanner;
use crate::refresh::{RefreshHandle, RouteStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Latest route snapshot and endpoints
    pub store: Arc<RouteStore>,
    /// Control handle for the refresh service
    pub refresh: RefreshHandle,
    /// WebSocket handler for broadcasting events
    pub ws_handler: Arc<WebSocketHandler>,
    /// Planner options used by the stateless arrows endpoint
    pub planner: ArrowPlanner,
    /// Port the server is bound to
    pub port: u16,
}

impl AppState {
    pub fn new(refresh: RefreshHandle, planner: ArrowPlanner, port: u16) -> Self {
        Self {
            store: refresh.store().clone(),
            refresh,
            ws_handler: Arc::new(WebSocketHandler::new()),
            planner,
            port,
        }
    }
}

/// HTTP API server
pub struct ApiServer {
    /// Port to listen on
    port: u16,
    /// Whether the server is running
    enabled: bool,
    /// Shared application state
    state: AppState,
    /// Shutdown signal sender
    shutdown_tx: Option<watch::Sender<bool>>,
    /// Server task handle
    server_handle: Option<tokio::task::JoinHandle<()>>,
    /// Event forwarding task handle
    forward_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    /// Create a new API server instance
    pub fn new(port: u16, refresh: RefreshHandle, planner: ArrowPlanner) -> Self {
        Self::with_state(port, AppState::new(refresh, planner, port))
    }

    /// Create a new API server with existing state
    pub fn with_state(port: u16, state: AppState) -> Self {
        Self {
            port,
            enabled: false,
            state,
            shutdown_tx: None,
            server_handle: None,
            forward_handle: None,
        }
    }

    /// Get the server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Check if the server is running
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a clone of the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Configure CORS so browser-based map clients can poll the API
    fn configure_cors() -> CorsLayer {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
            .max_age(Duration::from_secs(3600))
    }

    /// Build the router with all middleware
    fn build_router(&self) -> Router {
        create_router(self.state.clone())
            .layer(Self::configure_cors())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP server
    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.enabled {
            warn!("API server is already running");
            return Ok(());
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let router = self.build_router();

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut forward_shutdown_rx = shutdown_tx.subscribe();
        self.shutdown_tx = Some(shutdown_tx);

        // Bind the listener
        let listener = TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", addr);

        self.enabled = true;

        // Relay refresh events to WebSocket clients
        let ws_handler = self.state.ws_handler.clone();
        let events = self.state.refresh.subscribe();
        self.forward_handle = Some(tokio::spawn(async move {
            tokio::select! {
                _ = ws_handler.forward(events) => {}
                _ = forward_shutdown_rx.changed() => {}
            }
        }));

        // Spawn the server task
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    // Wait for shutdown signal
                    while !*shutdown_rx.borrow() {
                        if shutdown_rx.changed().await.is_err() {
                            break;
                        }
                    }
                    info!("API server shutting down gracefully");
                })
                .await
                .unwrap_or_else(|e| {
                    error!("API server error: {}", e);
                });
        });

        self.server_handle = Some(handle);

        Ok(())
    }

    /// Stop the HTTP server gracefully
    pub async fn stop(&mut self) {
        if !self.enabled {
            warn!("API server is not running");
            return;
        }

        info!("Stopping API server...");

        // Send shutdown signal
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }

        if let Some(handle) = self.forward_handle.take() {
            let _ = handle.await;
        }

        // Wait for the server to finish
        if let Some(handle) = self.server_handle.take() {
            // Give the server some time to shut down gracefully
            tokio::select! {
                _ = handle => {
                    info!("API server stopped successfully");
                }
                _ = tokio::time::sleep(Duration::from_secs(5)) => {
                    warn!("API server shutdown timed out");
                }
            }
        }

        self.enabled = false;
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        // Send shutdown signal if server is still running
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::refresh::{Endpoints, RefreshService};
    use crate::routing::MockRouteFetcher;

    fn service() -> RefreshService {
        let store = Arc::new(RouteStore::new(Endpoints::unlabeled(
            Coordinate::new(28.6139, 77.2090),
            Coordinate::new(28.4595, 77.0266),
        )));
        RefreshService::new(
            Arc::new(MockRouteFetcher::new()),
            ArrowPlanner::default(),
            store,
            Duration::from_secs(600),
        )
    }

    #[tokio::test]
    async fn test_app_state_shares_store() {
        let service = service();
        let state = AppState::new(service.handle(), ArrowPlanner::default(), 8088);

        assert!(Arc::ptr_eq(&state.store, &service.store()));
        assert_eq!(state.port, 8088);
        assert_eq!(state.ws_handler.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_server_not_running_initially() {
        let service = service();
        let server = ApiServer::new(0, service.handle(), ArrowPlanner::default());
        assert!(!server.is_enabled());
        assert_eq!(server.port(), 0);
    }
}
