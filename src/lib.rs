//! # routemark
//!
//! Turns a driving route into a sparse set of direction arrows for a map
//! renderer, and keeps that result fresh in the background.
//!
//! ## Features
//!
//! - **Geodesy**: Haversine distances and planar headings between route points
//! - **Arrow Planning**: Evenly spaced midpoint arrows plus a final arrow
//! - **Route Fetching**: OSRM client behind a mockable trait
//! - **Periodic Refresh**: Cancellable refresh and endpoint jitter tasks
//! - **REST API**: HTTP endpoints for the latest snapshot
//! - **WebSocket Support**: Real-time refresh events
//! - **Flexible Configuration**: TOML/JSON files, environment variables, CLI arguments
//!
//! ## Quick Start
//!
//! ```rust
//! use routemark::geo::{plan_arrows, Coordinate, Route};
//!
//! let route = Route::new(vec![
//!     Coordinate::new(28.60, 77.20),
//!     Coordinate::new(28.61, 77.21),
//!     Coordinate::new(28.62, 77.22),
//! ]);
//!
//! // About 2.96 km: one midpoint arrow, then the final arrow
//! let arrows = plan_arrows(&route, 2500.0);
//! assert_eq!(arrows.len(), 2);
//!
//! // Spacing longer than the route leaves only the final arrow
//! assert_eq!(plan_arrows(&route, 1.0e9).len(), 1);
//! ```
//!
//! ## Module Overview
//!
//! - [`geo`]: Coordinates, distance, heading and arrow planning
//! - [`routing`]: Route fetchers (OSRM and mock)
//! - [`refresh`]: Snapshot store, events and the background refresh service
//! - [`api`]: REST API server and WebSocket handlers
//! - [`config`]: Configuration loading and management
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   fetch   ┌───────────┐  plan   ┌───────────┐
//! │  routing  │ ────────> │  refresh  │ ──────> │    geo    │
//! └───────────┘           └─────┬─────┘         └───────────┘
//!                               │ snapshot + events
//!                         ┌─────┴─────┐
//!                         │    api    │
//!                         └───────────┘
//! ```
//!
//! ## Configuration
//!
//! Configuration follows a precedence chain:
//! 1. Default values
//! 2. Configuration file (TOML/JSON)
//! 3. Environment variables (`ROUTEMARK_*`)
//! 4. CLI arguments
//!
//! See [`config::Settings`] for all available options.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Full version string with name
pub const FULL_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Module Exports
// ============================================================================

/// Coordinates, haversine distance, headings and arrow placement.
pub mod geo;

/// Route fetching from a routing service.
pub mod routing;

/// Route snapshots, refresh events and the scheduled refresh service.
pub mod refresh;

/// REST API server and WebSocket handlers for map renderers.
pub mod api;

/// Configuration management for loading settings from files, env, and CLI.
pub mod config;

// ============================================================================
// Re-exports for Convenience
// ============================================================================

// Geo types
pub use geo::{
    distance_meters, heading, plan_arrows, ArrowMarker, ArrowPlanner, Coordinate, CoordinateError,
    HeadingScale, Route,
};

// Routing types
pub use routing::{FetchedRoute, MockRouteFetcher, OsrmRouteFetcher, RouteError, RouteFetcher};

// Refresh types
pub use refresh::{
    Endpoint, Endpoints, MapRegion, RefreshHandle, RefreshService, RouteEvent, RouteSnapshot,
    RouteStore,
};

// API types
pub use api::{ApiServer, AppState, WebSocketHandler};

// Config types
pub use config::{CliArgs, ConfigError, Settings};

// ============================================================================
// Prelude Module
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust
/// use routemark::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{ApiServer, AppState};
    pub use crate::config::{CliArgs, Settings};
    pub use crate::geo::{ArrowMarker, ArrowPlanner, Coordinate, HeadingScale, Route};
    pub use crate::refresh::{RefreshService, RouteSnapshot, RouteStore};
    pub use crate::routing::{OsrmRouteFetcher, RouteFetcher};
    pub use crate::{FULL_VERSION, NAME, VERSION};
}
