//! Periodic route refresh for routemark
//!
//! This module glues the route fetcher to the arrow planner and keeps the
//! latest result available to readers.
//!
//! # Submodules
//!
//! - [`state`] - Endpoints, snapshots and the shared route store
//! - [`events`] - Events broadcast after each refresh
//! - [`jitter`] - Random endpoint perturbation
//! - [`service`] - The scheduled refresh and jitter tasks
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use routemark::config::Settings;
//! use routemark::refresh::RefreshService;
//! use routemark::routing::MockRouteFetcher;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::default();
//!     let mut service = RefreshService::from_settings(Arc::new(MockRouteFetcher::new()), &settings);
//!     service.start();
//!
//!     // ... serve the store to a renderer ...
//!
//!     service.stop().await;
//! }
//! ```

pub mod events;
pub mod jitter;
pub mod service;
pub mod state;

pub use events::{EndpointSource, RefreshTrigger, RouteEvent};
pub use jitter::EndpointJitter;
pub use service::{refresh_route, JitterSchedule, RefreshHandle, RefreshService};
pub use state::{Endpoint, Endpoints, MapRegion, RoutePlan, RouteSnapshot, RouteStore};
