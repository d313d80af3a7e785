//! Route fetcher interface and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::geo::{Coordinate, Route};

/// Result type for routing operations
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors that can occur while fetching a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("Routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("Routing service returned HTTP {status}")]
    Status { status: u16 },

    /// The response body could not be decoded.
    #[error("Malformed routing response: {0}")]
    Decode(String),

    /// The service found no route between the endpoints.
    #[error("No route found ({code})")]
    NoRoute { code: String },

    /// The first route carried no geometry points.
    #[error("Route geometry is empty")]
    EmptyGeometry,

    /// The fetcher could not be constructed or configured.
    #[error("Invalid routing configuration: {0}")]
    Config(String),
}

/// A successfully fetched route with optional service metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRoute {
    /// Route geometry in travel order.
    pub route: Route,
    /// Road distance reported by the service, in meters.
    pub distance_meters: Option<f64>,
    /// Travel time reported by the service, in seconds.
    pub duration_seconds: Option<f64>,
}

impl FetchedRoute {
    /// Wraps bare geometry without service metadata.
    pub fn from_route(route: Route) -> Self {
        Self {
            route,
            distance_meters: None,
            duration_seconds: None,
        }
    }
}

/// Trait defining the route fetcher interface.
///
/// Implementations return either a non-empty route or an error; they never
/// return an empty geometry as success.
#[async_trait]
pub trait RouteFetcher: Send + Sync {
    /// Fetches a driving route from `start` to `end`.
    async fn fetch(&self, start: Coordinate, end: Coordinate) -> RouteResult<FetchedRoute>;

    /// Short name used in log output.
    fn name(&self) -> &str;
}
