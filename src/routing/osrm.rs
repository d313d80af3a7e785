//! OSRM route fetcher.
//!
//! Requests `{base}{lon},{lat};{lon},{lat}?overview=full&geometries=geojson`
//! and reads the geometry of the first returned route. GeoJSON positions are
//! `[longitude, latitude]`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::geo::{Coordinate, Route};
use crate::routing::fetcher::{FetchedRoute, RouteError, RouteFetcher, RouteResult};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

/// Route fetcher backed by an OSRM `route/v1/driving` endpoint.
#[derive(Debug, Clone)]
pub struct OsrmRouteFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRouteFetcher {
    /// Creates a fetcher with the default 30s request timeout.
    pub fn new(base_url: impl Into<String>) -> RouteResult<Self> {
        Self::with_timeout(base_url, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Creates a fetcher with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> RouteResult<Self> {
        let mut base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(RouteError::Config("OSRM base URL cannot be empty".to_string()));
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the request URL for a start/end pair.
    pub fn route_url(&self, start: Coordinate, end: Coordinate) -> String {
        format!(
            "{}{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, start.longitude, start.latitude, end.longitude, end.latitude
        )
    }
}

/// Decodes an OSRM JSON body into a route.
pub fn parse_osrm_response(body: &str) -> RouteResult<FetchedRoute> {
    let response: OsrmResponse =
        serde_json::from_str(body).map_err(|e| RouteError::Decode(e.to_string()))?;

    if response.code != "Ok" {
        return Err(RouteError::NoRoute {
            code: response.code,
        });
    }

    let first = response.routes.into_iter().next().ok_or_else(|| RouteError::NoRoute {
        code: "NoRoute".to_string(),
    })?;

    if first.geometry.coordinates.is_empty() {
        return Err(RouteError::EmptyGeometry);
    }

    let route: Route = first
        .geometry
        .coordinates
        .iter()
        .map(|[lon, lat]| Coordinate::new(*lat, *lon))
        .collect();

    Ok(FetchedRoute {
        route,
        distance_meters: first.distance,
        duration_seconds: first.duration,
    })
}

#[async_trait]
impl RouteFetcher for OsrmRouteFetcher {
    async fn fetch(&self, start: Coordinate, end: Coordinate) -> RouteResult<FetchedRoute> {
        let url = self.route_url(start, end);
        debug!("Requesting route: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // OSRM reports NoRoute/InvalidQuery with a 400 and a JSON code
            return match parse_osrm_response(&body) {
                Err(err @ RouteError::NoRoute { .. }) => Err(err),
                _ => Err(RouteError::Status {
                    status: status.as_u16(),
                }),
            };
        }

        let fetched = parse_osrm_response(&body)?;
        debug!("OSRM returned {} points", fetched.route.len());
        Ok(fetched)
    }

    fn name(&self) -> &str {
        "osrm"
    }
}
