//! Shared route state.
//!
//! [`RouteStore`] holds the endpoints and the latest [`RouteSnapshot`].
//! Snapshots are immutable and replaced whole on every successful refresh;
//! a failed refresh leaves the previous snapshot untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Settings;
use crate::geo::{ArrowMarker, Coordinate, Route};

/// Padding added to each span when framing the endpoints, in degrees.
pub const REGION_PADDING_DEGREES: f64 = 0.1;

/// A route endpoint with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub position: Coordinate,
    #[serde(default)]
    pub label: String,
}

impl Endpoint {
    pub fn new(position: Coordinate, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
        }
    }
}

/// Start and end of the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub start: Endpoint,
    pub end: Endpoint,
}

impl Endpoints {
    pub fn new(start: Endpoint, end: Endpoint) -> Self {
        Self { start, end }
    }

    /// Endpoints with empty labels.
    pub fn unlabeled(start: Coordinate, end: Coordinate) -> Self {
        Self::new(Endpoint::new(start, ""), Endpoint::new(end, ""))
    }

    /// Endpoints as configured in the settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            start: Endpoint::new(settings.start.coordinate(), settings.start.label.clone()),
            end: Endpoint::new(settings.end.coordinate(), settings.end.label.clone()),
        }
    }

    /// Same labels, new positions.
    pub fn moved_to(&self, start: Coordinate, end: Coordinate) -> Self {
        Self {
            start: Endpoint::new(start, self.start.label.clone()),
            end: Endpoint::new(end, self.end.label.clone()),
        }
    }
}

/// Initial map viewport framing both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Centers on the endpoints' midpoint; spans their separation plus padding.
    pub fn framing(start: &Coordinate, end: &Coordinate) -> Self {
        Self {
            center: start.midpoint(end),
            latitude_delta: (start.latitude - end.latitude).abs() + REGION_PADDING_DEGREES,
            longitude_delta: (start.longitude - end.longitude).abs() + REGION_PADDING_DEGREES,
        }
    }
}

/// Everything a renderer needs for one refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub id: Uuid,
    pub revision: u64,
    pub fetched_at: DateTime<Utc>,
    pub endpoints: Endpoints,
    pub route: Route,
    pub arrows: Vec<ArrowMarker>,
    /// Haversine length of the route geometry.
    pub distance_meters: f64,
    /// Road distance reported by the routing service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_distance_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub region: MapRegion,
}

#[derive(Debug)]
struct StoreInner {
    /// Endpoints chosen by configuration or the API; jitter is relative to these.
    base: Endpoints,
    /// Endpoints used for the next fetch.
    current: Endpoints,
    snapshot: Option<Arc<RouteSnapshot>>,
    revision: u64,
}

/// Thread-safe holder for endpoints and the latest snapshot.
#[derive(Debug)]
pub struct RouteStore {
    inner: RwLock<StoreInner>,
}

/// Payload for [`RouteStore::commit`].
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub endpoints: Endpoints,
    pub route: Route,
    pub arrows: Vec<ArrowMarker>,
    pub service_distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
}

impl RouteStore {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                base: endpoints.clone(),
                current: endpoints,
                snapshot: None,
                revision: 0,
            }),
        }
    }

    /// Endpoints for the next fetch.
    pub fn endpoints(&self) -> Endpoints {
        self.inner.read().current.clone()
    }

    /// Endpoints the jitter perturbs around.
    pub fn base_endpoints(&self) -> Endpoints {
        self.inner.read().base.clone()
    }

    /// Replaces both base and current endpoints.
    pub fn set_endpoints(&self, endpoints: Endpoints) {
        let mut inner = self.inner.write();
        inner.base = endpoints.clone();
        inner.current = endpoints;
    }

    /// Replaces the current endpoints only, keeping the base.
    pub fn set_current_endpoints(&self, endpoints: Endpoints) {
        self.inner.write().current = endpoints;
    }

    /// Latest snapshot, if any refresh has succeeded.
    pub fn snapshot(&self) -> Option<Arc<RouteSnapshot>> {
        self.inner.read().snapshot.clone()
    }

    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    /// Publishes a new snapshot, replacing the previous one whole.
    pub fn commit(&self, plan: RoutePlan) -> Arc<RouteSnapshot> {
        let mut inner = self.inner.write();
        inner.revision += 1;

        let region = MapRegion::framing(&plan.endpoints.start.position, &plan.endpoints.end.position);
        let snapshot = Arc::new(RouteSnapshot {
            id: Uuid::new_v4(),
            revision: inner.revision,
            fetched_at: Utc::now(),
            distance_meters: plan.route.total_distance_meters(),
            endpoints: plan.endpoints,
            route: plan.route,
            arrows: plan.arrows,
            service_distance_meters: plan.service_distance_meters,
            duration_seconds: plan.duration_seconds,
            region,
        });

        inner.snapshot = Some(snapshot.clone());
        snapshot
    }
}
