//! Events published by the refresh service and forwarded to API clients.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTrigger {
    /// Periodic timer tick (including the initial one).
    Timer,
    /// Explicit refresh request.
    Manual,
    /// Start or end point changed.
    Endpoints,
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTrigger::Timer => write!(f, "timer"),
            RefreshTrigger::Manual => write!(f, "manual"),
            RefreshTrigger::Endpoints => write!(f, "endpoints"),
        }
    }
}

/// Who moved the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointSource {
    Api,
    Jitter,
}

/// Route events that can be broadcast to connected clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RouteEvent {
    /// A new snapshot was published
    RouteUpdated {
        revision: u64,
        trigger: RefreshTrigger,
        point_count: usize,
        arrow_count: usize,
        distance_meters: f64,
    },

    /// Start/end points moved
    EndpointsChanged {
        start: Coordinate,
        end: Coordinate,
        source: EndpointSource,
    },

    /// A refresh failed; the previous snapshot is still current
    RefreshFailed {
        trigger: RefreshTrigger,
        message: String,
    },

    /// Connection established (sent to new clients)
    Connected {
        client_id: u64,
        server_version: String,
    },

    /// Ping for keepalive
    Ping {
        timestamp: u64,
    },

    /// Pong response
    Pong {
        timestamp: u64,
    },
}

impl RouteEvent {
    /// Name used for subscription filtering.
    pub fn type_name(&self) -> &'static str {
        match self {
            RouteEvent::RouteUpdated { .. } => "RouteUpdated",
            RouteEvent::EndpointsChanged { .. } => "EndpointsChanged",
            RouteEvent::RefreshFailed { .. } => "RefreshFailed",
            RouteEvent::Connected { .. } => "Connected",
            RouteEvent::Ping { .. } => "Ping",
            RouteEvent::Pong { .. } => "Pong",
        }
    }
}
