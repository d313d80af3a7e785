//! Mock route fetcher for testing.
//!
//! Serves scripted outcomes in order; once the script runs out it answers
//! with a straight line between the requested endpoints.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::geo::{Coordinate, Route};
use crate::routing::fetcher::{FetchedRoute, RouteError, RouteFetcher, RouteResult};

/// A scripted fetch result.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with the given route.
    Route(Route),
    /// Fail as if the service answered with this HTTP status.
    Status(u16),
    /// Fail as if the service found no route.
    NoRoute,
}

/// Mock implementation of [`RouteFetcher`].
pub struct MockRouteFetcher {
    script: Mutex<VecDeque<MockOutcome>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<(Coordinate, Coordinate)>>,
    line_points: usize,
}

impl Default for MockRouteFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRouteFetcher {
    /// Creates a mock that always answers with a 10-point straight line.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            line_points: 10,
        }
    }

    /// Creates a mock that plays the given outcomes in order.
    pub fn with_script(outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        let mock = Self::new();
        mock.script.lock().extend(outcomes);
        mock
    }

    /// Appends an outcome to the script.
    pub fn push(&self, outcome: MockOutcome) {
        self.script.lock().push_back(outcome);
    }

    /// Number of fetches performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Endpoints of the most recent fetch.
    pub fn last_request(&self) -> Option<(Coordinate, Coordinate)> {
        *self.last_request.lock()
    }

    fn straight_line(&self, start: Coordinate, end: Coordinate) -> Route {
        let steps = self.line_points.max(2) - 1;
        (0..=steps)
            .map(|i| {
                if i == steps {
                    return end;
                }
                let t = i as f64 / steps as f64;
                Coordinate::new(
                    start.latitude + (end.latitude - start.latitude) * t,
                    start.longitude + (end.longitude - start.longitude) * t,
                )
            })
            .collect()
    }
}

#[async_trait]
impl RouteFetcher for MockRouteFetcher {
    async fn fetch(&self, start: Coordinate, end: Coordinate) -> RouteResult<FetchedRoute> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some((start, end));

        let outcome = self.script.lock().pop_front();
        match outcome {
            Some(MockOutcome::Route(route)) if route.is_empty() => Err(RouteError::EmptyGeometry),
            Some(MockOutcome::Route(route)) => Ok(FetchedRoute::from_route(route)),
            Some(MockOutcome::Status(status)) => Err(RouteError::Status { status }),
            Some(MockOutcome::NoRoute) => Err(RouteError::NoRoute {
                code: "NoRoute".to_string(),
            }),
            None => Ok(FetchedRoute::from_route(self.straight_line(start, end))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
