//! Distance-based arrow placement along a route.
//!
//! The planner walks the route segment by segment, summing haversine
//! lengths. Each time the running total reaches the spacing it drops an
//! arrow at the midpoint of the segment that crossed the threshold and starts
//! counting again from zero. A final arrow always marks the last point.
//!
//! Arrows are placed at segment midpoints rather than at the exact distance
//! along the path, so actual spacing drifts by up to half a segment.

use serde::{Deserialize, Serialize};

use crate::geo::bearing::{heading_with_scale, HeadingScale};
use crate::geo::coordinate::{Coordinate, Route};
use crate::geo::distance::distance_meters;

/// Default real-world distance between consecutive arrows, in meters.
pub const DEFAULT_SPACING_METERS: f64 = 2500.0;

/// Default latitude nudge applied to every arrow, in degrees.
pub const DEFAULT_ARROW_LAT_OFFSET: f64 = 0.0001;

/// A direction glyph placed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowMarker {
    /// Glyph position, already shifted by the planner's latitude offset.
    pub position: Coordinate,
    /// Rotation to apply to the glyph so it points along the route.
    pub heading_degrees: f64,
}

/// Arrow placement options.
///
/// # Example
///
/// ```rust
/// use routemark::geo::{ArrowPlanner, Coordinate, HeadingScale, Route};
///
/// let planner = ArrowPlanner::new(1000.0)
///     .with_lat_offset(0.0)
///     .with_heading_scale(HeadingScale::Degrees);
///
/// let route = Route::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.05)]);
/// let arrows = planner.plan(&route);
/// assert_eq!(arrows.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowPlanner {
    /// Distance between arrows in meters.
    pub spacing_meters: f64,
    /// Constant added to each arrow latitude so the glyph sits beside the line.
    pub lat_offset_degrees: f64,
    /// Angle conversion used for headings.
    pub heading_scale: HeadingScale,
}

impl Default for ArrowPlanner {
    fn default() -> Self {
        Self {
            spacing_meters: DEFAULT_SPACING_METERS,
            lat_offset_degrees: DEFAULT_ARROW_LAT_OFFSET,
            heading_scale: HeadingScale::default(),
        }
    }
}

impl ArrowPlanner {
    /// Creates a planner with the given spacing and default offset/scale.
    pub fn new(spacing_meters: f64) -> Self {
        Self {
            spacing_meters,
            ..Self::default()
        }
    }

    /// Sets the latitude offset in degrees.
    pub fn with_lat_offset(mut self, lat_offset_degrees: f64) -> Self {
        self.lat_offset_degrees = lat_offset_degrees;
        self
    }

    /// Sets the heading scale.
    pub fn with_heading_scale(mut self, heading_scale: HeadingScale) -> Self {
        self.heading_scale = heading_scale;
        self
    }

    /// Plans arrows for a route.
    ///
    /// Returns an empty Vec for routes with fewer than two points. Otherwise
    /// the result holds at least the final arrow.
    pub fn plan(&self, route: &Route) -> Vec<ArrowMarker> {
        let points = route.points();
        if points.len() < 2 {
            return Vec::new();
        }

        let mut arrows = Vec::new();
        let mut accumulated = 0.0;

        for (i, pair) in points.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            accumulated += distance_meters(from, to);

            if accumulated >= self.spacing_meters {
                // segment i ends at point i + 1
                arrows.push(self.marker(from.midpoint(to), route, i + 1));
                accumulated = 0.0;
            }
        }

        let last_index = points.len() - 1;
        arrows.push(self.marker(points[last_index], route, last_index));

        arrows
    }

    fn marker(&self, at: Coordinate, route: &Route, index: usize) -> ArrowMarker {
        ArrowMarker {
            position: at.offset(self.lat_offset_degrees, 0.0),
            heading_degrees: heading_with_scale(route, index, self.heading_scale).unwrap_or(0.0),
        }
    }
}

/// Plans arrows with the given spacing and default offset and heading scale.
pub fn plan_arrows(route: &Route, spacing_meters: f64) -> Vec<ArrowMarker> {
    ArrowPlanner::new(spacing_meters).plan(route)
}
