//! Heading estimation for direction glyphs.
//!
//! Headings are computed on the raw latitude/longitude plane, not as true
//! geodesic bearings. The value only drives the on-screen rotation of an
//! arrow glyph, so the planar approximation is good enough at city scale.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::geo::coordinate::{Coordinate, Route};

/// Conversion applied to the raw `atan2` angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingScale {
    /// Standard radians-to-degrees conversion (180/π).
    #[default]
    Degrees,
    /// Doubled scale (360/π) matching the historical web client output.
    Legacy,
}

impl HeadingScale {
    /// Multiplier applied to an angle in radians.
    pub fn factor(&self) -> f64 {
        match self {
            HeadingScale::Degrees => 180.0 / PI,
            HeadingScale::Legacy => 360.0 / PI,
        }
    }
}

impl std::fmt::Display for HeadingScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadingScale::Degrees => write!(f, "degrees"),
            HeadingScale::Legacy => write!(f, "legacy"),
        }
    }
}

impl std::str::FromStr for HeadingScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degrees" | "deg" => Ok(HeadingScale::Degrees),
            "legacy" => Ok(HeadingScale::Legacy),
            _ => Err(format!(
                "Unknown heading scale: {}. Valid scales are: degrees, legacy",
                s
            )),
        }
    }
}

/// Planar angle from `from` to `to`: `atan2(Δlatitude, Δlongitude)` scaled.
///
/// Due east is 0, due north is +90 (in [`HeadingScale::Degrees`]).
pub fn planar_angle(from: &Coordinate, to: &Coordinate, scale: HeadingScale) -> f64 {
    let d_lat = to.latitude - from.latitude;
    let d_lon = to.longitude - from.longitude;
    d_lat.atan2(d_lon) * scale.factor()
}

/// Heading at route point `index` using the standard degree scale.
///
/// See [`heading_with_scale`].
pub fn heading(route: &Route, index: usize) -> Option<f64> {
    heading_with_scale(route, index, HeadingScale::Degrees)
}

/// Heading at route point `index`.
///
/// - index 0: direction from point 0 to point 1
/// - last index: direction from the second-to-last to the last point
/// - otherwise: direction from point `index - 1` to point `index`
///
/// Returns `None` for routes shorter than two points or an index past the end.
pub fn heading_with_scale(route: &Route, index: usize, scale: HeadingScale) -> Option<f64> {
    let points = route.points();
    let len = points.len();

    if len < 2 || index >= len {
        return None;
    }

    let (from, to) = match index {
        0 => (&points[0], &points[1]),
        i if i == len - 1 => (&points[len - 2], &points[len - 1]),
        i => (&points[i - 1], &points[i]),
    };

    Some(planar_angle(from, to, scale))
}
