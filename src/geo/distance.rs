//! Haversine great-circle distance on a spherical earth.

use crate::geo::coordinate::Coordinate;

/// Mean earth radius used for distance estimation, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in meters.
///
/// Spherical approximation; error against the WGS84 ellipsoid stays around
/// 0.3%, which is fine for urban and inter-city routes.
///
/// # Example
///
/// ```rust
/// use routemark::geo::{distance_meters, Coordinate};
///
/// let delhi = Coordinate::new(28.6139, 77.2090);
/// let gurugram = Coordinate::new(28.4595, 77.0266);
/// let d = distance_meters(&delhi, &gurugram);
/// assert!(d > 24_000.0 && d < 26_000.0);
/// ```
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let sin_d_lat = (d_lat / 2.0).sin();
    let sin_d_lon = (d_lon / 2.0).sin();

    // Rounding can push x just past 1 for near-antipodal points
    let x = (sin_d_lat * sin_d_lat + lat1.cos() * lat2.cos() * sin_d_lon * sin_d_lon)
        .clamp(0.0, 1.0);
    let c = 2.0 * x.sqrt().atan2((1.0 - x).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}
