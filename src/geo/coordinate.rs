//! Coordinate and route value types.
//!
//! A [`Route`] is an ordered polyline as returned by the routing service;
//! point order is travel order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::distance::distance_meters;

/// Errors raised when validating caller-supplied coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude outside [-90, 90] or not a finite number.
    #[error("Latitude {0} is out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180] or not a finite number.
    #[error("Longitude {0} is out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate. No range check is performed.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that both components are finite and within their valid range.
    ///
    /// # Example
    ///
    /// ```rust
    /// use routemark::geo::Coordinate;
    ///
    /// assert!(Coordinate::new(28.6139, 77.2090).validate().is_ok());
    /// assert!(Coordinate::new(91.0, 0.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Plain average of two coordinates.
    ///
    /// This is not a geodesic midpoint; at segment lengths typical of a
    /// routing polyline the difference is invisible.
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate {
            latitude: (self.latitude + other.latitude) / 2.0,
            longitude: (self.longitude + other.longitude) / 2.0,
        }
    }

    /// Returns a copy shifted by the given deltas in degrees.
    pub fn offset(&self, d_lat: f64, d_lon: f64) -> Coordinate {
        Coordinate {
            latitude: self.latitude + d_lat,
            longitude: self.longitude + d_lon,
        }
    }

    /// Great-circle distance to another coordinate in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance_meters(self, other)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// An ordered sequence of coordinates describing a path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    points: Vec<Coordinate>,
}

impl Route {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Coordinate> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.points.last()
    }

    /// Iterates consecutive point pairs in travel order.
    pub fn segments(&self) -> impl Iterator<Item = (&Coordinate, &Coordinate)> {
        self.points.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Sum of all segment lengths in meters.
    pub fn total_distance_meters(&self) -> f64 {
        self.segments().map(|(a, b)| distance_meters(a, b)).sum()
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }
}

impl From<Vec<Coordinate>> for Route {
    fn from(points: Vec<Coordinate>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Coordinate> for Route {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
