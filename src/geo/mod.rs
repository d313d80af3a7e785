//! Geographic core for route annotation
//!
//! This module turns a raw route polyline into direction arrows. Everything in
//! here is synchronous and pure: no I/O, no shared state.
//!
//! # Submodules
//!
//! - [`coordinate`] - Coordinate and Route value types
//! - [`distance`] - Haversine great-circle distance
//! - [`bearing`] - Planar heading estimation for arrow glyphs
//! - [`arrows`] - Distance-based arrow placement along a route
//!
//! # Example
//!
//! ```rust
//! use routemark::geo::{plan_arrows, Coordinate, Route};
//!
//! let route = Route::new(vec![
//!     Coordinate::new(28.60, 77.20),
//!     Coordinate::new(28.61, 77.21),
//!     Coordinate::new(28.62, 77.22),
//! ]);
//!
//! let arrows = plan_arrows(&route, 2500.0);
//! assert!(!arrows.is_empty());
//! ```

pub mod arrows;
pub mod bearing;
pub mod coordinate;
pub mod distance;

// Re-export commonly used types for convenience
pub use arrows::{plan_arrows, ArrowMarker, ArrowPlanner, DEFAULT_ARROW_LAT_OFFSET, DEFAULT_SPACING_METERS};
pub use bearing::{heading, HeadingScale};
pub use coordinate::{Coordinate, CoordinateError, Route};
pub use distance::{distance_meters, EARTH_RADIUS_KM};
