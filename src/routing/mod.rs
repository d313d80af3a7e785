//! Route fetching from a driving-directions service.
//!
//! This module provides a trait-based abstraction over routing backends,
//! with an OSRM implementation for production use and a mock implementation
//! for testing.
//!
//! # Example
//!
//! ```rust,no_run
//! use routemark::geo::Coordinate;
//! use routemark::routing::{OsrmRouteFetcher, RouteFetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = OsrmRouteFetcher::new("https://router.project-osrm.org/route/v1/driving/")?;
//!     let fetched = fetcher
//!         .fetch(Coordinate::new(28.6139, 77.2090), Coordinate::new(28.4595, 77.0266))
//!         .await?;
//!     println!("{} points", fetched.route.len());
//!     Ok(())
//! }
//! ```

pub mod fetcher;
pub mod mock;
pub mod osrm;

pub use fetcher::{FetchedRoute, RouteError, RouteFetcher, RouteResult};
pub use mock::{MockOutcome, MockRouteFetcher};
pub use osrm::OsrmRouteFetcher;
