//! Random endpoint perturbation.
//!
//! Each component is shifted by `(u - 0.5) * span` with `u` uniform in
//! [0, 1), so a span of 0.01 moves a point by at most ±0.005 degrees.
//! Perturbation is always applied to the base position, never accumulated.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::Coordinate;
use crate::refresh::state::Endpoints;

/// Uniform jitter around a base coordinate.
#[derive(Debug, Clone)]
pub struct EndpointJitter {
    span_degrees: f64,
    rng: StdRng,
}

impl EndpointJitter {
    /// Creates a jitter source seeded from OS entropy.
    pub fn new(span_degrees: f64) -> Self {
        Self {
            span_degrees,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a deterministic jitter source.
    pub fn seeded(span_degrees: f64, seed: u64) -> Self {
        Self {
            span_degrees,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn span_degrees(&self) -> f64 {
        self.span_degrees
    }

    /// Returns `base` shifted by an independent random offset per component.
    pub fn perturb(&mut self, base: &Coordinate) -> Coordinate {
        let d_lat = (self.rng.gen::<f64>() - 0.5) * self.span_degrees;
        let d_lon = (self.rng.gen::<f64>() - 0.5) * self.span_degrees;
        base.offset(d_lat, d_lon)
    }

    /// Perturbs both endpoints independently, keeping labels.
    pub fn perturb_endpoints(&mut self, base: &Endpoints) -> Endpoints {
        let start = self.perturb(&base.start.position);
        let end = self.perturb(&base.end.position);
        base.moved_to(start, end)
    }
}
