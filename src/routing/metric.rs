//! Distance metrics injected into the spatial index and the A* heuristic.

use crate::model::graph::Spatial;
use crate::units;

/// A non-negative, symmetric distance satisfying the triangle inequality.
pub trait Metric<P> {
    fn distance(&self, first: &P, second: &P) -> f64;
}

/// Optimistic travel time in seconds: great-circle distance covered at the
/// maximal road speed. Never overestimates real travel time, which makes it
/// admissible as an A* heuristic and usable for access-node lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct TravelTimeMetric;

impl<P: Spatial> Metric<P> for TravelTimeMetric {
    fn distance(&self, first: &P, second: &P) -> f64 {
        units::travel_time(units::distance(first, second), units::MAXIMAL_ROAD_SPEED)
    }
}
