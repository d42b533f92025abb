use serde::{Deserialize, Serialize};

use crate::Time;

/// How landmarks are picked for the ALT heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkStrategy {
    Random,
    GreedyFarthest,
}

/// How candidate access stops are found around a road location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStrategy {
    KNearest { count: usize },
    /// Radius in the crow-flies travel-time metric, seconds.
    Perimeter { radius: f64 },
}

/// Tunables for building a query session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Minimum transfer time at a stop, seconds.
    pub transfer_delay: Time,
    /// Stops within this many metres of each other get synthetic footpaths.
    pub footpath_radius: f64,
    /// Zero disables the ALT heuristic.
    pub landmark_count: usize,
    pub landmark_strategy: LandmarkStrategy,
    pub landmark_seed: u64,
    pub access_strategy: AccessStrategy,
    /// Bound in seconds on the road searches to and from access nodes.
    pub access_search_bound: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            transfer_delay: 60,
            footpath_radius: 500.0,
            landmark_count: 0,
            landmark_strategy: LandmarkStrategy::Random,
            landmark_seed: 0,
            access_strategy: AccessStrategy::KNearest { count: 3 },
            access_search_bound: 1_800.0,
        }
    }
}
