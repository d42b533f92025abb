//! Conversions between distances, speeds, travel times and clock values.

use chrono::Timelike;
use geo::{Distance, Haversine};

use crate::Time;
use crate::model::graph::{HighwayType, Spatial, TransportMode};

/// Maximal walking speed in km/h.
pub const MAX_FOOT_SPEED: f64 = 5.0;
/// Maximal speed of a bike in km/h.
pub const MAX_BIKE_SPEED: f64 = 14.0;
/// The maximal possible speed on any road in km/h. Used by crow-flies
/// travel-time metrics, which must never overestimate.
pub const MAXIMAL_ROAD_SPEED: f64 = 200.0;

const MS_TO_KMH: f64 = 3.6;
const MPH_TO_KMH: f64 = 1.609_34;

/// Great-circle distance between two spatial objects, in metres.
pub fn distance(first: &impl Spatial, second: &impl Spatial) -> f64 {
    Haversine.distance(first.position(), second.position())
}

/// Time needed to travel `distance` metres at `speed` km/h, in seconds.
pub fn travel_time(distance: f64, speed: f64) -> f64 {
    distance / kmh_to_ms(speed)
}

pub fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / MS_TO_KMH
}

pub fn mph_to_kmh(mph: f64) -> f64 {
    mph * MPH_TO_KMH
}

/// Speed used on a road in km/h, given the optional highway type, the
/// optional tagged maximum speed and the transportation mode.
///
/// The tagged maximum takes precedence, then the highway type's average,
/// then the residential default. Bike and foot are capped at their own
/// maximal speeds regardless of the road.
pub fn speed_on_road(
    highway: Option<HighwayType>,
    max_speed: Option<u32>,
    mode: TransportMode,
) -> f64 {
    let road_speed = match (max_speed, highway) {
        (Some(tagged), _) => f64::from(tagged),
        (None, Some(kind)) => f64::from(kind.average_speed()),
        (None, None) => f64::from(HighwayType::Residential.average_speed()),
    };

    match mode {
        TransportMode::Bike => road_speed.min(MAX_BIKE_SPEED),
        TransportMode::Foot => road_speed.min(MAX_FOOT_SPEED),
        TransportMode::Car | TransportMode::Tram => road_speed,
    }
}

/// Converts an instant in milliseconds since the Unix epoch to seconds since
/// midnight (UTC) of the day it falls on.
pub fn seconds_since_midnight(millis_since_epoch: i64) -> Option<Time> {
    let instant = chrono::DateTime::from_timestamp_millis(millis_since_epoch)?;
    Some(instant.time().num_seconds_from_midnight())
}
