use geo::Point;
use serde::{Deserialize, Serialize};

use crate::model::graph::Spatial;
use crate::{StopId, Time, TripId};

/// A transit stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    id: StopId,
    name: Option<String>,
    geometry: Point<f64>,
}

impl Stop {
    pub fn new(id: StopId, latitude: f64, longitude: f64) -> Self {
        Self { id, name: None, geometry: Point::new(longitude, latitude) }
    }

    pub fn named(id: StopId, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { id, name: Some(name.into()), geometry: Point::new(longitude, latitude) }
    }

    pub fn id(&self) -> StopId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Spatial for Stop {
    fn position(&self) -> Point<f64> {
        self.geometry
    }
}

/// One scheduled vehicle hop between two stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub departure_stop: StopId,
    pub arrival_stop: StopId,
    /// Seconds since midnight. May exceed one day for trips that run past
    /// midnight.
    pub departure_time: Time,
    pub arrival_time: Time,
    pub trip: TripId,
    /// Position of this hop within its trip.
    pub sequence: usize,
}

/// A trip's hops, as indices into the timetable's sorted connection list,
/// ordered by sequence. Rebuilt whenever connections are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trip {
    pub(crate) connections: Vec<usize>,
}

impl Trip {
    /// Indices into the timetable's connection list, in sequence order.
    pub fn connections(&self) -> &[usize] {
        &self.connections
    }
}

/// A directed walking link between two stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footpath {
    pub departure_stop: StopId,
    pub arrival_stop: StopId,
    /// Walking duration in seconds, including the transfer delay.
    pub duration: Time,
}

impl Footpath {
    pub fn new(departure_stop: StopId, arrival_stop: StopId, duration: Time) -> Self {
        Self { departure_stop, arrival_stop, duration }
    }
}
