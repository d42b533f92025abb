use geo::Point;

use crate::{NodeId, Time};

/// Anything with a position on the globe.
pub trait Spatial {
    fn position(&self) -> Point<f64>;

    fn latitude(&self) -> f64 {
        self.position().y()
    }

    fn longitude(&self) -> f64 {
        self.position().x()
    }
}

/// A graph node. Road nodes carry only an id and a position; transit query
/// nodes additionally carry a timestamp in seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    id: NodeId,
    geometry: Point<f64>,
    time: Option<Time>,
}

impl Node {
    pub fn road(id: NodeId, latitude: f64, longitude: f64) -> Self {
        Self { id, geometry: Point::new(longitude, latitude), time: None }
    }

    pub fn transit(id: NodeId, latitude: f64, longitude: f64, time: Time) -> Self {
        Self { id, geometry: Point::new(longitude, latitude), time: Some(time) }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Timestamp at this node in seconds since midnight, if it has one.
    pub fn time(&self) -> Option<Time> {
        self.time
    }

    pub(crate) fn set_position(&mut self, latitude: f64, longitude: f64) {
        self.geometry = Point::new(longitude, latitude);
    }
}

impl Spatial for Node {
    fn position(&self) -> Point<f64> {
        self.geometry
    }
}
