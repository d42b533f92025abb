use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::NodeId;
use crate::units;

use super::node::Node;

/// Means of travel supported by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    Car,
    Bike,
    Foot,
    Tram,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] =
        [TransportMode::Car, TransportMode::Bike, TransportMode::Foot, TransportMode::Tram];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Compact set of transportation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeSet(u8);

impl ModeSet {
    pub const EMPTY: ModeSet = ModeSet(0);

    /// All modes available on a road network: car, bike and foot.
    pub fn road() -> Self {
        Self::of(&[TransportMode::Car, TransportMode::Bike, TransportMode::Foot])
    }

    pub fn all() -> Self {
        Self::of(&TransportMode::ALL)
    }

    pub fn of(modes: &[TransportMode]) -> Self {
        let mut set = Self::EMPTY;
        for &mode in modes {
            set.insert(mode);
        }
        set
    }

    pub fn insert(&mut self, mode: TransportMode) {
        self.0 |= mode.bit();
    }

    pub fn contains(&self, mode: TransportMode) -> bool {
        self.0 & mode.bit() != 0
    }

    pub fn intersects(&self, other: ModeSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = TransportMode> + '_ {
        TransportMode::ALL.into_iter().filter(|mode| self.contains(*mode))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Road category, with the average speed driven on it in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighwayType {
    Cycleway,
    LivingStreet,
    Motorway,
    MotorwayLink,
    Primary,
    PrimaryLink,
    Residential,
    Road,
    Secondary,
    SecondaryLink,
    Service,
    Tertiary,
    Trunk,
    TrunkLink,
    Unclassified,
    Unsurfaced,
}

impl HighwayType {
    pub fn average_speed(self) -> u32 {
        match self {
            Self::Cycleway => 14,
            Self::LivingStreet => 7,
            Self::Motorway => 120,
            Self::MotorwayLink => 50,
            Self::Primary => 100,
            Self::PrimaryLink => 50,
            Self::Residential => 50,
            Self::Road => 20,
            Self::Secondary => 80,
            Self::SecondaryLink => 50,
            Self::Service => 7,
            Self::Tertiary => 70,
            Self::Trunk => 110,
            Self::TrunkLink => 50,
            Self::Unclassified => 40,
            Self::Unsurfaced => 30,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "cycleway" => Self::Cycleway,
            "living_street" => Self::LivingStreet,
            "motorway" => Self::Motorway,
            "motorway_link" => Self::MotorwayLink,
            "primary" => Self::Primary,
            "primary_link" => Self::PrimaryLink,
            "residential" => Self::Residential,
            "road" => Self::Road,
            "secondary" => Self::Secondary,
            "secondary_link" => Self::SecondaryLink,
            "service" => Self::Service,
            "tertiary" => Self::Tertiary,
            "trunk" => Self::Trunk,
            "trunk_link" => Self::TrunkLink,
            "unclassified" => Self::Unclassified,
            "unsurfaced" => Self::Unsurfaced,
            _ => return None,
        })
    }

    /// Modes allowed on this road category.
    pub fn modes(self) -> ModeSet {
        match self {
            Self::Motorway | Self::MotorwayLink => ModeSet::of(&[TransportMode::Car]),
            Self::Cycleway => ModeSet::of(&[TransportMode::Bike]),
            _ => ModeSet::road(),
        }
    }
}

/// What an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// A road segment. Costs derive from the highway type, the tagged
    /// maximum speed and the endpoint coordinates.
    Road { highway: Option<HighwayType>, max_speed: Option<u32> },
    /// One scheduled vehicle hop, synthesized during journey reconstruction.
    Transit,
    /// A walking link between stops, synthesized during reconstruction.
    Footpath,
    /// A zero-cost edge stitching two graphs together.
    Link,
}

/// Identifier shared by all link edges.
pub const LINK_EDGE_ID: u32 = u32::MAX;

const MODE_COUNT: usize = TransportMode::ALL.len();

/// A directed edge. The id is unique within the way or trip the edge belongs
/// to, not globally; equality and hashing use id, endpoints and kind so that
/// costs may be recomputed without changing an edge's identity.
#[derive(Debug, Clone)]
pub struct Edge {
    id: u32,
    source: NodeId,
    destination: NodeId,
    kind: EdgeKind,
    modes: ModeSet,
    /// Travel time per mode in seconds, infinite for unsupported modes.
    costs: [f64; MODE_COUNT],
    /// Travel time of the fastest supported mode in seconds.
    cost: f64,
}

impl Edge {
    /// A road edge. Built incomplete: costs stay infinite until
    /// [`Edge::update_cost`] runs with known endpoint coordinates.
    pub fn road(
        id: u32,
        source: NodeId,
        destination: NodeId,
        highway: Option<HighwayType>,
        max_speed: Option<u32>,
    ) -> Self {
        let modes = highway.map_or_else(ModeSet::road, HighwayType::modes);
        Self {
            id,
            source,
            destination,
            kind: EdgeKind::Road { highway, max_speed },
            modes,
            costs: [f64::INFINITY; MODE_COUNT],
            cost: f64::INFINITY,
        }
    }

    pub fn link(source: NodeId, destination: NodeId) -> Self {
        Self {
            id: LINK_EDGE_ID,
            source,
            destination,
            kind: EdgeKind::Link,
            modes: ModeSet::all(),
            costs: [0.0; MODE_COUNT],
            cost: 0.0,
        }
    }

    pub(crate) fn transit(source: NodeId, destination: NodeId, cost: f64) -> Self {
        Self::uniform(0, source, destination, EdgeKind::Transit, ModeSet::of(&[TransportMode::Tram]), cost)
    }

    pub(crate) fn footpath(source: NodeId, destination: NodeId, cost: f64) -> Self {
        Self::uniform(0, source, destination, EdgeKind::Footpath, ModeSet::of(&[TransportMode::Foot]), cost)
    }

    fn uniform(
        id: u32,
        source: NodeId,
        destination: NodeId,
        kind: EdgeKind,
        modes: ModeSet,
        cost: f64,
    ) -> Self {
        let mut costs = [f64::INFINITY; MODE_COUNT];
        for mode in modes.iter() {
            costs[mode as usize] = cost;
        }
        Self { id, source, destination, kind, modes, costs, cost }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Source as stored; the graph's accessors apply the orientation.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Destination as stored; the graph's accessors apply the orientation.
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn modes(&self) -> ModeSet {
        self.modes
    }

    pub fn has_mode(&self, mode: TransportMode) -> bool {
        self.modes.contains(mode)
    }

    /// Intrinsic cost in seconds: the travel time of the fastest mode.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Travel time for one mode, infinite if the mode is unsupported.
    pub fn cost_for(&self, mode: TransportMode) -> f64 {
        self.costs[mode as usize]
    }

    /// Recomputes road costs from the endpoint coordinates. Must be called
    /// again whenever the spatial data of an endpoint changes.
    pub fn update_cost(&mut self, source: &Node, destination: &Node) {
        let EdgeKind::Road { highway, max_speed } = self.kind else {
            return;
        };
        let distance = units::distance(source, destination);
        let mut fastest = f64::INFINITY;
        for mode in self.modes.iter() {
            let speed = units::speed_on_road(highway, max_speed, mode);
            let cost = units::travel_time(distance, speed);
            self.costs[mode as usize] = cost;
            fastest = fastest.min(cost);
        }
        self.cost = fastest;
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.source == other.source
            && self.destination == other.destination
            && self.kind == other.kind
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.source.hash(state);
        self.destination.hash(state);
        self.kind.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_sets() {
        let mut set = ModeSet::EMPTY;
        assert!(set.is_empty());
        set.insert(TransportMode::Bike);
        assert!(set.contains(TransportMode::Bike));
        assert!(!set.contains(TransportMode::Car));
        assert!(set.intersects(ModeSet::road()));
        assert!(!set.intersects(ModeSet::of(&[TransportMode::Tram])));
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn road_edge_cost_update() {
        let source = Node::road(0, 47.995, 7.85);
        // Roughly 1.1 km north
        let destination = Node::road(1, 48.005, 7.85);
        let mut edge = Edge::road(0, 0, 1, Some(HighwayType::Residential), None);
        assert!(edge.cost().is_infinite());

        edge.update_cost(&source, &destination);
        let car = edge.cost_for(TransportMode::Car);
        let foot = edge.cost_for(TransportMode::Foot);
        assert!(car.is_finite() && foot.is_finite());
        // Residential: 50 km/h by car, walking capped at 5 km/h
        assert!(foot > car * 9.0 && foot < car * 11.0);
        assert!((edge.cost() - car).abs() < f64::EPSILON);
    }

    #[test]
    fn equality_ignores_cost() {
        let a = Node::road(0, 48.0, 7.8);
        let b = Node::road(1, 48.1, 7.8);
        let mut first = Edge::road(4, 0, 1, Some(HighwayType::Primary), None);
        let second = first.clone();
        first.update_cost(&a, &b);
        assert_eq!(first, second);
    }

    #[test]
    fn motorways_are_car_only() {
        let edge = Edge::road(0, 0, 1, Some(HighwayType::Motorway), None);
        assert!(edge.has_mode(TransportMode::Car));
        assert!(!edge.has_mode(TransportMode::Foot));
    }
}
