//! Hybrid road/timetable routing: discover transit access nodes near the
//! road endpoints, bridge them with bounded road sub-paths and a connection
//! scan, and keep whichever composition beats the road-only fallback.

use hashbrown::HashMap;
use itertools::iproduct;
use log::debug;

use crate::model::graph::{Graph, ModeSet, Node, Spatial, TransportMode};
use crate::model::timetable::{Stop, Timetable};
use crate::routing::csa::{ConnectionScan, ScanSource};
use crate::routing::dijkstra::{AbortAfterModule, ModularDijkstra, MultiModalModule};
use crate::routing::landmarks::LandmarkMetric;
use crate::routing::metric::TravelTimeMetric;
use crate::routing::path::{EdgePath, Path, RoutePath, TripletonPath};
use crate::spatial::CoverTree;
use crate::{Error, NodeId, StopId, Time};

/// Strategy picking candidate access stops around a road location.
pub trait AccessNodeComputation {
    fn access_stops<'t>(
        &self,
        stops: &'t CoverTree<Stop, TravelTimeMetric>,
        origin: &Stop,
    ) -> Vec<&'t Stop>;
}

/// The `k` stops closest to the origin.
#[derive(Debug, Clone, Copy)]
pub struct KNearestTransitAccess {
    pub count: usize,
}

impl AccessNodeComputation for KNearestTransitAccess {
    fn access_stops<'t>(
        &self,
        stops: &'t CoverTree<Stop, TravelTimeMetric>,
        origin: &Stop,
    ) -> Vec<&'t Stop> {
        stops.k_nearest_neighbors(origin, self.count)
    }
}

/// All stops within a perimeter, expressed in the crow-flies travel-time
/// metric (seconds at maximal road speed).
#[derive(Debug, Clone, Copy)]
pub struct PerimeterTransitAccess {
    pub radius: f64,
}

impl AccessNodeComputation for PerimeterTransitAccess {
    fn access_stops<'t>(
        &self,
        stops: &'t CoverTree<Stop, TravelTimeMetric>,
        origin: &Stop,
    ) -> Vec<&'t Stop> {
        stops.neighborhood(origin, self.radius)
    }
}

/// Precomputed spatial access structures: a cover tree over the stops and
/// each stop's nearest road-graph representative. Built once per graph and
/// timetable, before query serving starts.
pub struct TransitAccessIndex {
    stops: CoverTree<Stop, TravelTimeMetric>,
    stop_roads: HashMap<StopId, NodeId>,
}

impl TransitAccessIndex {
    pub fn build(graph: &Graph, timetable: &Timetable) -> Self {
        let mut stops = CoverTree::new(TravelTimeMetric);
        for stop in timetable.stops() {
            stops.insert(stop.clone());
        }
        let mut roads = CoverTree::new(TravelTimeMetric);
        for node in graph.nodes() {
            roads.insert(*node);
        }
        let stop_roads = timetable
            .stops()
            .filter_map(|stop| {
                let probe = Node::road(NodeId::MAX, stop.latitude(), stop.longitude());
                roads
                    .nearest_neighbor(&probe)
                    .map(|node| (stop.id(), node.id()))
            })
            .collect();
        Self { stops, stop_roads }
    }

    /// The road node standing in for a stop, if the graph has any nodes.
    pub fn road_representative(&self, stop: StopId) -> Option<NodeId> {
        self.stop_roads.get(&stop).copied()
    }
}

/// One-query combinator over borrowed, read-only structures.
pub struct HybridRoadTimetable<'a> {
    graph: &'a Graph,
    timetable: &'a Timetable,
    index: &'a TransitAccessIndex,
    access: &'a dyn AccessNodeComputation,
    /// Bound in seconds on the road sub-path searches to and from access
    /// nodes.
    access_search_bound: f64,
    heuristic: Option<&'a LandmarkMetric>,
}

impl<'a> HybridRoadTimetable<'a> {
    pub fn new(
        graph: &'a Graph,
        timetable: &'a Timetable,
        index: &'a TransitAccessIndex,
        access: &'a dyn AccessNodeComputation,
        access_search_bound: f64,
    ) -> Self {
        Self { graph, timetable, index, access, access_search_bound, heuristic: None }
    }

    pub fn with_heuristic(mut self, metric: &'a LandmarkMetric) -> Self {
        self.heuristic = Some(metric);
        self
    }

    /// Cheapest journey from any source to the destination, leaving at
    /// `departure` (seconds since midnight). Without the tram mode this is
    /// exactly the road-only result.
    pub fn shortest_path(
        &self,
        sources: &[NodeId],
        destination: NodeId,
        modes: ModeSet,
        departure: Time,
    ) -> Result<Option<RoutePath>, Error> {
        let fallback = self.road_engine(modes).shortest_path(sources, destination)?;
        if !modes.contains(TransportMode::Tram) {
            return Ok(fallback.map(RoutePath::Road));
        }

        let boarding = self.boarding_paths(sources, modes)?;
        let alighting = self.alighting_paths(destination, modes)?;
        if boarding.is_empty() || alighting.is_empty() {
            debug!("no reachable access nodes, falling back to the road path");
            return Ok(fallback.map(RoutePath::Road));
        }

        let scan = ConnectionScan::new(self.timetable);
        let mut best: Option<TripletonPath> = None;
        for ((&enter, enter_path), (&exit, exit_path)) in iproduct!(&boarding, &alighting) {
            if enter == exit {
                continue;
            }
            let stop = self.timetable.stop(enter).ok_or(Error::UnknownStop(enter))?;
            let boarding_time = departure + enter_path.cost().ceil() as Time;
            let query =
                Node::transit(enter, stop.latitude(), stop.longitude(), boarding_time);
            let Some(journey) = scan.journey(&[ScanSource::from_node(&query)?], exit)? else {
                continue;
            };
            let candidate =
                TripletonPath::new(enter_path.clone(), journey, exit_path.clone());
            if best
                .as_ref()
                .is_none_or(|known| candidate.cost() < known.cost())
            {
                best = Some(candidate);
            }
        }

        Ok(match (best, fallback) {
            (Some(hybrid), Some(road)) if road.cost() <= hybrid.cost() => {
                Some(RoutePath::Road(road))
            }
            (Some(hybrid), _) => Some(RoutePath::Hybrid(hybrid)),
            (None, road) => road.map(RoutePath::Road),
        })
    }

    fn road_engine(&self, modes: ModeSet) -> ModularDijkstra<'a> {
        let engine = ModularDijkstra::new(self.graph).with_module(MultiModalModule::new(modes));
        match self.heuristic {
            Some(metric) => engine.with_module(metric),
            None => engine,
        }
    }

    fn bounded_engine(&self, modes: ModeSet) -> ModularDijkstra<'a> {
        self.road_engine(modes)
            .with_module(AbortAfterModule::new(self.access_search_bound))
    }

    /// Cheapest bounded sub-path per access stop across all sources.
    fn boarding_paths(
        &self,
        sources: &[NodeId],
        modes: ModeSet,
    ) -> Result<HashMap<StopId, EdgePath>, Error> {
        let mut best: HashMap<StopId, EdgePath> = HashMap::new();
        for &source in sources {
            let node = self.graph.node(source).ok_or(Error::MissingNode(source))?;
            let probe = Stop::new(StopId::MAX, node.latitude(), node.longitude());
            for stop in self.access.access_stops(&self.index.stops, &probe) {
                let Some(road) = self.index.road_representative(stop.id()) else {
                    continue;
                };
                if let Some(path) = self.bounded_engine(modes).shortest_path(&[source], road)?
                    && best
                        .get(&stop.id())
                        .is_none_or(|known| path.cost() < known.cost())
                {
                    best.insert(stop.id(), path);
                }
            }
        }
        Ok(best)
    }

    fn alighting_paths(
        &self,
        destination: NodeId,
        modes: ModeSet,
    ) -> Result<HashMap<StopId, EdgePath>, Error> {
        let node = self
            .graph
            .node(destination)
            .ok_or(Error::MissingNode(destination))?;
        let probe = Stop::new(StopId::MAX, node.latitude(), node.longitude());
        let mut best = HashMap::new();
        for stop in self.access.access_stops(&self.index.stops, &probe) {
            let Some(road) = self.index.road_representative(stop.id()) else {
                continue;
            };
            if let Some(path) = self.bounded_engine(modes).shortest_path(&[road], destination)? {
                best.insert(stop.id(), path);
            }
        }
        Ok(best)
    }
}
