//! Assembles a query session: corrects the timetable, precomputes the
//! landmark tables and access-node index, and hands out wired engines.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::loading::config::{AccessStrategy, LandmarkStrategy, RoutingConfig};
use crate::model::graph::{Graph, ModeSet, TransportMode};
use crate::model::timetable::Timetable;
use crate::routing::csa::ConnectionScan;
use crate::routing::dijkstra::{ModularDijkstra, MultiModalModule};
use crate::routing::hybrid::{
    AccessNodeComputation, HybridRoadTimetable, KNearestTransitAccess, PerimeterTransitAccess,
    TransitAccessIndex,
};
use crate::routing::landmarks::{GreedyFarthestLandmarks, LandmarkMetric, RandomLandmarks};
use crate::routing::path::{Path, RoutePath};
use crate::{Error, NodeId, units};

/// Owns the finished graph and timetable plus everything precomputed from
/// them. Construction is the ingestion-to-serving handover; afterwards the
/// factory is read-only and its engines may run on parallel threads.
pub struct ComputationFactory {
    graph: Graph,
    timetable: Timetable,
    config: RoutingConfig,
    index: TransitAccessIndex,
    landmarks: Option<LandmarkMetric>,
    access: Box<dyn AccessNodeComputation + Send + Sync>,
}

impl ComputationFactory {
    pub fn new(
        mut graph: Graph,
        mut timetable: Timetable,
        config: RoutingConfig,
    ) -> Result<Self, Error> {
        timetable.correct_footpaths(config.transfer_delay, config.footpath_radius);

        let landmarks = if config.landmark_count > 0 {
            let mut rng = StdRng::seed_from_u64(config.landmark_seed);
            let metric = match config.landmark_strategy {
                LandmarkStrategy::Random => LandmarkMetric::precompute(
                    &mut graph,
                    &RandomLandmarks,
                    config.landmark_count,
                    &mut rng,
                )?,
                LandmarkStrategy::GreedyFarthest => LandmarkMetric::precompute(
                    &mut graph,
                    &GreedyFarthestLandmarks,
                    config.landmark_count,
                    &mut rng,
                )?,
            };
            Some(metric)
        } else {
            None
        };

        let index = TransitAccessIndex::build(&graph, &timetable);
        let access: Box<dyn AccessNodeComputation + Send + Sync> = match config.access_strategy {
            AccessStrategy::KNearest { count } => Box::new(KNearestTransitAccess { count }),
            AccessStrategy::Perimeter { radius } => Box::new(PerimeterTransitAccess { radius }),
        };

        Ok(Self { graph, timetable, config, index, landmarks, access })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    /// A road engine for the given modes, ALT-guided when landmarks were
    /// precomputed.
    pub fn dijkstra(&self, modes: ModeSet) -> ModularDijkstra<'_> {
        let engine =
            ModularDijkstra::new(&self.graph).with_module(MultiModalModule::new(modes));
        match &self.landmarks {
            Some(metric) => engine.with_module(metric),
            None => engine,
        }
    }

    pub fn connection_scan(&self) -> ConnectionScan<'_> {
        ConnectionScan::new(&self.timetable)
    }

    pub fn hybrid(&self) -> HybridRoadTimetable<'_> {
        let hybrid = HybridRoadTimetable::new(
            &self.graph,
            &self.timetable,
            &self.index,
            self.access.as_ref(),
            self.config.access_search_bound,
        );
        match &self.landmarks {
            Some(metric) => hybrid.with_heuristic(metric),
            None => hybrid,
        }
    }

    /// Multimodal query entry point. Transit queries need a departure
    /// instant in milliseconds since the Unix epoch; road-only queries
    /// ignore it.
    pub fn shortest_path(
        &self,
        sources: &[NodeId],
        destination: NodeId,
        modes: ModeSet,
        departure_millis: Option<i64>,
    ) -> Result<Option<RoutePath>, Error> {
        if !modes.contains(TransportMode::Tram) {
            return Ok(self
                .dijkstra(modes)
                .shortest_path(sources, destination)?
                .map(RoutePath::Road));
        }
        let millis = departure_millis.ok_or(Error::MissingDepartureTime)?;
        let departure = units::seconds_since_midnight(millis)
            .ok_or(Error::DepartureTimeOutOfRange(millis))?;
        self.hybrid().shortest_path(sources, destination, modes, departure)
    }

    pub fn shortest_path_cost(
        &self,
        sources: &[NodeId],
        destination: NodeId,
        modes: ModeSet,
        departure_millis: Option<i64>,
    ) -> Result<Option<f64>, Error> {
        Ok(self
            .shortest_path(sources, destination, modes, departure_millis)?
            .map(|path| path.cost()))
    }

    /// Batch road distances from the sources to everything reachable.
    pub fn reachable_costs(
        &self,
        sources: &[NodeId],
        modes: ModeSet,
    ) -> Result<hashbrown::HashMap<NodeId, f64>, Error> {
        self.dijkstra(modes).reachable_costs(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{Edge, HighwayType, Node};
    use crate::model::timetable::{Connection, Stop};

    fn world() -> (Graph, Timetable) {
        let mut graph = Graph::new();
        for id in 0..3 {
            graph.add_node(Node::road(id, 48.0 + id as f64 * 0.005, 7.8));
        }
        for (id, (a, b)) in [(0, 1), (1, 0), (1, 2), (2, 1)].into_iter().enumerate() {
            graph
                .add_edge(Edge::road(id as u32, a, b, Some(HighwayType::Residential), None))
                .unwrap();
        }
        graph.refresh_costs().unwrap();

        let mut timetable = Timetable::new();
        timetable.add_stop(Stop::new(0, 48.0, 7.8));
        timetable.add_stop(Stop::new(1, 48.01, 7.8));
        timetable
            .add_connections([Connection {
                departure_stop: 0,
                arrival_stop: 1,
                departure_time: 600,
                arrival_time: 900,
                trip: 0,
                sequence: 0,
            }])
            .unwrap();
        (graph, timetable)
    }

    #[test]
    fn road_queries_ignore_the_departure_instant() {
        let (graph, timetable) = world();
        let factory = ComputationFactory::new(graph, timetable, RoutingConfig::default()).unwrap();
        let path = factory
            .shortest_path(&[0], 2, ModeSet::road(), None)
            .unwrap()
            .unwrap();
        assert_eq!(path.destination(), 2);
    }

    #[test]
    fn transit_queries_require_a_departure_instant() {
        let (graph, timetable) = world();
        let factory = ComputationFactory::new(graph, timetable, RoutingConfig::default()).unwrap();
        assert!(matches!(
            factory.shortest_path(&[0], 2, ModeSet::all(), None),
            Err(Error::MissingDepartureTime)
        ));
        assert!(matches!(
            factory.shortest_path(&[0], 2, ModeSet::all(), Some(i64::MIN)),
            Err(Error::DepartureTimeOutOfRange(_))
        ));
        assert!(factory
            .shortest_path(&[0], 2, ModeSet::all(), Some(0))
            .unwrap()
            .is_some());
    }

    #[test]
    fn landmark_precompute_is_wired_into_the_engines() {
        let (graph, timetable) = world();
        let config = RoutingConfig {
            landmark_count: 2,
            landmark_strategy: LandmarkStrategy::GreedyFarthest,
            landmark_seed: 4,
            ..RoutingConfig::default()
        };
        let factory = ComputationFactory::new(graph, timetable, config).unwrap();
        let plain = ComputationFactory::new(world().0, world().1, RoutingConfig::default())
            .unwrap()
            .shortest_path_cost(&[0], 2, ModeSet::road(), None)
            .unwrap()
            .unwrap();
        let guided = factory
            .shortest_path_cost(&[0], 2, ModeSet::road(), None)
            .unwrap()
            .unwrap();
        assert!((plain - guided).abs() < 1e-9);
    }
}
