//! Modular shortest-path engine: classic Dijkstra relaxation with pluggable
//! modules for edge pricing, edge filtering, heuristics and early abort.

mod modules;

pub use modules::{AStarModule, AbortAfterModule, DijkstraModule, MultiModalModule};

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};

use crate::model::graph::{Edge, Graph};
use crate::routing::path::{EdgePath, PathEdge};
use crate::{Error, NodeId};

/// Frontier entry. Ordered by priority ascending so the max-heap pops the
/// most promising node first; ties broken by node id for determinism.
#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    priority: f64,
    cost: f64,
    node: NodeId,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Search {
    distances: HashMap<NodeId, f64>,
    parents: HashMap<NodeId, (Edge, f64)>,
    settled: HashSet<NodeId>,
}

impl Search {
    fn backtrack(&self, graph: &Graph, destination: NodeId) -> Option<EdgePath> {
        if !self.settled.contains(&destination) {
            return None;
        }
        let cost = *self.distances.get(&destination)?;
        let mut edges = Vec::new();
        let mut current = destination;
        while let Some((edge, incremental)) = self.parents.get(&current) {
            edges.push(PathEdge { edge: edge.clone(), cost: *incremental });
            current = graph.edge_source(edge);
        }
        edges.reverse();
        Some(EdgePath::from_parts(current, destination, cost, edges))
    }
}

/// Dijkstra/A* over a borrowed graph with an ordered module list. The engine
/// itself is stateless across queries; each call runs an independent search
/// and is safe to issue from parallel threads over the same graph.
pub struct ModularDijkstra<'g> {
    graph: &'g Graph,
    modules: Vec<Box<dyn DijkstraModule + 'g>>,
}

impl<'g> ModularDijkstra<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph, modules: Vec::new() }
    }

    pub fn with_module(mut self, module: impl DijkstraModule + 'g) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Cheapest path from the closest source to the destination, or `None`
    /// when the destination is unreachable.
    pub fn shortest_path(
        &self,
        sources: &[NodeId],
        destination: NodeId,
    ) -> Result<Option<EdgePath>, Error> {
        self.check_node(destination)?;
        let search = self.run(sources, Some(destination), true)?;
        Ok(search.backtrack(self.graph, destination))
    }

    pub fn shortest_path_cost(
        &self,
        sources: &[NodeId],
        destination: NodeId,
    ) -> Result<Option<f64>, Error> {
        self.check_node(destination)?;
        let search = self.run(sources, Some(destination), false)?;
        if !search.settled.contains(&destination) {
            return Ok(None);
        }
        Ok(search.distances.get(&destination).copied())
    }

    /// Final distances of every node settled from the sources. With no abort
    /// module this covers everything reachable; used in batch by landmark
    /// selection.
    pub fn reachable_costs(&self, sources: &[NodeId]) -> Result<HashMap<NodeId, f64>, Error> {
        let search = self.run(sources, None, false)?;
        Ok(search
            .settled
            .iter()
            .filter_map(|node| search.distances.get(node).map(|&cost| (*node, cost)))
            .collect())
    }

    fn check_node(&self, node: NodeId) -> Result<(), Error> {
        if self.graph.contains_node(node) {
            Ok(())
        } else {
            Err(Error::MissingNode(node))
        }
    }

    fn run(
        &self,
        sources: &[NodeId],
        destination: Option<NodeId>,
        track_parents: bool,
    ) -> Result<Search, Error> {
        let mut search = Search {
            distances: HashMap::new(),
            parents: HashMap::new(),
            settled: HashSet::new(),
        };
        let mut heap = BinaryHeap::new();
        for &source in sources {
            self.check_node(source)?;
            search.distances.insert(source, 0.0);
            heap.push(State { priority: self.heuristic(source, destination), cost: 0.0, node: source });
        }

        while let Some(State { cost, node, .. }) = heap.pop() {
            if !search.settled.insert(node) {
                continue;
            }
            if destination == Some(node) {
                break;
            }
            if self.modules.iter().any(|module| module.should_abort(cost)) {
                break;
            }

            for edge in self.graph.outgoing_edges(node) {
                if !self
                    .modules
                    .iter()
                    .all(|module| module.consider_edge(edge, destination))
                {
                    continue;
                }
                let neighbor = self.graph.edge_destination(edge);
                if search.settled.contains(&neighbor) {
                    continue;
                }
                let edge_cost = self
                    .modules
                    .iter()
                    .filter_map(|module| module.edge_cost(edge, cost))
                    .reduce(f64::max)
                    .unwrap_or_else(|| edge.cost());
                if !edge_cost.is_finite() {
                    continue;
                }
                let next = cost + edge_cost;
                if search.distances.get(&neighbor).is_none_or(|&known| next < known) {
                    search.distances.insert(neighbor, next);
                    if track_parents {
                        search.parents.insert(neighbor, (edge.clone(), edge_cost));
                    }
                    heap.push(State {
                        priority: next + self.heuristic(neighbor, destination),
                        cost: next,
                        node: neighbor,
                    });
                }
            }
        }

        Ok(search)
    }

    fn heuristic(&self, node: NodeId, destination: Option<NodeId>) -> f64 {
        let Some(destination) = destination else {
            return 0.0;
        };
        self.modules
            .iter()
            .filter_map(|module| module.estimated_distance(node, destination))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{HighwayType, ModeSet, Node, TransportMode};
    use crate::routing::metric::TravelTimeMetric;
    use crate::routing::path::Path;

    /// A chain 0-1-2-3 plus a slow detour 0-4-3.
    fn chain_with_detour() -> Graph {
        let mut graph = Graph::new();
        for id in 0..4 {
            graph.add_node(Node::road(id, 48.0 + id as f64 * 0.01, 7.8));
        }
        graph.add_node(Node::road(4, 48.015, 7.9));
        for (id, (a, b)) in [(0, 1), (1, 2), (2, 3)].into_iter().enumerate() {
            graph
                .add_edge(Edge::road(id as u32, a, b, Some(HighwayType::Secondary), None))
                .unwrap();
        }
        graph
            .add_edge(Edge::road(0, 0, 4, Some(HighwayType::Service), None))
            .unwrap();
        graph
            .add_edge(Edge::road(1, 4, 3, Some(HighwayType::Service), None))
            .unwrap();
        graph.refresh_costs().unwrap();
        graph
    }

    #[test]
    fn finds_the_cheap_chain() {
        let graph = chain_with_detour();
        let engine = ModularDijkstra::new(&graph);
        let path = engine.shortest_path(&[0], 3).unwrap().unwrap();
        assert_eq!(path.source(), 0);
        assert_eq!(path.destination(), 3);
        assert_eq!(path.len(), 3);

        let cost = engine.shortest_path_cost(&[0], 3).unwrap().unwrap();
        assert!((cost - path.cost()).abs() < 1e-9);
    }

    #[test]
    fn unreachable_is_none_not_an_error() {
        let mut graph = chain_with_detour();
        graph.add_node(Node::road(9, 50.0, 9.0));
        let engine = ModularDijkstra::new(&graph);
        assert!(engine.shortest_path(&[0], 9).unwrap().is_none());
        assert!(engine.shortest_path_cost(&[0], 9).unwrap().is_none());
    }

    #[test]
    fn missing_nodes_fail_loudly() {
        let graph = chain_with_detour();
        let engine = ModularDijkstra::new(&graph);
        assert!(matches!(engine.shortest_path(&[77], 3), Err(Error::MissingNode(77))));
        assert!(matches!(engine.shortest_path(&[0], 77), Err(Error::MissingNode(77))));
    }

    #[test]
    fn multi_source_takes_the_closest_seed() {
        let graph = chain_with_detour();
        let engine = ModularDijkstra::new(&graph);
        let from_both = engine.shortest_path_cost(&[0, 2], 3).unwrap().unwrap();
        let from_two = engine.shortest_path_cost(&[2], 3).unwrap().unwrap();
        assert!((from_both - from_two).abs() < 1e-9);
    }

    #[test]
    fn abort_module_bounds_the_search() {
        let graph = chain_with_detour();
        let all = ModularDijkstra::new(&graph).reachable_costs(&[0]).unwrap();
        assert_eq!(all.len(), 5);

        let hop = ModularDijkstra::new(&graph)
            .shortest_path_cost(&[0], 1)
            .unwrap()
            .unwrap();
        let bounded = ModularDijkstra::new(&graph)
            .with_module(AbortAfterModule::new(hop))
            .reachable_costs(&[0])
            .unwrap();
        assert!(bounded.len() < all.len());
        assert!(bounded.contains_key(&1));
    }

    #[test]
    fn mode_filter_changes_route_and_price() {
        // A foot query must pay walking prices even on fast roads.
        let graph = chain_with_detour();
        let car = ModularDijkstra::new(&graph)
            .with_module(MultiModalModule::new(ModeSet::of(&[TransportMode::Car])))
            .shortest_path_cost(&[0], 3)
            .unwrap()
            .unwrap();
        let foot = ModularDijkstra::new(&graph)
            .with_module(MultiModalModule::new(ModeSet::of(&[TransportMode::Foot])))
            .shortest_path_cost(&[0], 3)
            .unwrap()
            .unwrap();
        assert!(foot > car);
    }

    #[test]
    fn crow_flies_astar_agrees_with_plain_dijkstra() {
        let graph = chain_with_detour();
        let plain = ModularDijkstra::new(&graph)
            .shortest_path_cost(&[0], 3)
            .unwrap()
            .unwrap();
        let astar = ModularDijkstra::new(&graph)
            .with_module(AStarModule::new(&graph, TravelTimeMetric))
            .shortest_path_cost(&[0], 3)
            .unwrap()
            .unwrap();
        assert!((plain - astar).abs() < 1e-9);
    }
}
