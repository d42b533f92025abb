//! Pluggable behaviors for the modular engine. Modules are aggregated per
//! concern: edge costs and heuristic estimates by maximum, edge filters by
//! logical AND, abort requests by logical OR.

use crate::NodeId;
use crate::model::graph::{Edge, Graph, ModeSet, Node};
use crate::routing::metric::Metric;

/// A strategy hooked into the engine's relaxation loop. Every hook has a
/// neutral default, so a module only implements what it changes.
pub trait DijkstraModule {
    /// Price for relaxing `edge` from a node settled at `settled_cost`.
    /// `None` leaves pricing to other modules or the edge's intrinsic cost.
    fn edge_cost(&self, _edge: &Edge, _settled_cost: f64) -> Option<f64> {
        None
    }

    /// Whether `edge` may be relaxed at all.
    fn consider_edge(&self, _edge: &Edge, _destination: Option<NodeId>) -> bool {
        true
    }

    /// Lower bound on the remaining distance to the destination. Must never
    /// overestimate, or the engine stops being correct.
    fn estimated_distance(&self, _node: NodeId, _destination: NodeId) -> Option<f64> {
        None
    }

    /// Whether the search should stop after settling a node at this cost.
    fn should_abort(&self, _settled_cost: f64) -> bool {
        false
    }
}

impl<M: DijkstraModule + ?Sized> DijkstraModule for &M {
    fn edge_cost(&self, edge: &Edge, settled_cost: f64) -> Option<f64> {
        (**self).edge_cost(edge, settled_cost)
    }

    fn consider_edge(&self, edge: &Edge, destination: Option<NodeId>) -> bool {
        (**self).consider_edge(edge, destination)
    }

    fn estimated_distance(&self, node: NodeId, destination: NodeId) -> Option<f64> {
        (**self).estimated_distance(node, destination)
    }

    fn should_abort(&self, settled_cost: f64) -> bool {
        (**self).should_abort(settled_cost)
    }
}

/// Restricts the search to edges supporting at least one of the requested
/// modes and prices each edge with the fastest allowed mode.
#[derive(Debug, Clone, Copy)]
pub struct MultiModalModule {
    modes: ModeSet,
}

impl MultiModalModule {
    pub fn new(modes: ModeSet) -> Self {
        Self { modes }
    }
}

impl DijkstraModule for MultiModalModule {
    fn edge_cost(&self, edge: &Edge, _settled_cost: f64) -> Option<f64> {
        self.modes
            .iter()
            .filter(|&mode| edge.has_mode(mode))
            .map(|mode| edge.cost_for(mode))
            .reduce(f64::min)
    }

    fn consider_edge(&self, edge: &Edge, _destination: Option<NodeId>) -> bool {
        edge.modes().intersects(self.modes)
    }
}

/// Goal-directed search: feeds a metric's lower bound between a node and the
/// destination into the priority key.
#[derive(Debug, Clone)]
pub struct AStarModule<'g, M> {
    graph: &'g Graph,
    metric: M,
}

impl<'g, M: Metric<Node>> AStarModule<'g, M> {
    pub fn new(graph: &'g Graph, metric: M) -> Self {
        Self { graph, metric }
    }
}

impl<M: Metric<Node>> DijkstraModule for AStarModule<'_, M> {
    fn estimated_distance(&self, node: NodeId, destination: NodeId) -> Option<f64> {
        let node = self.graph.node(node)?;
        let destination = self.graph.node(destination)?;
        Some(self.metric.distance(node, destination))
    }
}

/// Stops the search once settled costs pass a bound, for radius-limited
/// queries like distance-to-access-node searches.
#[derive(Debug, Clone, Copy)]
pub struct AbortAfterModule {
    bound: f64,
}

impl AbortAfterModule {
    pub fn new(bound: f64) -> Self {
        Self { bound }
    }
}

impl DijkstraModule for AbortAfterModule {
    fn should_abort(&self, settled_cost: f64) -> bool {
        settled_cost > self.bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{HighwayType, TransportMode};

    #[test]
    fn multimodal_prices_with_the_fastest_allowed_mode() {
        let a = Node::road(0, 48.0, 7.8);
        let b = Node::road(1, 48.01, 7.8);
        let mut edge = Edge::road(0, 0, 1, Some(HighwayType::Secondary), None);
        edge.update_cost(&a, &b);

        let module = MultiModalModule::new(ModeSet::of(&[TransportMode::Bike, TransportMode::Foot]));
        let cost = module.edge_cost(&edge, 0.0).unwrap();
        assert!((cost - edge.cost_for(TransportMode::Bike)).abs() < f64::EPSILON);

        let car_only = Edge::road(0, 0, 1, Some(HighwayType::Motorway), None);
        assert!(!module.consider_edge(&car_only, None));
    }

    #[test]
    fn abort_module_triggers_past_the_bound() {
        let module = AbortAfterModule::new(100.0);
        assert!(!module.should_abort(100.0));
        assert!(module.should_abort(100.1));
    }
}
