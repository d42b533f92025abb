//! Directed multigraph over road and transit nodes.
//!
//! The graph owns its nodes and edges and maintains both adjacency
//! directions, so reversal is a constant-time flip of the [`Orientation`]
//! rather than a rebuild. Edge endpoints are always expressed in forward
//! orientation; the accessors translate for callers.

mod edge;
mod node;
pub(crate) mod storage;

pub use edge::{Edge, EdgeKind, HighwayType, LINK_EDGE_ID, ModeSet, TransportMode};
pub use node::{Node, Spatial};

use storage::{DenseMap, EdgeSet};

use crate::{Error, NodeId};

/// Direction the graph is currently read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Forward,
    Reversed,
}

impl Orientation {
    fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reversed,
            Self::Reversed => Self::Forward,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: DenseMap<Node>,
    /// Edges keyed by their forward source.
    forward: DenseMap<EdgeSet>,
    /// The same edges keyed by their forward destination.
    backward: DenseMap<EdgeSet>,
    edge_count: usize,
    orientation: Orientation,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Flips the direction of every edge in O(1). A second call restores the
    /// original graph.
    pub fn reverse(&mut self) {
        self.orientation = self.orientation.flipped();
    }

    /// Inserts a node, returning the node previously stored under its id.
    pub fn add_node(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id(), node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    /// Removes a node together with all its incident edges.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        if let Some(outgoing) = self.forward.remove(id) {
            for edge in outgoing {
                if self.backward.get_mut(edge.destination()).is_some_and(|set| set.remove(&edge)) {
                    self.edge_count -= 1;
                }
            }
        }
        if let Some(incoming) = self.backward.remove(id) {
            for edge in incoming {
                if self.forward.get_mut(edge.source()).is_some_and(|set| set.remove(&edge)) {
                    self.edge_count -= 1;
                }
            }
        }
        Some(node)
    }

    /// Inserts an edge. Both endpoints must already be present. Returns
    /// `false` when an equal edge already exists, leaving the graph and its
    /// edge count unchanged.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool, Error> {
        for endpoint in [edge.source(), edge.destination()] {
            if !self.nodes.contains_key(endpoint) {
                return Err(Error::MissingNode(endpoint));
            }
        }
        let inserted = self
            .forward
            .get_or_insert_with(edge.source(), EdgeSet::default)
            .insert(edge.clone());
        if !inserted {
            return Ok(false);
        }
        self.backward
            .get_or_insert_with(edge.destination(), EdgeSet::default)
            .insert(edge);
        self.edge_count += 1;
        Ok(true)
    }

    /// Removes an edge, returning whether it was present.
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        let removed = self
            .forward
            .get_mut(edge.source())
            .is_some_and(|set| set.remove(edge));
        if removed {
            if let Some(set) = self.backward.get_mut(edge.destination()) {
                set.remove(edge);
            }
            self.edge_count -= 1;
        }
        removed
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.forward
            .get(edge.source())
            .is_some_and(|set| set.contains(edge))
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All edges, in forward storage order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.forward.values().flat_map(EdgeSet::iter)
    }

    /// Edges leaving `node` under the current orientation.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        let table = match self.orientation {
            Orientation::Forward => &self.forward,
            Orientation::Reversed => &self.backward,
        };
        table.get(node).into_iter().flat_map(EdgeSet::iter)
    }

    /// Edges entering `node` under the current orientation.
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        let table = match self.orientation {
            Orientation::Forward => &self.backward,
            Orientation::Reversed => &self.forward,
        };
        table.get(node).into_iter().flat_map(EdgeSet::iter)
    }

    /// The node an edge leaves from under the current orientation.
    pub fn edge_source(&self, edge: &Edge) -> NodeId {
        match self.orientation {
            Orientation::Forward => edge.source(),
            Orientation::Reversed => edge.destination(),
        }
    }

    /// The node an edge arrives at under the current orientation.
    pub fn edge_destination(&self, edge: &Edge) -> NodeId {
        match self.orientation {
            Orientation::Forward => edge.destination(),
            Orientation::Reversed => edge.source(),
        }
    }

    /// Recomputes the cost of every road edge from the current node
    /// positions. Run after bulk loading, once all coordinates are known.
    pub fn refresh_costs(&mut self) -> Result<(), Error> {
        let keys: Vec<NodeId> = self.forward.keys().collect();
        let mut updated = Vec::new();
        for key in keys {
            let Some(set) = self.forward.get_mut(key) else { continue };
            let edges: Vec<Edge> = std::mem::take(set).into_iter().collect();
            updated.clear();
            for mut edge in edges {
                let source = self
                    .nodes
                    .get(edge.source())
                    .ok_or(Error::MissingNode(edge.source()))?;
                let destination = self
                    .nodes
                    .get(edge.destination())
                    .ok_or(Error::MissingNode(edge.destination()))?;
                edge.update_cost(source, destination);
                updated.push(edge);
            }
            for edge in updated.drain(..) {
                if let Some(set) = self.backward.get_mut(edge.destination()) {
                    set.remove(&edge);
                    set.insert(edge.clone());
                }
                if let Some(set) = self.forward.get_mut(key) {
                    set.insert(edge);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(nodes: usize) -> Graph {
        let mut graph = Graph::new();
        for id in 0..nodes {
            graph.add_node(Node::road(id, 48.0 + id as f64 * 0.001, 7.8));
        }
        graph
    }

    #[test]
    fn duplicate_edges_leave_count_unchanged() {
        let mut graph = grid(2);
        assert!(graph.add_edge(Edge::link(0, 1)).unwrap());
        assert!(!graph.add_edge(Edge::link(0, 1)).unwrap());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn edge_needs_both_endpoints() {
        let mut graph = grid(1);
        assert!(matches!(graph.add_edge(Edge::link(0, 9)), Err(Error::MissingNode(9))));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn reversal_flips_adjacency() {
        let mut graph = grid(2);
        graph.add_edge(Edge::link(0, 1)).unwrap();
        assert_eq!(graph.outgoing_edges(0).count(), 1);
        assert_eq!(graph.outgoing_edges(1).count(), 0);

        graph.reverse();
        assert_eq!(graph.outgoing_edges(0).count(), 0);
        assert_eq!(graph.outgoing_edges(1).count(), 1);
        let edge = graph.outgoing_edges(1).next().unwrap();
        assert_eq!(graph.edge_source(edge), 1);
        assert_eq!(graph.edge_destination(edge), 0);

        // Two reversals restore the original graph
        graph.reverse();
        assert_eq!(graph.orientation(), Orientation::Forward);
        assert_eq!(graph.outgoing_edges(0).count(), 1);
    }

    #[test]
    fn removing_a_node_drops_incident_edges() {
        let mut graph = grid(3);
        graph.add_edge(Edge::link(0, 1)).unwrap();
        graph.add_edge(Edge::link(1, 2)).unwrap();
        graph.add_edge(Edge::link(2, 0)).unwrap();
        assert_eq!(graph.edge_count(), 3);

        graph.remove_node(1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.incoming_edges(2).count(), 0);
        assert_eq!(graph.outgoing_edges(2).count(), 1);
    }

    #[test]
    fn refresh_costs_uses_current_positions() {
        let mut graph = grid(2);
        graph
            .add_edge(Edge::road(0, 0, 1, Some(HighwayType::Secondary), None))
            .unwrap();
        let stale = graph.edges().next().unwrap().cost();
        assert!(stale.is_infinite());

        graph.refresh_costs().unwrap();
        let cost = graph.edges().next().unwrap().cost();
        assert!(cost.is_finite() && cost > 0.0);
    }
}
