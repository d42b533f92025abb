//! Path representations shared by the road and timetable engines.

use crate::NodeId;
use crate::model::graph::Edge;

/// A hop of a path: the edge taken and the cost paid for it, which may differ
/// from the edge's intrinsic cost when a module priced the relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEdge {
    pub edge: Edge,
    pub cost: f64,
}

/// Common read surface of every path shape.
pub trait Path {
    fn source(&self) -> NodeId;
    fn destination(&self) -> NodeId;
    /// Total cost in seconds. For timetable journeys this is elapsed time
    /// including waits, so it can exceed the sum of the edge costs.
    fn cost(&self) -> f64;
    fn edges(&self) -> Box<dyn Iterator<Item = &PathEdge> + '_>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A concrete edge-by-edge path. A path with no edges is a valid result for a
/// query whose source equals its destination.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    source: NodeId,
    destination: NodeId,
    cost: f64,
    edges: Vec<PathEdge>,
}

impl EdgePath {
    pub fn new(source: NodeId) -> Self {
        Self { source, destination: source, cost: 0.0, edges: Vec::new() }
    }

    pub(crate) fn from_parts(
        source: NodeId,
        destination: NodeId,
        cost: f64,
        edges: Vec<PathEdge>,
    ) -> Self {
        Self { source, destination, cost, edges }
    }

    /// Appends a hop ending at `destination`.
    pub fn push(&mut self, edge: Edge, destination: NodeId, cost: f64) {
        self.destination = destination;
        self.cost += cost;
        self.edges.push(PathEdge { edge, cost });
    }

    /// Overrides the total cost, used when a path's cost includes time not
    /// spent on any edge (waiting at a stop).
    pub(crate) fn set_cost(&mut self, cost: f64) {
        self.cost = cost;
    }
}

impl Path for EdgePath {
    fn source(&self) -> NodeId {
        self.source
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn cost(&self) -> f64 {
        self.cost
    }

    fn edges(&self) -> Box<dyn Iterator<Item = &PathEdge> + '_> {
        Box::new(self.edges.iter())
    }

    fn len(&self) -> usize {
        self.edges.len()
    }
}

/// Three path segments read as one: road access, transit, road egress.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletonPath {
    first: EdgePath,
    second: EdgePath,
    third: EdgePath,
}

impl TripletonPath {
    pub fn new(first: EdgePath, second: EdgePath, third: EdgePath) -> Self {
        Self { first, second, third }
    }

    pub fn segments(&self) -> (&EdgePath, &EdgePath, &EdgePath) {
        (&self.first, &self.second, &self.third)
    }
}

impl Path for TripletonPath {
    fn source(&self) -> NodeId {
        self.first.source()
    }

    fn destination(&self) -> NodeId {
        self.third.destination()
    }

    fn cost(&self) -> f64 {
        self.first.cost() + self.second.cost() + self.third.cost()
    }

    fn edges(&self) -> Box<dyn Iterator<Item = &PathEdge> + '_> {
        Box::new(
            self.first
                .edges()
                .chain(self.second.edges())
                .chain(self.third.edges()),
        )
    }

    fn len(&self) -> usize {
        self.first.len() + self.second.len() + self.third.len()
    }
}

/// Result of a multimodal query: either the road-only path or a hybrid
/// road/transit/road composition.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePath {
    Road(EdgePath),
    Hybrid(TripletonPath),
}

impl Path for RoutePath {
    fn source(&self) -> NodeId {
        match self {
            Self::Road(path) => path.source(),
            Self::Hybrid(path) => path.source(),
        }
    }

    fn destination(&self) -> NodeId {
        match self {
            Self::Road(path) => path.destination(),
            Self::Hybrid(path) => path.destination(),
        }
    }

    fn cost(&self) -> f64 {
        match self {
            Self::Road(path) => path.cost(),
            Self::Hybrid(path) => path.cost(),
        }
    }

    fn edges(&self) -> Box<dyn Iterator<Item = &PathEdge> + '_> {
        match self {
            Self::Road(path) => path.edges(),
            Self::Hybrid(path) => path.edges(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Road(path) => path.len(),
            Self::Hybrid(path) => path.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(nodes: &[NodeId], edge_cost: f64) -> EdgePath {
        let mut path = EdgePath::new(nodes[0]);
        for pair in nodes.windows(2) {
            path.push(Edge::link(pair[0], pair[1]), pair[1], edge_cost);
        }
        path
    }

    #[test]
    fn edge_path_accumulates() {
        let path = segment(&[0, 1, 2], 10.0);
        assert_eq!(path.source(), 0);
        assert_eq!(path.destination(), 2);
        assert_eq!(path.len(), 2);
        assert!((path.cost() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tripleton_reads_as_concatenation() {
        let first = segment(&[0, 1], 5.0);
        let second = segment(&[1, 2, 3], 7.0);
        let third = segment(&[3, 4], 9.0);
        let expected: Vec<PathEdge> = first
            .edges()
            .chain(second.edges())
            .chain(third.edges())
            .cloned()
            .collect();

        let triple = TripletonPath::new(first, second, third);
        let read: Vec<PathEdge> = triple.edges().cloned().collect();
        assert_eq!(read, expected);
        assert_eq!(triple.source(), 0);
        assert_eq!(triple.destination(), 4);
        assert_eq!(triple.len(), 4);
        assert!((triple.cost() - (5.0 + 14.0 + 9.0)).abs() < f64::EPSILON);
    }
}
