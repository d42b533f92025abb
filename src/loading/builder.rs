//! Build-callback contract for the ingestion collaborator: `build_node` per
//! raw node, `build_edge` per consecutive node pair of a way, `complete`
//! once everything is in, which batch-resolves missing coordinates and
//! finalizes edge costs.

use hashbrown::{HashMap, HashSet};
use log::info;

use crate::model::graph::{Edge, Graph, Node};
use crate::{Error, NodeId};

use super::batch::ChunkBuffer;
use super::ids::UniqueIdGenerator;
use super::osm::{RawOsmNode, RawOsmWay, WayDirection, parse_highway, parse_max_speed,
    parse_way_direction};

/// Batch lookup of coordinates for raw node ids that were referenced by a
/// way before their node was delivered.
pub trait SpatialDataResolver {
    fn resolve(&self, raw_ids: &[i64]) -> Vec<(i64, f64, f64)>;
}

const RESOLVE_CHUNK: usize = 256;

/// Incrementally assembles a road [`Graph`] from raw OSM entities.
#[derive(Default)]
pub struct RoadGraphBuilder {
    graph: Graph,
    ids: UniqueIdGenerator,
    mapping: HashMap<i64, NodeId>,
    /// Raw ids whose nodes exist only as coordinate-less placeholders.
    pending: Vec<i64>,
    /// Next edge id per way; edge ids are unique within their way only.
    way_edges: HashMap<i64, u32>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node with known coordinates, promoting a placeholder if a
    /// way referenced it earlier.
    pub fn build_node(&mut self, raw: &RawOsmNode) -> Result<NodeId, Error> {
        if let Some(&id) = self.mapping.get(&raw.id) {
            if let Some(node) = self.graph.node_mut(id) {
                node.set_position(raw.latitude, raw.longitude);
            }
            self.pending.retain(|&pending| pending != raw.id);
            return Ok(id);
        }
        let id = self.ids.generate()?;
        self.mapping.insert(raw.id, id);
        self.graph.add_node(Node::road(id, raw.latitude, raw.longitude));
        Ok(id)
    }

    /// Adds the edge(s) for one segment of a way, honoring its direction
    /// tag. Endpoints not seen yet get placeholder nodes resolved in
    /// [`RoadGraphBuilder::complete`].
    pub fn build_edge(
        &mut self,
        way: &RawOsmWay,
        source_raw: i64,
        destination_raw: i64,
    ) -> Result<(), Error> {
        let source = self.node_for(source_raw)?;
        let destination = self.node_for(destination_raw)?;
        let highway = parse_highway(way.highway.as_deref());
        let max_speed = way.max_speed.as_deref().and_then(parse_max_speed);

        let forward = Edge::road(self.next_edge_id(way.id), source, destination, highway, max_speed);
        let backward =
            Edge::road(self.next_edge_id(way.id), destination, source, highway, max_speed);
        match parse_way_direction(way.one_way.as_deref()) {
            WayDirection::Both => {
                self.graph.add_edge(forward)?;
                self.graph.add_edge(backward)?;
            }
            WayDirection::Forward => {
                self.graph.add_edge(forward)?;
            }
            WayDirection::Backward => {
                self.graph.add_edge(backward)?;
            }
        }
        Ok(())
    }

    /// The internal id mapped to a raw id seen before.
    pub fn node_id(&self, raw: i64) -> Result<NodeId, Error> {
        self.mapping
            .get(&raw)
            .copied()
            .ok_or(Error::MissingIdMapping(raw))
    }

    /// Resolves all placeholder coordinates in chunks, then recomputes every
    /// road edge cost. Must run once after the last `build_*` call.
    pub fn complete(&mut self, resolver: &dyn SpatialDataResolver) -> Result<(), Error> {
        info!(
            "completing road graph: {} nodes, {} edges, {} unresolved positions",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.pending.len()
        );
        let mut unresolved: HashSet<i64> = self.pending.iter().copied().collect();
        let mut buffer = ChunkBuffer::new(RESOLVE_CHUNK);
        let mut chunks = Vec::new();
        for &raw in &self.pending {
            if let Some(chunk) = buffer.push(raw) {
                chunks.push(chunk);
            }
        }
        chunks.extend(buffer.finish());

        for chunk in chunks {
            for (raw, latitude, longitude) in resolver.resolve(&chunk) {
                let id = self.node_id(raw)?;
                let node = self.graph.node_mut(id).ok_or(Error::MissingNode(id))?;
                node.set_position(latitude, longitude);
                unresolved.remove(&raw);
            }
        }
        if let Some(&raw) = unresolved.iter().next() {
            return Err(Error::MissingIdMapping(raw));
        }
        self.pending.clear();
        self.graph.refresh_costs()
    }

    /// Hands over the finished graph.
    pub fn finish(self) -> Graph {
        self.graph
    }

    fn node_for(&mut self, raw: i64) -> Result<NodeId, Error> {
        if let Some(&id) = self.mapping.get(&raw) {
            return Ok(id);
        }
        let id = self.ids.generate()?;
        self.mapping.insert(raw, id);
        self.pending.push(raw);
        self.graph.add_node(Node::road(id, 0.0, 0.0));
        Ok(id)
    }

    fn next_edge_id(&mut self, way: i64) -> u32 {
        let counter = self.way_edges.entry(way).or_insert(0);
        let id = *counter;
        *counter += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::Spatial;

    struct MapResolver(HashMap<i64, (f64, f64)>);

    impl SpatialDataResolver for MapResolver {
        fn resolve(&self, raw_ids: &[i64]) -> Vec<(i64, f64, f64)> {
            raw_ids
                .iter()
                .filter_map(|raw| self.0.get(raw).map(|&(lat, lon)| (*raw, lat, lon)))
                .collect()
        }
    }

    fn raw_node(id: i64, latitude: f64, longitude: f64) -> RawOsmNode {
        RawOsmNode { id, latitude, longitude }
    }

    #[test]
    fn forward_referenced_nodes_are_batch_resolved() {
        let mut builder = RoadGraphBuilder::new();
        builder.build_node(&raw_node(100, 48.0, 7.8)).unwrap();
        let way = RawOsmWay {
            id: 7,
            highway: Some("residential".into()),
            ..RawOsmWay::default()
        };
        // Node 200 is referenced before it is delivered
        builder.build_edge(&way, 100, 200).unwrap();

        let resolver = MapResolver(HashMap::from_iter([(200, (48.01, 7.8))]));
        builder.complete(&resolver).unwrap();

        let graph = builder.finish();
        assert_eq!(graph.node_count(), 2);
        // Bidirectional way
        assert_eq!(graph.edge_count(), 2);
        for edge in graph.edges() {
            assert!(edge.cost().is_finite());
            assert!(edge.cost() > 0.0);
        }
        let resolved = graph.node(1).unwrap();
        assert!((resolved.latitude() - 48.01).abs() < 1e-9);
    }

    #[test]
    fn oneway_ways_build_a_single_edge() {
        let mut builder = RoadGraphBuilder::new();
        builder.build_node(&raw_node(1, 48.0, 7.8)).unwrap();
        builder.build_node(&raw_node(2, 48.01, 7.8)).unwrap();
        let way = RawOsmWay {
            id: 9,
            highway: Some("primary".into()),
            one_way: Some("yes".into()),
            ..RawOsmWay::default()
        };
        builder.build_edge(&way, 1, 2).unwrap();

        let graph = builder.finish();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.outgoing_edges(0).count(), 1);
        assert_eq!(graph.outgoing_edges(1).count(), 0);
    }

    #[test]
    fn unresolvable_references_fail_completion() {
        let mut builder = RoadGraphBuilder::new();
        builder.build_node(&raw_node(1, 48.0, 7.8)).unwrap();
        builder
            .build_edge(&RawOsmWay { id: 1, highway: None, ..RawOsmWay::default() }, 1, 2)
            .unwrap();

        let resolver = MapResolver(HashMap::new());
        assert!(matches!(
            builder.complete(&resolver),
            Err(Error::MissingIdMapping(2))
        ));
    }

    #[test]
    fn unknown_raw_ids_have_no_mapping() {
        let builder = RoadGraphBuilder::new();
        assert!(matches!(builder.node_id(5), Err(Error::MissingIdMapping(5))));
    }
}
