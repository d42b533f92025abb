//! Landmark selection and the ALT distance lower bound.
//!
//! Landmark tables are a one-time precomputation over a finished graph and
//! must be rebuilt whenever the graph changes materially.

use hashbrown::HashMap;
use log::info;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rayon::prelude::*;

use crate::model::graph::Graph;
use crate::routing::dijkstra::{DijkstraModule, ModularDijkstra};
use crate::{Error, NodeId};

/// Strategy choosing landmark nodes from a graph.
pub trait LandmarkProvider {
    fn select(&self, graph: &Graph, count: usize, rng: &mut StdRng)
    -> Result<Vec<NodeId>, Error>;
}

/// Draws `count` distinct nodes uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomLandmarks;

impl LandmarkProvider for RandomLandmarks {
    fn select(
        &self,
        graph: &Graph,
        count: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<NodeId>, Error> {
        Ok(graph.node_ids().choose_multiple(rng, count))
    }
}

/// Starts from one random node and repeatedly adds the node farthest from
/// the current landmark set, measured by a multi-source search over the whole
/// graph. Expensive (`count` full searches) but spreads landmarks well.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyFarthestLandmarks;

impl LandmarkProvider for GreedyFarthestLandmarks {
    fn select(
        &self,
        graph: &Graph,
        count: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<NodeId>, Error> {
        let Some(first) = graph.node_ids().choose(rng) else {
            return Ok(Vec::new());
        };
        let mut landmarks = vec![first];
        while landmarks.len() < count {
            let costs = ModularDijkstra::new(graph).reachable_costs(&landmarks)?;
            let farthest = costs
                .iter()
                .filter(|(node, _)| !landmarks.contains(node))
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(&node, _)| node);
            match farthest {
                Some(node) => landmarks.push(node),
                // Everything reachable is already a landmark
                None => break,
            }
        }
        Ok(landmarks)
    }
}

/// Precomputed landmark distance tables and the ALT estimate derived from
/// them. Plugged into the engine as a heuristic module.
#[derive(Debug, Clone)]
pub struct LandmarkMetric {
    landmarks: Vec<NodeId>,
    /// Per landmark, distances landmark -> node.
    from_landmark: Vec<HashMap<NodeId, f64>>,
    /// Per landmark, distances node -> landmark, computed on the reversed
    /// graph.
    to_landmark: Vec<HashMap<NodeId, f64>>,
}

impl LandmarkMetric {
    /// Selects landmarks and fills both distance tables, one search per
    /// landmark and direction, parallelized per landmark. The graph is
    /// briefly reversed for the node-to-landmark direction and restored
    /// before returning.
    pub fn precompute(
        graph: &mut Graph,
        provider: &impl LandmarkProvider,
        count: usize,
        rng: &mut StdRng,
    ) -> Result<Self, Error> {
        let landmarks = provider.select(graph, count, rng)?;
        info!("computing ALT tables for {} landmarks", landmarks.len());

        let from_landmark = Self::tables(graph, &landmarks)?;
        graph.reverse();
        let to_landmark = Self::tables(graph, &landmarks);
        graph.reverse();

        Ok(Self { landmarks, from_landmark, to_landmark: to_landmark? })
    }

    fn tables(graph: &Graph, landmarks: &[NodeId]) -> Result<Vec<HashMap<NodeId, f64>>, Error> {
        landmarks
            .par_iter()
            .map(|&landmark| ModularDijkstra::new(graph).reachable_costs(&[landmark]))
            .collect()
    }

    pub fn landmarks(&self) -> &[NodeId] {
        &self.landmarks
    }

    /// Lower bound on the distance from `source` to `target`: the best
    /// triangle-inequality bound over all landmarks, in both directions. A
    /// landmark that cannot see one of the endpoints contributes nothing.
    pub fn estimate(&self, source: NodeId, target: NodeId) -> f64 {
        let mut best: f64 = 0.0;
        for index in 0..self.landmarks.len() {
            let from = &self.from_landmark[index];
            if let (Some(to_target), Some(to_source)) = (from.get(&target), from.get(&source)) {
                best = best.max(to_target - to_source);
            }
            let to = &self.to_landmark[index];
            if let (Some(from_source), Some(from_target)) = (to.get(&source), to.get(&target)) {
                best = best.max(from_source - from_target);
            }
        }
        best
    }
}

impl DijkstraModule for LandmarkMetric {
    fn estimated_distance(&self, node: NodeId, destination: NodeId) -> Option<f64> {
        Some(self.estimate(node, destination))
    }
}
