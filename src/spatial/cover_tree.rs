//! A cover tree over an arbitrary metric.
//!
//! Levels bound the covering radius (`2^level`) and guide where new points
//! attach; every node additionally caches the exact maximal metric distance
//! to any point in its subtree. Queries prune on that cached bound, so their
//! results are exact regardless of how balanced insertion left the tree.

use crate::routing::metric::Metric;

struct TreeNode<P> {
    point: P,
    level: i32,
    /// Exact max distance from `point` to any point in this subtree.
    max_distance: f64,
    children: Vec<TreeNode<P>>,
}

impl<P> TreeNode<P> {
    fn new(point: P, level: i32) -> Self {
        Self { point, level, max_distance: 0.0, children: Vec::new() }
    }

    fn cover_radius(&self) -> f64 {
        f64::powi(2.0, self.level)
    }
}

pub struct CoverTree<P, M> {
    metric: M,
    root: Option<TreeNode<P>>,
    len: usize,
}

impl<P, M: Metric<P>> CoverTree<P, M> {
    pub fn new(metric: M) -> Self {
        Self { metric, root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, point: P) {
        self.len += 1;
        let Some(mut root) = self.root.take() else {
            self.root = Some(TreeNode::new(point, 0));
            return;
        };
        // Raise the root until it can cover the new point
        let distance = self.metric.distance(&root.point, &point);
        while distance > root.cover_radius() {
            root.level += 1;
        }
        Self::insert_under(&self.metric, &mut root, point, distance);
        self.root = Some(root);
    }

    fn insert_under(metric: &M, node: &mut TreeNode<P>, point: P, distance: f64) {
        node.max_distance = node.max_distance.max(distance);
        // Descend into the closest child that can still cover the point,
        // otherwise attach a new child one level down.
        let closest = node
            .children
            .iter_mut()
            .map(|child| (metric.distance(&child.point, &point), child))
            .min_by(|(a, _), (b, _)| a.total_cmp(b));
        match closest {
            Some((child_distance, child)) if child_distance <= child.cover_radius() => {
                Self::insert_under(metric, child, point, child_distance);
            }
            _ => node.children.push(TreeNode::new(point, node.level - 1)),
        }
    }

    /// The stored point closest to `query`.
    pub fn nearest_neighbor(&self, query: &P) -> Option<&P> {
        let root = self.root.as_ref()?;
        let mut best = (self.metric.distance(&root.point, query), &root.point);
        self.search_nearest(root, query, &mut best);
        Some(best.1)
    }

    fn search_nearest<'t>(&'t self, node: &'t TreeNode<P>, query: &P, best: &mut (f64, &'t P)) {
        for child in &node.children {
            let distance = self.metric.distance(&child.point, query);
            if distance < best.0 {
                *best = (distance, &child.point);
            }
            if distance - child.max_distance < best.0 {
                self.search_nearest(child, query, best);
            }
        }
    }

    /// The `k` stored points closest to `query`, ordered closest first.
    pub fn k_nearest_neighbors(&self, query: &P, k: usize) -> Vec<&P> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }
        let mut best: Vec<(f64, &P)> = Vec::with_capacity(k + 1);
        Self::offer(&mut best, k, self.metric.distance(&root.point, query), &root.point);
        self.search_k_nearest(root, query, k, &mut best);
        best.into_iter().map(|(_, point)| point).collect()
    }

    fn search_k_nearest<'t>(
        &'t self,
        node: &'t TreeNode<P>,
        query: &P,
        k: usize,
        best: &mut Vec<(f64, &'t P)>,
    ) {
        for child in &node.children {
            let distance = self.metric.distance(&child.point, query);
            Self::offer(best, k, distance, &child.point);
            let worst = if best.len() < k { f64::INFINITY } else { best[best.len() - 1].0 };
            if distance - child.max_distance < worst {
                self.search_k_nearest(child, query, k, best);
            }
        }
    }

    fn offer<'t>(best: &mut Vec<(f64, &'t P)>, k: usize, distance: f64, point: &'t P) {
        if best.len() == k && distance >= best[k - 1].0 {
            return;
        }
        let at = best.partition_point(|(known, _)| *known <= distance);
        best.insert(at, (distance, point));
        best.truncate(k);
    }

    /// All stored points within `radius` of `query`.
    pub fn neighborhood(&self, query: &P, radius: f64) -> Vec<&P> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        if self.metric.distance(&root.point, query) <= radius {
            found.push(&root.point);
        }
        self.search_neighborhood(root, query, radius, &mut found);
        found
    }

    fn search_neighborhood<'t>(
        &'t self,
        node: &'t TreeNode<P>,
        query: &P,
        radius: f64,
        found: &mut Vec<&'t P>,
    ) {
        for child in &node.children {
            let distance = self.metric.distance(&child.point, query);
            if distance <= radius {
                found.push(&child.point);
            }
            if distance - child.max_distance <= radius {
                self.search_neighborhood(child, query, radius, found);
            }
        }
    }
}
