//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in a flat arena and refer to their children by index. Leaves
//! own a contiguous range of the BVH's reordered triangle id list. The tree
//! borrows the [`Scene`] it was built from, so it cannot outlive it.

use crate::hittable::{HitRecord, Hittable};
use crate::triangle::Culling;
use lumen_core::{Scene, TriangleId};
use lumen_math::{axis_component, Aabb, Interval, Ray};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Instant;
use thiserror::Error;

/// How the builder picks the axis to sort and split along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitAxis {
    /// Uniformly random per node, drawn from the build generator.
    #[default]
    Random,
    /// X, Y, Z cycling with depth.
    RoundRobin,
    /// The axis along which the member centroids spread the most.
    LongestCentroidExtent,
}

/// BVH build settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Partitions of at most this many triangles become leaves (minimum 1)
    pub max_leaf_size: usize,
    pub split_axis: SplitAxis,
    /// Seed of the generator used by `SplitAxis::Random`
    pub seed: u64,
    pub culling: Culling,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 1,
            split_axis: SplitAxis::default(),
            seed: 0,
            culling: Culling::default(),
        }
    }
}

impl BvhConfig {
    pub fn with_split_axis(mut self, split_axis: SplitAxis) -> Self {
        self.split_axis = split_axis;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_culling(mut self, culling: Culling) -> Self {
        self.culling = culling;
        self
    }

    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size;
        self
    }
}

/// Build counters kept for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    /// Depth of the deepest leaf (root is depth 0)
    pub max_depth: usize,
    pub primitive_count: usize,
}

/// Structural problems reported by [`Bvh::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum BvhError {
    #[error("node {node} has exactly one child")]
    SingleChild { node: u32 },

    #[error("node {node} references missing child {child}")]
    MissingChild { node: u32, child: u32 },

    #[error("interior node {node} also holds primitives")]
    InteriorWithPrimitives { node: u32 },

    #[error("leaf {node} holds {count} primitives, more than the limit of {limit}")]
    OversizedLeaf { node: u32, count: usize, limit: usize },

    #[error("triangle {triangle} pokes out of the bounds of node {node}")]
    NotContained { node: u32, triangle: TriangleId },

    #[error("tree covers {found} primitives but the scene has {expected}")]
    PrimitiveCount { expected: usize, found: usize },
}

/// A BVH node: interior when both children are set, leaf when neither is.
#[derive(Debug, Clone, PartialEq)]
pub struct BvhNode {
    bounds: Aabb,
    left: Option<u32>,
    right: Option<u32>,
    /// Range into `Bvh::primitives`; empty for interior nodes
    first: u32,
    count: u32,
}

impl BvhNode {
    fn leaf(bounds: Aabb, first: usize, count: usize) -> Self {
        Self {
            bounds,
            left: None,
            right: None,
            first: first as u32,
            count: count as u32,
        }
    }

    fn interior(bounds: Aabb, left: u32, right: u32) -> Self {
        Self {
            bounds,
            left: Some(left),
            right: Some(right),
            first: 0,
            count: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Both child indices of an interior node.
    pub fn children(&self) -> Option<(u32, u32)> {
        self.left.zip(self.right)
    }

    fn primitive_range(&self) -> Range<usize> {
        let first = self.first as usize;
        first..first + self.count as usize
    }
}

/// Binary BVH over the triangles of one scene.
pub struct Bvh<'s> {
    scene: &'s Scene,
    nodes: Vec<BvhNode>,
    /// Triangle ids reordered so every leaf owns a contiguous run
    primitives: Vec<TriangleId>,
    culling: Culling,
    max_leaf_size: usize,
    stats: BvhStats,
}

impl<'s> Bvh<'s> {
    /// Build a BVH, seeding the split generator from `config.seed`.
    pub fn build(scene: &'s Scene, config: &BvhConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::build_with_rng(scene, config, &mut rng)
    }

    /// Build a BVH drawing split decisions from the supplied generator.
    pub fn build_with_rng<R: Rng + ?Sized>(scene: &'s Scene, config: &BvhConfig, rng: &mut R) -> Self {
        let start = Instant::now();
        let mut primitives: Vec<TriangleId> = (0..scene.triangle_count() as TriangleId).collect();
        let max_leaf_size = config.max_leaf_size.max(1);

        let mut builder = BvhBuilder {
            scene,
            split_axis: config.split_axis,
            max_leaf_size,
            rng,
            nodes: Vec::with_capacity(2 * primitives.len().max(1)),
            leaf_count: 0,
            max_depth: 0,
        };
        builder.build_node(&mut primitives, 0, 0);

        let stats = BvhStats {
            node_count: builder.nodes.len(),
            leaf_count: builder.leaf_count,
            max_depth: builder.max_depth,
            primitive_count: primitives.len(),
        };

        log::info!(
            "BVH built in {:?}: {} nodes, {} leaves, depth {} over {} triangles",
            start.elapsed(),
            stats.node_count,
            stats.leaf_count,
            stats.max_depth,
            stats.primitive_count
        );

        Self {
            scene,
            nodes: builder.nodes,
            primitives,
            culling: config.culling,
            max_leaf_size,
            stats,
        }
    }

    pub fn scene(&self) -> &'s Scene {
        self.scene
    }

    pub fn stats(&self) -> BvhStats {
        self.stats
    }

    pub fn node_count(&self) -> usize {
        self.stats.node_count
    }

    pub fn leaf_count(&self) -> usize {
        self.stats.leaf_count
    }

    pub fn culling(&self) -> Culling {
        self.culling
    }

    /// The root node. Always present, an empty leaf for an empty scene.
    pub fn root(&self) -> &BvhNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: u32) -> &BvhNode {
        &self.nodes[index as usize]
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Triangles stored directly in a node (empty for interior nodes).
    pub fn leaf_primitives(&self, node: &BvhNode) -> &[TriangleId] {
        &self.primitives[node.primitive_range()]
    }

    /// Interior children of `index`, `None` for a leaf.
    ///
    /// # Panics
    /// If the node has exactly one child. The builder never produces such a
    /// node, so this is a bug rather than bad input.
    fn split(&self, index: u32) -> Option<(u32, u32)> {
        let node = &self.nodes[index as usize];
        match (node.left, node.right) {
            (Some(left), Some(right)) => Some((left, right)),
            (None, None) => None,
            _ => panic!("malformed BVH: node {index} has exactly one child"),
        }
    }

    /// Entry distance of a child box if the ray overlaps it within `[t_min, t_max]`.
    #[inline]
    fn entry(&self, index: u32, ray: &Ray, t_min: f32, t_max: f32) -> Option<f32> {
        self.nodes[index as usize]
            .bounds
            .hit_interval(ray)
            .filter(|span| span.min <= t_max && span.max >= t_min)
            .map(|span| span.min)
    }

    /// Depth-first nearest-hit search below a node whose box the ray already overlaps.
    fn traverse(&self, index: u32, ray: &Ray, ray_t: Interval, best: &mut Option<HitRecord>) {
        match self.split(index) {
            None => {
                for &id in self.leaf_primitives(&self.nodes[index as usize]) {
                    let max = best.map_or(ray_t.max, |hit| hit.t);
                    if let Some(hit) = HitRecord::test(self.scene, id, ray, Interval::new(ray_t.min, max), self.culling) {
                        *best = Some(hit);
                    }
                }
            }
            Some((left, right)) => {
                let max = best.map_or(ray_t.max, |hit| hit.t);
                let near_first = match (self.entry(left, ray, ray_t.min, max), self.entry(right, ray, ray_t.min, max)) {
                    (Some(l), Some(r)) if r < l => [Some((right, r)), Some((left, l))],
                    (l, r) => [l.map(|t| (left, t)), r.map(|t| (right, t))],
                };

                for (child, entry) in near_first.into_iter().flatten() {
                    // A closer hit found in the first child can rule out the second
                    if best.map_or(true, |hit| entry <= hit.t) {
                        self.traverse(child, ray, ray_t, best);
                    }
                }
            }
        }
    }

    fn any_hit(&self, index: u32, ray: &Ray, ray_t: Interval) -> bool {
        match self.split(index) {
            None => self
                .leaf_primitives(&self.nodes[index as usize])
                .iter()
                .any(|&id| HitRecord::test(self.scene, id, ray, ray_t, self.culling).is_some()),
            Some((left, right)) => [left, right].into_iter().any(|child| {
                self.entry(child, ray, ray_t.min, ray_t.max).is_some() && self.any_hit(child, ray, ray_t)
            }),
        }
    }

    /// Check the structural invariants of the tree.
    pub fn validate(&self) -> Result<(), BvhError> {
        let found = self.validate_node(0, self.max_leaf_size)?;
        if found != self.scene.triangle_count() {
            return Err(BvhError::PrimitiveCount {
                expected: self.scene.triangle_count(),
                found,
            });
        }
        Ok(())
    }

    /// Validates the subtree and returns how many primitives it holds.
    fn validate_node(&self, index: u32, limit: usize) -> Result<usize, BvhError> {
        let node = &self.nodes[index as usize];
        match (node.left, node.right) {
            (None, None) => {
                let prims = self.leaf_primitives(node);
                if prims.len() > limit {
                    return Err(BvhError::OversizedLeaf {
                        node: index,
                        count: prims.len(),
                        limit,
                    });
                }
                for &id in prims {
                    let contained = self
                        .scene
                        .vertices(id)
                        .iter()
                        .all(|&v| node.bounds.contains_point(v));
                    if !contained {
                        return Err(BvhError::NotContained { node: index, triangle: id });
                    }
                }
                Ok(prims.len())
            }
            (Some(left), Some(right)) => {
                if node.count != 0 {
                    return Err(BvhError::InteriorWithPrimitives { node: index });
                }
                let mut total = 0;
                for child in [left, right] {
                    let Some(child_node) = self.nodes.get(child as usize) else {
                        return Err(BvhError::MissingChild { node: index, child });
                    };
                    if !node.bounds.contains(&child_node.bounds) {
                        let triangle = self.first_primitive_below(child);
                        return Err(BvhError::NotContained { node: index, triangle });
                    }
                    total += self.validate_node(child, limit)?;
                }
                Ok(total)
            }
            _ => Err(BvhError::SingleChild { node: index }),
        }
    }

    fn first_primitive_below(&self, mut index: u32) -> TriangleId {
        while let Some(left) = self.nodes[index as usize].left {
            index = left;
        }
        self.leaf_primitives(&self.nodes[index as usize])
            .first()
            .copied()
            .unwrap_or_default()
    }
}

impl Hittable for Bvh<'_> {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.entry(0, ray, ray_t.min, ray_t.max)?;
        let mut best = None;
        self.traverse(0, ray, ray_t, &mut best);
        best
    }

    fn occluded(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.entry(0, ray, ray_t.min, ray_t.max).is_some() && self.any_hit(0, ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.nodes[0].bounds
    }
}

struct BvhBuilder<'a, R: ?Sized> {
    scene: &'a Scene,
    split_axis: SplitAxis,
    max_leaf_size: usize,
    rng: &'a mut R,
    nodes: Vec<BvhNode>,
    leaf_count: usize,
    max_depth: usize,
}

impl<R: Rng + ?Sized> BvhBuilder<'_, R> {
    /// Recursive median-split construction over `ids`, which starts at
    /// `offset` in the final primitive order. Returns the node index.
    fn build_node(&mut self, ids: &mut [TriangleId], offset: usize, depth: usize) -> u32 {
        // Sweep the actual vertices rather than trusting cached triangle boxes
        let bounds = ids.iter().fold(Aabb::EMPTY, |acc, &id| {
            self.scene.vertices(id).iter().fold(acc, |acc, &v| acc.grow(v))
        });

        let index = self.nodes.len() as u32;
        self.nodes.push(BvhNode::leaf(bounds, offset, ids.len()));

        if ids.len() <= self.max_leaf_size {
            self.leaf_count += 1;
            self.max_depth = self.max_depth.max(depth);
            return index;
        }

        let axis = self.choose_axis(ids, depth);
        let scene = self.scene;
        ids.sort_unstable_by(|&a, &b| {
            let ca = axis_component(scene.triangle(a).centroid(), axis);
            let cb = axis_component(scene.triangle(b).centroid(), axis);
            ca.total_cmp(&cb)
        });

        let mid = ids.len() / 2;
        let (left_ids, right_ids) = ids.split_at_mut(mid);
        let left = self.build_node(left_ids, offset, depth + 1);
        let right = self.build_node(right_ids, offset + mid, depth + 1);

        self.nodes[index as usize] = BvhNode::interior(bounds, left, right);
        index
    }

    fn choose_axis(&mut self, ids: &[TriangleId], depth: usize) -> usize {
        match self.split_axis {
            SplitAxis::Random => self.rng.gen_range(0..3),
            SplitAxis::RoundRobin => depth % 3,
            SplitAxis::LongestCentroidExtent => ids
                .iter()
                .fold(Aabb::EMPTY, |acc, &id| acc.grow(self.scene.triangle(id).centroid()))
                .longest_axis(),
        }
    }
}
