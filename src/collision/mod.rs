//! Collision discovery and vertical resolution.
//!
//! [`CollisionIndex`] finds overlapping geometries of one part and hands
//! them out as a FIFO work queue; [`VerticalResolver`] consumes that queue.

use std::collections::{HashSet, VecDeque};

use kurbo::Rect;

use crate::geometry::{GeometryId, GeometryTree};

pub mod vertical;

pub use vertical::{ResolveReport, VerticalResolver, MAX_RETRIES};

/// Two geometries whose root frames overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionPair {
    pub first: GeometryId,
    pub second: GeometryId,
    /// Intersection of the two frames in root space.
    pub overlap: Rect,
}

impl CollisionPair {
    /// Check `first` against `second`; `None` unless their root frames
    /// overlap with positive area and they are not nested in each other.
    pub fn detect(tree: &GeometryTree, first: GeometryId, second: GeometryId) -> Option<Self> {
        if first == second || tree.is_ancestor(first, second) || tree.is_ancestor(second, first) {
            return None;
        }
        let overlap = tree.root_frame(first).intersect(tree.root_frame(second));
        if overlap.width() <= 0.0 || overlap.height() <= 0.0 {
            return None;
        }
        Some(Self {
            first,
            second,
            overlap,
        })
    }

    pub fn involves(&self, id: GeometryId) -> bool {
        self.first == id || self.second == id
    }

    /// Order-independent identity of the pair.
    fn key(&self) -> (GeometryId, GeometryId) {
        (self.first.min(self.second), self.first.max(self.second))
    }
}

/// Pending collisions among the candidates of one part.
#[derive(Debug, Default)]
pub struct CollisionIndex {
    candidates: Vec<GeometryId>,
    queue: VecDeque<CollisionPair>,
    queued: HashSet<(GeometryId, GeometryId)>,
}

impl CollisionIndex {
    /// Collect the colliding descendants of `part` and queue every pair
    /// that overlaps and has at least one movable member.
    pub fn new(tree: &GeometryTree, part: GeometryId) -> Self {
        let candidates: Vec<GeometryId> = tree
            .descendants(part)
            .into_iter()
            .filter(|&id| tree.kind(id).collides())
            .collect();

        let mut index = Self {
            candidates,
            ..Self::default()
        };
        for (i, &a) in index.candidates.iter().enumerate() {
            for &b in &index.candidates[i + 1..] {
                if let Some(pair) = Self::check(tree, a, b) {
                    if index.queued.insert(pair.key()) {
                        index.queue.push_back(pair);
                    }
                }
            }
        }
        index
    }

    fn check(tree: &GeometryTree, a: GeometryId, b: GeometryId) -> Option<CollisionPair> {
        if tree.kind(a).is_immovable() && tree.kind(b).is_immovable() {
            return None;
        }
        CollisionPair::detect(tree, a, b)
    }

    pub fn candidates(&self) -> &[GeometryId] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Next pending pair, oldest first.
    pub fn pop(&mut self) -> Option<CollisionPair> {
        let pair = self.queue.pop_front()?;
        self.queued.remove(&pair.key());
        Some(pair)
    }

    /// Forget every pending pair involving `id`.
    pub fn invalidate(&mut self, id: GeometryId) {
        self.queue.retain(|p| !p.involves(id));
        self.queued.retain(|&(a, b)| a != id && b != id);
    }

    /// Re-test `id` against every candidate and queue new collisions.
    /// Returns the number of pairs added.
    pub fn recheck(&mut self, tree: &GeometryTree, id: GeometryId) -> usize {
        let mut added = 0;
        for &other in &self.candidates {
            let Some(pair) = Self::check(tree, id, other) else {
                continue;
            };
            if self.queued.insert(pair.key()) {
                self.queue.push_back(pair);
                added += 1;
            }
        }
        added
    }
}
