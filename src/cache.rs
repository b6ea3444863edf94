//! Per-insertion distance memoization.

use std::collections::HashMap;

use crate::graph::NodeId;

/// Memoizes pairwise distances by unordered id pair.
///
/// Scoped to a single insertion: the builder creates a fresh cache per
/// inserted node and drops it on every exit path, so under the insert-only
/// model a hit can never be stale. No eviction; the size is bounded by the
/// distinct pairs one insertion touches.
#[derive(Debug)]
pub(crate) struct DistanceCache<D> {
    pairs: HashMap<(NodeId, NodeId), D>,
}

impl<D: Clone> DistanceCache<D> {
    pub(crate) fn new() -> Self {
        Self {
            pairs: HashMap::new(),
        }
    }

    fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub(crate) fn get(&self, a: NodeId, b: NodeId) -> Option<D> {
        self.pairs.get(&Self::key(a, b)).cloned()
    }

    pub(crate) fn insert(&mut self, a: NodeId, b: NodeId, distance: D) {
        self.pairs.insert(Self::key(a, b), distance);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pairs.len()
    }
}
