//! Graph nodes and neighbor selection.
//!
//! Both heuristics take candidates with precomputed distances to the
//! selection target and return at most `m` of them. They run during
//! insertion only: once for the new node's neighbors and again whenever a
//! neighbor overflows its degree cap, so every distance request goes through
//! the builder's pairwise probe (and the per-insert cache when enabled).

use std::collections::HashSet;

use crate::graph::{Graph, NodeId};
use crate::queue::{Candidate, MinQueue};

/// One graph node: per-layer neighbor lists for a single item.
///
/// `connections[layer]` holds the neighbor ids at that layer, unique, in
/// insertion order. The list count fixes the node's top layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    connections: Vec<Vec<NodeId>>,
}

impl Node {
    pub(crate) fn new(max_layer: usize) -> Self {
        Self {
            connections: vec![Vec::new(); max_layer + 1],
        }
    }

    pub(crate) fn from_connections(connections: Vec<Vec<NodeId>>) -> Self {
        debug_assert!(!connections.is_empty());
        Self { connections }
    }

    /// Top layer at which this node participates.
    pub fn max_layer(&self) -> usize {
        self.connections.len() - 1
    }

    /// Neighbor ids at a layer; empty above the node's top layer.
    pub fn neighbors(&self, layer: usize) -> &[NodeId] {
        self.connections.get(layer).map_or(&[], Vec::as_slice)
    }

    /// All per-layer lists, bottom to top.
    pub(crate) fn layers(&self) -> &[Vec<NodeId>] {
        &self.connections
    }

    pub(crate) fn add_neighbor(&mut self, layer: usize, id: NodeId) {
        let list = &mut self.connections[layer];
        if !list.contains(&id) {
            list.push(id);
        }
    }

    pub(crate) fn remove_neighbor(&mut self, layer: usize, id: NodeId) {
        self.connections[layer].retain(|&n| n != id);
    }

    pub(crate) fn set_neighbors(&mut self, layer: usize, ids: Vec<NodeId>) {
        self.connections[layer] = ids;
    }
}

/// SELECT-NEIGHBORS-SIMPLE: the `m` candidates closest to the target, ties
/// resolved by ascending id.
pub(crate) fn select_simple<D: PartialOrd>(
    mut candidates: Vec<Candidate<D>>,
    m: usize,
) -> Vec<Candidate<D>> {
    candidates.sort_by(Candidate::cmp_asc);
    candidates.truncate(m);
    candidates
}

/// SELECT-NEIGHBORS-HEURISTIC (paper Algorithm 4).
///
/// Pops candidates closest-first; a candidate is kept only when it is
/// strictly closer to the target than to every already-kept neighbor, which
/// spreads the result set across directions instead of clustering it. With
/// `extend`, the working set is first widened by the layer neighbors of the
/// incoming candidates; with `keep_pruned`, discarded candidates backfill
/// the result closest-first until `m` is reached.
pub(crate) fn select_heuristic<D, F>(
    graph: &Graph,
    layer: usize,
    target: NodeId,
    candidates: Vec<Candidate<D>>,
    m: usize,
    extend: bool,
    keep_pruned: bool,
    pair: &mut F,
) -> Vec<Candidate<D>>
where
    D: PartialOrd + Clone,
    F: FnMut(NodeId, NodeId) -> D,
{
    let mut seen: HashSet<NodeId> = candidates.iter().map(|c| c.id).collect();
    seen.insert(target);

    let mut working = MinQueue::with_capacity(candidates.len());
    if extend {
        let hops: Vec<NodeId> = candidates
            .iter()
            .flat_map(|c| graph.neighbors(c.id, layer))
            .copied()
            .collect();
        for n in hops {
            if seen.insert(n) {
                working.push(Candidate::new(n, pair(n, target)));
            }
        }
    }
    for c in candidates {
        working.push(c);
    }

    let mut result: Vec<Candidate<D>> = Vec::with_capacity(m);
    let mut discarded: Vec<Candidate<D>> = Vec::with_capacity(working.len());

    while result.len() < m {
        let Some(e) = working.pop() else { break };
        let closer_than_kept = result.iter().all(|r| e.distance < pair(e.id, r.id));
        if result.is_empty() || closer_than_kept {
            result.push(e);
        } else {
            discarded.push(e);
        }
    }

    if keep_pruned {
        // discarded came off a min-queue, so it is already ascending.
        for e in discarded {
            if result.len() >= m {
                break;
            }
            result.push(e);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_from(points: &[(f64, f64)]) -> impl FnMut(NodeId, NodeId) -> f64 + '_ {
        move |a, b| {
            let (ax, ay) = points[a as usize];
            let (bx, by) = points[b as usize];
            ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
        }
    }

    fn candidates_for<F: FnMut(NodeId, NodeId) -> f64>(
        ids: &[NodeId],
        target: NodeId,
        pair: &mut F,
    ) -> Vec<Candidate<f64>> {
        ids.iter().map(|&id| Candidate::new(id, pair(id, target))).collect()
    }

    #[test]
    fn test_node_tracks_layers() {
        let node = Node::new(2);
        assert_eq!(node.max_layer(), 2);
        assert!(node.neighbors(0).is_empty());
        assert!(node.neighbors(7).is_empty());
    }

    #[test]
    fn test_add_neighbor_dedups() {
        let mut node = Node::new(0);
        node.add_neighbor(0, 3);
        node.add_neighbor(0, 3);
        node.add_neighbor(0, 5);
        assert_eq!(node.neighbors(0), &[3, 5]);

        node.remove_neighbor(0, 3);
        assert_eq!(node.neighbors(0), &[5]);
    }

    #[test]
    fn test_select_simple_takes_closest() {
        let candidates = vec![
            Candidate::new(0, 3.0),
            Candidate::new(1, 1.0),
            Candidate::new(2, 2.0),
        ];
        let selected = select_simple(candidates, 2);
        let ids: Vec<NodeId> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_select_simple_ties_break_by_id() {
        let candidates = vec![
            Candidate::new(9, 1.0),
            Candidate::new(2, 1.0),
            Candidate::new(5, 1.0),
        ];
        let selected = select_simple(candidates, 2);
        let ids: Vec<NodeId> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_select_simple_short_candidate_list() {
        let candidates = vec![Candidate::new(0, 1.0)];
        assert_eq!(select_simple(candidates, 5).len(), 1);
    }

    #[test]
    fn test_heuristic_drops_dominated_candidates() {
        // Target at the origin; ids 1 and 2 lie in the same direction, with
        // 2 closer to 1 than to the target. The heuristic keeps 1 and the
        // off-axis 3, skipping the dominated 2.
        let points = [(0.0, 0.0), (1.0, 0.0), (1.6, 0.0), (0.0, 2.0)];
        let mut pair = pair_from(&points);
        let mut graph = Graph::new();
        for _ in 0..points.len() {
            graph.push_node(0);
        }

        let candidates = candidates_for(&[1, 2, 3], 0, &mut pair);
        let selected = select_heuristic(&graph, 0, 0, candidates, 3, false, false, &mut pair);
        let ids: Vec<NodeId> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_heuristic_keep_pruned_backfills() {
        let points = [(0.0, 0.0), (1.0, 0.0), (1.6, 0.0), (0.0, 2.0)];
        let mut pair = pair_from(&points);
        let mut graph = Graph::new();
        for _ in 0..points.len() {
            graph.push_node(0);
        }

        let candidates = candidates_for(&[1, 2, 3], 0, &mut pair);
        let selected = select_heuristic(&graph, 0, 0, candidates, 3, false, true, &mut pair);
        let ids: Vec<NodeId> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3, 2], "pruned candidate should backfill last");
    }

    #[test]
    fn test_heuristic_extend_pulls_one_hop_neighbors() {
        // Node 2 is only reachable through 1's neighbor list, and it is the
        // closest to the target; extension must surface it.
        let points = [(0.0, 0.0), (1.0, 0.0), (0.5, 0.0), (0.0, 3.0)];
        let mut pair = pair_from(&points);
        let mut graph = Graph::new();
        for _ in 0..points.len() {
            graph.push_node(0);
        }
        graph.connect(1, 2, 0);

        let candidates = candidates_for(&[1, 3], 0, &mut pair);
        let selected = select_heuristic(&graph, 0, 0, candidates, 1, true, false, &mut pair);
        let ids: Vec<NodeId> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_heuristic_extension_excludes_target() {
        let points = [(0.0, 0.0), (1.0, 0.0)];
        let mut pair = pair_from(&points);
        let mut graph = Graph::new();
        graph.push_node(0);
        graph.push_node(0);
        graph.connect(0, 1, 0);

        let candidates = candidates_for(&[1], 0, &mut pair);
        let selected = select_heuristic(&graph, 0, 0, candidates, 2, true, false, &mut pair);
        assert!(selected.iter().all(|c| c.id != 0), "target selected as its own neighbor");
    }

    #[test]
    fn test_heuristic_always_keeps_closest() {
        let points = [(0.0, 0.0), (5.0, 5.0), (5.1, 5.1), (4.9, 5.2)];
        let mut pair = pair_from(&points);
        let mut graph = Graph::new();
        for _ in 0..points.len() {
            graph.push_node(0);
        }

        let candidates = candidates_for(&[1, 2, 3], 0, &mut pair);
        let selected = select_heuristic(&graph, 0, 0, candidates, 2, false, false, &mut pair);
        assert_eq!(selected[0].id, 1, "closest candidate must always be kept");
    }
}
