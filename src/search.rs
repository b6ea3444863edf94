//! Graph navigation: greedy descent and beam search.
//!
//! Both functions are read-only over the graph and generic over a distance
//! probe `FnMut(NodeId) -> D`, so the same code serves construction (probe
//! backed by the pairwise oracle and its cache) and queries (probe against
//! the query item). All scratch state is per-call.

use std::collections::HashSet;

use crate::graph::{Graph, NodeId};
use crate::queue::{Candidate, MaxQueue, MinQueue};

/// Greedy single-pointer descent from `start` through `from_layer` down to
/// `to_layer + 1`.
///
/// At each layer, repeatedly hop to the neighbor strictly closer to the
/// target than the current node (the closest such neighbor, ties by id)
/// until no neighbor improves. This is the beam search collapsed to ef = 1,
/// used to find a good entry for the finer layer below.
pub(crate) fn greedy_descent<D, F>(
    graph: &Graph,
    dist: &mut F,
    start: Candidate<D>,
    from_layer: usize,
    to_layer: usize,
) -> Candidate<D>
where
    D: PartialOrd + Clone,
    F: FnMut(NodeId) -> D,
{
    let mut best = start;
    for layer in ((to_layer + 1)..=from_layer).rev() {
        loop {
            let mut next: Option<Candidate<D>> = None;
            for &n in graph.neighbors(best.id, layer) {
                let d = dist(n);
                if d < best.distance {
                    let candidate = Candidate::new(n, d);
                    let take = next
                        .as_ref()
                        .map_or(true, |c| candidate.cmp_asc(c) == std::cmp::Ordering::Less);
                    if take {
                        next = Some(candidate);
                    }
                }
            }
            match next {
                Some(c) => best = c,
                None => break,
            }
        }
    }
    best
}

/// Beam search at one layer (paper Algorithm 2).
///
/// Starts from `seeds` (already scored, treated as visited), expands the
/// closest unexpanded candidate until the closest is farther than the worst
/// of the `ef` best found, and returns the best set ascending by
/// (distance, id). `seeds` must be non-empty.
pub(crate) fn search_layer<D, F>(
    graph: &Graph,
    dist: &mut F,
    seeds: &[Candidate<D>],
    ef: usize,
    layer: usize,
) -> Vec<Candidate<D>>
where
    D: PartialOrd + Clone,
    F: FnMut(NodeId) -> D,
{
    debug_assert!(!seeds.is_empty());

    let mut visited: HashSet<NodeId> = seeds.iter().map(|c| c.id).collect();
    let mut candidates = MinQueue::with_capacity(ef + 1);
    let mut best = MaxQueue::with_capacity(ef + 1);
    for seed in seeds {
        candidates.push(seed.clone());
        best.push(seed.clone());
    }
    while best.len() > ef {
        best.pop();
    }

    loop {
        // Stop when the closest unexpanded candidate cannot improve the
        // beam: farther than the worst of ef results already found.
        let done = match (candidates.peek(), best.peek()) {
            (Some(closest), Some(worst)) => best.len() >= ef && worst.distance < closest.distance,
            (Some(_), None) => false,
            (None, _) => true,
        };
        if done {
            break;
        }
        let Some(current) = candidates.pop() else { break };

        for &n in graph.neighbors(current.id, layer) {
            if !visited.insert(n) {
                continue;
            }
            let d = dist(n);
            let admit =
                best.len() < ef || best.peek().is_some_and(|worst| d < worst.distance);
            if admit {
                let found = Candidate::new(n, d);
                candidates.push(found.clone());
                best.push(found);
                if best.len() > ef {
                    best.pop();
                }
            }
        }
    }

    best.into_sorted()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chain 0 - 1 - 2 - 3 - 4 at layer 0, with 0 - 2 - 4 at layer 1 and an
    /// entry spine 0 - 4 at layer 2. Distance probe treats node ids as
    /// positions on a line.
    fn line_graph() -> Graph {
        let mut graph = Graph::new();
        graph.push_node(2);
        graph.push_node(0);
        graph.push_node(1);
        graph.push_node(0);
        graph.push_node(2);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
            graph.connect(a, b, 0);
        }
        graph.connect(0, 2, 1);
        graph.connect(2, 4, 1);
        graph.connect(0, 4, 2);
        graph.set_entry_point(0);
        graph
    }

    fn line_dist(target: f64) -> impl FnMut(NodeId) -> f64 {
        move |id| (id as f64 - target).abs()
    }

    #[test]
    fn test_greedy_descent_walks_toward_target() {
        let graph = line_graph();
        let mut dist = line_dist(4.0);
        let start = Candidate::new(0, dist(0));

        let found = greedy_descent(&graph, &mut dist, start, 2, 0);
        assert_eq!(found.id, 4);
        assert_eq!(found.distance, 0.0);
    }

    #[test]
    fn test_greedy_descent_stops_without_improvement() {
        let graph = line_graph();
        let mut dist = line_dist(0.0);
        let start = Candidate::new(0, dist(0));

        let found = greedy_descent(&graph, &mut dist, start, 2, 0);
        assert_eq!(found.id, 0);
    }

    #[test]
    fn test_greedy_descent_requires_strict_improvement() {
        // Nodes 0 and 1 are equidistant from the target; the walk must not
        // oscillate between them.
        let mut graph = Graph::new();
        graph.push_node(1);
        graph.push_node(1);
        graph.connect(0, 1, 1);
        graph.set_entry_point(0);

        let mut dist = |_id: NodeId| 1.0;
        let start = Candidate::new(0, 1.0);
        let found = greedy_descent(&graph, &mut dist, start, 1, 0);
        assert_eq!(found.id, 0);
    }

    #[test]
    fn test_search_layer_finds_neighborhood() {
        let graph = line_graph();
        let mut dist = line_dist(2.2);
        let seeds = vec![Candidate::new(0, dist(0))];

        let found = search_layer(&graph, &mut dist, &seeds, 3, 0);
        let ids: Vec<NodeId> = found.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_search_layer_caps_result_at_ef() {
        let graph = line_graph();
        let mut dist = line_dist(2.0);
        let seeds = vec![Candidate::new(0, dist(0))];

        let found = search_layer(&graph, &mut dist, &seeds, 2, 0);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_search_layer_returns_sorted_ascending() {
        let graph = line_graph();
        let mut dist = line_dist(0.6);
        let seeds = vec![Candidate::new(4, dist(4))];

        let found = search_layer(&graph, &mut dist, &seeds, 5, 0);
        for pair in found.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_search_layer_multi_seed() {
        let graph = line_graph();
        let mut dist = line_dist(3.0);
        let seeds = vec![Candidate::new(0, dist(0)), Candidate::new(4, dist(4))];

        let found = search_layer(&graph, &mut dist, &seeds, 2, 0);
        let ids: Vec<NodeId> = found.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_search_layer_ignores_layers_above_node() {
        // At layer 1 only nodes 0, 2, 4 are wired; a search there must not
        // surface 1 or 3.
        let graph = line_graph();
        let mut dist = line_dist(3.0);
        let seeds = vec![Candidate::new(0, dist(0))];

        let found = search_layer(&graph, &mut dist, &seeds, 5, 1);
        let ids: Vec<NodeId> = found.iter().map(|c| c.id).collect();
        assert!(ids.iter().all(|id| [0, 2, 4].contains(id)));
    }
}
