//! Incremental graph construction.
//!
//! Items are inserted in input order; node `i` is item `i`. Each insertion
//! samples a level, descends greedily from the entry point to the node's
//! level, then connects layer by layer: beam search for candidates, the
//! configured heuristic to pick neighbors, bidirectional wiring, and a
//! degree-cap prune of any neighbor that overflowed. Pairwise distances flow
//! through a per-insertion oracle backed by the optional cache.

use crate::cache::DistanceCache;
use crate::distance::Metric;
use crate::graph::{Graph, NodeId};
use crate::node::{select_heuristic, select_simple};
use crate::params::{HnswParams, NeighborSelection};
use crate::queue::Candidate;
use crate::rng::RandomSource;
use crate::search::{greedy_descent, search_layer};

pub(crate) struct GraphBuilder<'a, T, M: Metric<T>, R: RandomSource> {
    graph: Graph,
    items: &'a [T],
    metric: &'a M,
    params: &'a HnswParams,
    rng: &'a mut R,
}

impl<'a, T, M: Metric<T>, R: RandomSource> GraphBuilder<'a, T, M, R> {
    pub(crate) fn new(
        items: &'a [T],
        metric: &'a M,
        params: &'a HnswParams,
        rng: &'a mut R,
    ) -> Self {
        Self {
            graph: Graph::new(),
            items,
            metric,
            params,
            rng,
        }
    }

    /// Insert every item in input order and return the finished graph.
    pub(crate) fn build(mut self) -> Graph {
        for id in 0..self.items.len() {
            self.insert(id as NodeId);
        }
        debug_assert!(self.graph.validate().is_ok());
        tracing::debug!(
            nodes = self.graph.len(),
            top_layer = self.graph.entry_layer(),
            "graph construction complete"
        );
        self.graph
    }

    /// Draw the insertion level: `floor(-ln(U) * lambda)` with `U` in (0,1].
    fn sample_level(&mut self) -> usize {
        let u = self.rng.next_double();
        if u <= 0.0 {
            return 0;
        }
        (-u.ln() * self.params.level_lambda).floor() as usize
    }

    fn insert(&mut self, id: NodeId) {
        let level = self.sample_level();
        let assigned = self.graph.push_node(level);
        debug_assert_eq!(assigned, id, "node ids must follow item order");

        let Some(entry) = self.graph.entry_point() else {
            self.graph.set_entry_point(id);
            tracing::trace!(id, level, "first node becomes entry point");
            return;
        };
        let entry_layer = self.graph.entry_layer();

        let items = self.items;
        let metric = self.metric;
        let mut cache: Option<DistanceCache<M::Distance>> = if self.params.cache_distances {
            Some(DistanceCache::new())
        } else {
            None
        };
        // Pairwise oracle for this insertion; dropped on every exit path.
        let mut pair = move |a: NodeId, b: NodeId| -> M::Distance {
            if let Some(cache) = cache.as_mut() {
                if let Some(d) = cache.get(a, b) {
                    return d;
                }
            }
            let d = metric.distance(&items[a as usize], &items[b as usize]);
            if let Some(cache) = cache.as_mut() {
                cache.insert(a, b, d.clone());
            }
            d
        };

        let mut seed = Candidate::new(entry, pair(entry, id));
        if entry_layer > level {
            seed = greedy_descent(&self.graph, &mut |n| pair(n, id), seed, entry_layer, level);
        }

        let mut seeds = vec![seed];
        for layer in (0..=level.min(entry_layer)).rev() {
            let found = search_layer(
                &self.graph,
                &mut |n| pair(n, id),
                &seeds,
                self.params.ef_construction,
                layer,
            );
            let chosen = self.select(layer, id, found, self.params.m, &mut pair);

            for c in &chosen {
                self.graph.connect(id, c.id, layer);
            }
            for c in &chosen {
                let cap = self.params.mmax(layer);
                if self.graph.neighbors(c.id, layer).len() > cap {
                    self.shrink(c.id, layer, cap, &mut pair);
                }
            }

            // The selected neighbors seed the beam one layer down.
            seeds = chosen;
        }

        if level > entry_layer {
            self.graph.set_entry_point(id);
            tracing::trace!(id, level, "entry point moved");
        }
    }

    /// Re-select `id`'s neighbors at `layer` down to `cap`, detaching the
    /// reverse edge of everything dropped.
    fn shrink<F>(&mut self, id: NodeId, layer: usize, cap: usize, pair: &mut F)
    where
        F: FnMut(NodeId, NodeId) -> M::Distance,
    {
        let over: Vec<Candidate<M::Distance>> = self
            .graph
            .neighbors(id, layer)
            .iter()
            .map(|&n| Candidate::new(n, pair(n, id)))
            .collect();
        let keep = self.select(layer, id, over, cap, pair);
        let keep_ids: Vec<NodeId> = keep.iter().map(|c| c.id).collect();
        self.graph.replace_neighbors(id, layer, keep_ids);
    }

    fn select<F>(
        &self,
        layer: usize,
        target: NodeId,
        candidates: Vec<Candidate<M::Distance>>,
        m: usize,
        pair: &mut F,
    ) -> Vec<Candidate<M::Distance>>
    where
        F: FnMut(NodeId, NodeId) -> M::Distance,
    {
        match self.params.selection {
            NeighborSelection::Simple => select_simple(candidates, m),
            NeighborSelection::Heuristic => select_heuristic(
                &self.graph,
                layer,
                target,
                candidates,
                m,
                self.params.extend_candidates,
                self.params.keep_pruned,
                pair,
            ),
        }
    }
}
