//! smallworld - embeddable generic HNSW approximate nearest neighbor index
//!
//! smallworld builds the layered proximity graph of Malkov & Yashunin's
//! Hierarchical Navigable Small World paper over any item type: the caller
//! supplies the distance function and the randomness, the index owns only
//! the graph topology and the item sequence it was built from.
//!
//! # Core Philosophy
//!
//! - **Generic over the space**: distances are compared, never added; any
//!   totally-ordered scalar works, no triangle inequality required
//! - **Deterministic construction**: a fixed random source and input order
//!   reproduce the graph bit for bit, tie-breaks included
//! - **Topology-only persistence**: snapshots hold ids and edges, never
//!   items or distances; restore re-binds items by position
//! - **Insert-only**: nodes are created during build and never mutated by
//!   queries, so completed graphs are safe to query concurrently
//!
//! # Example
//!
//! ```
//! use smallworld::{euclidean, HnswIndex, HnswParams, SeededRandom};
//!
//! # fn main() -> smallworld::Result<()> {
//! let items: Vec<Vec<f32>> = (0..32).map(|i| vec![i as f32, 0.0]).collect();
//!
//! let mut index = HnswIndex::new(euclidean, HnswParams::with_m(4))?;
//! index.build(items, &mut SeededRandom::new(42))?;
//!
//! let found = index.search(&vec![10.2, 0.0], 3)?;
//! assert_eq!(found[0].id, 10);
//!
//! // Topology round-trips without re-running construction.
//! let bytes = index.to_bytes()?;
//! let restored = HnswIndex::from_bytes(euclidean, index.items().to_vec(), &bytes)?;
//! assert_eq!(restored.search(&vec![10.2, 0.0], 3)?[0].id, 10);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod distance;
pub mod error;
pub mod graph;
pub mod node;
pub mod params;
pub mod rng;

mod builder;
mod cache;
mod queue;
mod search;
mod snapshot;

pub use distance::{cosine, euclidean, squared_euclidean, Metric};
pub use error::{Error, Result};
pub use graph::{Graph, NodeId};
pub use node::Node;
pub use params::{HnswParams, NeighborSelection};
pub use rng::{RandomSource, SeededRandom};

use builder::GraphBuilder;
use queue::Candidate;
use search::{greedy_descent, search_layer};

/// One k-NN result: the node id, a borrow of the matching item, and its
/// distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<'a, T, D> {
    /// Node id, equal to the item's position in the build sequence.
    pub id: NodeId,
    /// The matching item from the index's sequence.
    pub item: &'a T,
    /// Distance between the query and `item`.
    pub distance: D,
}

/// A generic HNSW index: batch build, k-NN queries, and topology
/// persistence.
///
/// Construction is single-threaded and runs to completion before queries.
/// Once built, the graph is read-only: queries take `&self` and may run
/// concurrently with each other.
#[derive(Debug)]
pub struct HnswIndex<T, M: Metric<T>> {
    metric: M,
    params: HnswParams,
    items: Vec<T>,
    graph: Option<Graph>,
}

impl<T, M: Metric<T>> HnswIndex<T, M> {
    /// Create an empty index with the given metric and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if the parameters violate their
    /// invariants.
    pub fn new(metric: M, params: HnswParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            metric,
            params,
            items: Vec::new(),
            graph: None,
        })
    }

    /// Build a fresh graph over `items`, inserted in order; node ids equal
    /// item positions. Replaces any previously built or restored graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if the parameters violate their
    /// invariants.
    pub fn build<R: RandomSource>(&mut self, items: Vec<T>, rng: &mut R) -> Result<()> {
        self.params.validate()?;
        tracing::debug!(items = items.len(), m = self.params.m, "building graph");

        let graph = GraphBuilder::new(&items, &self.metric, &self.params, rng).build();
        self.items = items;
        self.graph = Some(graph);
        Ok(())
    }

    /// Approximate k-nearest-neighbor query.
    ///
    /// Descends greedily to layer 0, beam-searches it with
    /// `ef = max(k, ef_construction)`, and returns at most `k` results
    /// ascending by distance (ties by id).
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphNotBuilt`] before a build or restore, and
    /// [`Error::EmptyGraph`] if the graph holds no items.
    pub fn search(&self, query: &T, k: usize) -> Result<Vec<Neighbor<'_, T, M::Distance>>> {
        let graph = self.graph.as_ref().ok_or(Error::GraphNotBuilt)?;
        let entry = graph.entry_point().ok_or(Error::EmptyGraph)?;

        let metric = &self.metric;
        let items = &self.items;
        let mut dist = |id: NodeId| metric.distance(query, &items[id as usize]);

        let seed = Candidate::new(entry, dist(entry));
        let seed = greedy_descent(graph, &mut dist, seed, graph.entry_layer(), 0);
        let ef = self.params.ef_construction.max(k);
        let found = search_layer(graph, &mut dist, &[seed], ef, 0);
        tracing::trace!(k, ef, found = found.len(), "query complete");

        Ok(found
            .into_iter()
            .take(k)
            .map(|c| Neighbor {
                id: c.id,
                item: &items[c.id as usize],
                distance: c.distance,
            })
            .collect())
    }

    /// Serialize the graph topology (plus the degree target `m`) to a
    /// stable, self-describing byte sequence. Items are not written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphNotBuilt`] before a build or restore.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let graph = self.graph.as_ref().ok_or(Error::GraphNotBuilt)?;
        Ok(snapshot::encode(graph, self.params.m))
    }

    /// Reconstruct an index from a snapshot, binding `items` to nodes by
    /// position. The caller must supply the same sequence, in the same
    /// order, as at build time.
    ///
    /// Only `m` is persisted; the remaining parameters re-derive their
    /// defaults and can be re-applied through [`HnswIndex::set_params`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptGraph`] if the bytes fail checksum, layout,
    /// or structural validation, and [`Error::MismatchedItems`] if the item
    /// count differs from the encoded node count.
    pub fn from_bytes(metric: M, items: Vec<T>, bytes: &[u8]) -> Result<Self> {
        let (graph, m) = snapshot::decode(bytes)?;
        if items.len() != graph.len() {
            return Err(Error::MismatchedItems {
                expected: graph.len(),
                got: items.len(),
            });
        }
        Ok(Self {
            metric,
            params: HnswParams::with_m(m),
            items,
            graph: Some(graph),
        })
    }

    /// Human-readable dump of the graph's edges. Debug aid; the format
    /// carries no stability guarantee.
    pub fn dump(&self) -> String {
        match &self.graph {
            Some(graph) => graph.to_string(),
            None => String::from("graph not built\n"),
        }
    }

    /// Current parameters. After [`HnswIndex::from_bytes`] every knob except
    /// `m` holds its default.
    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Replace the parameters, e.g. to re-supply a tuned `ef_construction`
    /// after a restore. Does not rewire an already built graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if the parameters violate their
    /// invariants.
    pub fn set_params(&mut self, params: HnswParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The indexed items, in id order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The built graph, if any.
    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(a: &(f64, f64), b: &(f64, f64)) -> f64 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    type PlaneMetric = fn(&(f64, f64), &(f64, f64)) -> f64;

    fn new_index() -> HnswIndex<(f64, f64), PlaneMetric> {
        HnswIndex::new(plane as PlaneMetric, HnswParams::with_m(4).with_ef_construction(16))
            .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_params() {
        let result = HnswIndex::new(plane as PlaneMetric, HnswParams::with_m(1));
        assert!(matches!(result, Err(Error::InvalidParameters { .. })));
    }

    #[test]
    fn test_search_before_build_fails() {
        let index = new_index();
        assert!(matches!(index.search(&(0.0, 0.0), 1), Err(Error::GraphNotBuilt)));
    }

    #[test]
    fn test_serialize_before_build_fails() {
        let index = new_index();
        assert!(matches!(index.to_bytes(), Err(Error::GraphNotBuilt)));
    }

    #[test]
    fn test_set_params_validates() {
        let mut index = new_index();
        assert!(index.set_params(HnswParams::with_m(0)).is_err());
        assert!(index.set_params(HnswParams::with_m(8)).is_ok());
        assert_eq!(index.params().m, 8);
    }

    #[test]
    fn test_dump_before_build() {
        let index = new_index();
        assert_eq!(index.dump(), "graph not built\n");
    }

    #[test]
    fn test_build_then_introspect() {
        let mut index = new_index();
        index
            .build(vec![(0.0, 0.0), (1.0, 0.0)], &mut SeededRandom::new(42))
            .unwrap();

        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.items().len(), 2);
        assert!(index.graph().is_some());
        assert!(index.dump().contains("entry point"));
    }
}
